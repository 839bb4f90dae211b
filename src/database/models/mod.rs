pub mod comment;
pub mod member;
pub mod post;
pub mod tag;

pub use comment::{Comment, CommentDetail, CommentMutation};
pub use member::{Member, MemberSummary};
pub use post::{Post, PostDetail, PostDraft, PostMutation, PostRow, PostStatus, PostSummary};
pub use tag::{Tag, TagCategory, TagRow, DEFAULT_TAGS};
