pub mod comment_service;
pub mod member_service;
pub mod post_service;
pub mod tag_service;

use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::database::EntityStore;

pub use comment_service::CommentService;
pub use member_service::{LoginResult, MemberService};
pub use post_service::PostService;
pub use tag_service::TagService;

/// All services sharing one store
#[derive(Clone)]
pub struct Services {
    pub members: MemberService,
    pub posts: PostService,
    pub comments: CommentService,
    pub tags: TagService,
}

impl Services {
    pub fn new(store: Arc<dyn EntityStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            members: MemberService::new(store.clone(), identity),
            posts: PostService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            tags: TagService::new(store),
        }
    }
}
