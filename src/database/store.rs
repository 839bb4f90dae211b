use async_trait::async_trait;

use super::models::{
    CommentDetail, CommentMutation, Member, PostDetail, PostDraft, PostMutation, PostSummary, Tag,
    TagCategory,
};
use crate::error::CoreError;
use crate::filter::{Page, PageRequest, PostFilter};
use crate::types::{CommentId, MemberId, PostId};

/// Storage port for the review board.
///
/// Every method observes the soft-delete visibility rules: a member is
/// visible when not deleted, a post when neither it nor its owner is deleted,
/// and a comment when neither it, its owner, nor its post is hidden.
/// Mutating methods commit all of their writes or none of them.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Reports whether the backing storage is reachable
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }

    // Members

    /// Fails with `DuplicateNickname` when a visible member holds the nickname
    async fn insert_member(&self, nickname: &str, password_hash: &str) -> Result<Member, CoreError>;

    async fn find_member(&self, id: MemberId) -> Result<Member, CoreError>;

    async fn find_member_by_nickname(&self, nickname: &str) -> Result<Option<Member>, CoreError>;

    async fn rename_member(&self, id: MemberId, nickname: &str) -> Result<Member, CoreError>;

    async fn soft_delete_member(&self, id: MemberId) -> Result<(), CoreError>;

    // Tags

    async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<Tag>, CoreError>;

    /// Inserts the catalog only when no tag exists yet; returns how many were added
    async fn seed_tags(&self, catalog: &[(&str, TagCategory)]) -> Result<usize, CoreError>;

    // Posts

    /// Owner must be visible and every tag id must exist
    async fn create_post(&self, owner: MemberId, draft: &PostDraft) -> Result<PostDetail, CoreError>;

    async fn find_post(&self, id: PostId) -> Result<PostDetail, CoreError>;

    /// Lookup, ownership check and writes in one transaction. The returned
    /// detail is read inside that same transaction.
    async fn mutate_post(
        &self,
        requester: MemberId,
        id: PostId,
        mutation: &PostMutation,
    ) -> Result<PostDetail, CoreError>;

    async fn list_posts(&self, filter: &PostFilter, page: PageRequest) -> Result<Page<PostSummary>, CoreError>;

    // Comments

    async fn create_comment(
        &self,
        owner: MemberId,
        post_id: PostId,
        content: &str,
    ) -> Result<CommentDetail, CoreError>;

    async fn find_comment(&self, id: CommentId) -> Result<CommentDetail, CoreError>;

    async fn mutate_comment(
        &self,
        requester: MemberId,
        id: CommentId,
        mutation: &CommentMutation,
    ) -> Result<CommentDetail, CoreError>;

    /// Visible comments of a visible post, oldest first
    async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentDetail>, CoreError>;
}
