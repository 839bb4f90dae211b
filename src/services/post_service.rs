use std::sync::Arc;
use tracing::info;

use crate::database::models::{PostDetail, PostDraft, PostMutation, PostStatus, PostSummary};
use crate::database::EntityStore;
use crate::error::CoreError;
use crate::filter::{Page, PageRequest, PostFilter};
use crate::types::{MemberId, PostId, TagId};

/// Post lifecycle and listings. Ownership is enforced inside the store's
/// mutation transaction, never by a separate read here.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn EntityStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create_post(
        &self,
        member_id: MemberId,
        title: &str,
        content: &str,
        tag_ids: &[TagId],
    ) -> Result<PostDetail, CoreError> {
        let draft = PostDraft::new(title, content, tag_ids)?;
        let post = self.store.create_post(member_id, &draft).await?;
        info!("Member {} created post {} with {} tag(s)", member_id, post.id, post.tags.len());
        Ok(post)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<PostDetail, CoreError> {
        self.store.find_post(post_id).await
    }

    /// Replaces title, content and the whole tag set
    pub async fn update_post(
        &self,
        member_id: MemberId,
        post_id: PostId,
        title: &str,
        content: &str,
        tag_ids: &[TagId],
    ) -> Result<PostDetail, CoreError> {
        let draft = PostDraft::new(title, content, tag_ids)?;
        self.mutate(member_id, post_id, PostMutation::Edit(draft)).await
    }

    /// Either direction is allowed
    pub async fn update_status(
        &self,
        member_id: MemberId,
        post_id: PostId,
        status: PostStatus,
    ) -> Result<PostDetail, CoreError> {
        self.mutate(member_id, post_id, PostMutation::ChangeStatus(status)).await
    }

    /// Comments keep their own flags; they disappear with the post's visibility
    pub async fn delete_post(&self, member_id: MemberId, post_id: PostId) -> Result<(), CoreError> {
        self.mutate(member_id, post_id, PostMutation::Delete).await?;
        Ok(())
    }

    pub async fn list_posts(
        &self,
        status: Option<PostStatus>,
        keyword: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<PostSummary>, CoreError> {
        let filter = PostFilter::new().status(status).keyword(keyword);
        self.store.list_posts(&filter, page).await
    }

    pub async fn list_my_posts(&self, member_id: MemberId, page: PageRequest) -> Result<Page<PostSummary>, CoreError> {
        let filter = PostFilter::new().owner(member_id);
        self.store.list_posts(&filter, page).await
    }

    async fn mutate(
        &self,
        member_id: MemberId,
        post_id: PostId,
        mutation: PostMutation,
    ) -> Result<PostDetail, CoreError> {
        let post = self.store.mutate_post(member_id, post_id, &mutation).await?;
        info!("Member {} applied {} to post {} (status {})", member_id, mutation.name(), post.id, post.status.as_str());
        Ok(post)
    }
}
