use std::sync::Arc;
use tracing::info;

use crate::database::models::{Comment, CommentDetail, CommentMutation};
use crate::database::EntityStore;
use crate::error::CoreError;
use crate::types::{CommentId, MemberId, PostId};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn EntityStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create_comment(
        &self,
        member_id: MemberId,
        post_id: PostId,
        content: &str,
    ) -> Result<CommentDetail, CoreError> {
        let content = Comment::validate_content(content)?;
        let comment = self.store.create_comment(member_id, post_id, &content).await?;
        info!("Member {} commented {} on post {}", member_id, comment.id, post_id);
        Ok(comment)
    }

    /// Oldest first, each with its author
    pub async fn list_comments(&self, post_id: PostId) -> Result<Vec<CommentDetail>, CoreError> {
        self.store.list_comments(post_id).await
    }

    pub async fn update_comment(
        &self,
        member_id: MemberId,
        comment_id: CommentId,
        content: &str,
    ) -> Result<CommentDetail, CoreError> {
        let content = Comment::validate_content(content)?;
        let comment = self
            .store
            .mutate_comment(member_id, comment_id, &CommentMutation::Edit(content))
            .await?;
        info!("Member {} edited comment {}", member_id, comment_id);
        Ok(comment)
    }

    pub async fn delete_comment(&self, member_id: MemberId, comment_id: CommentId) -> Result<(), CoreError> {
        self.store
            .mutate_comment(member_id, comment_id, &CommentMutation::Delete)
            .await?;
        info!("Member {} deleted comment {}", member_id, comment_id);
        Ok(())
    }
}
