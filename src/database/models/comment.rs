use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::member::MemberSummary;
use crate::error::CoreError;
use crate::types::{CommentId, MemberId, PostId};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub member_id: MemberId,
    pub post_id: PostId,
    pub content: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// A comment counts as modified once its update time moves past creation
    pub fn is_modified(&self) -> bool {
        self.updated_at != self.created_at
    }

    pub fn validate_content(raw: &str) -> Result<String, CoreError> {
        if raw.trim().is_empty() {
            return Err(CoreError::validation("content", "Comment content is required"));
        }
        Ok(raw.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentDetail {
    pub id: CommentId,
    pub post_id: PostId,
    pub content: String,
    pub member: MemberSummary,
    pub modified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentDetail {
    pub fn new(comment: Comment, member: MemberSummary) -> Self {
        Self {
            modified: comment.is_modified(),
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            member,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentMutation {
    Edit(String),
    Delete,
}
