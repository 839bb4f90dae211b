use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use super::member::MemberSummary;
use super::tag::Tag;
use crate::error::CoreError;
use crate::types::{MemberId, PostId, TagId};

pub const TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    #[default]
    Unsolved,
    Solved,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Unsolved => "UNSOLVED",
            PostStatus::Solved => "SOLVED",
        }
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNSOLVED" => Ok(PostStatus::Unsolved),
            "SOLVED" => Ok(PostStatus::Solved),
            other => Err(format!("unknown post status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: PostId,
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `posts` row; status is stored as text
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: PostId,
    pub member_id: MemberId,
    pub title: String,
    pub content: String,
    pub status: String,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            member_id: row.member_id,
            title: row.title,
            content: row.content,
            status: row.status.parse()?,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A post with its owner and tags resolved
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub member: MemberSummary,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDetail {
    pub fn new(post: Post, member: MemberSummary, tags: Vec<Tag>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            status: post.status,
            member,
            tags,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Listing row
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: PostId,
    pub title: String,
    pub status: PostStatus,
    pub member: MemberSummary,
    pub comment_count: i64,
    pub updated_at: DateTime<Utc>,
}

/// Validated title, content and tag ids for a create or full update
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tag_ids: Vec<TagId>,
}

impl PostDraft {
    pub fn new(title: &str, content: &str, tag_ids: &[TagId]) -> Result<Self, CoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CoreError::validation("title", "Title is required"));
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(CoreError::validation(
                "title",
                format!("Title must be at most {} characters", TITLE_MAX_CHARS),
            ));
        }
        if content.trim().is_empty() {
            return Err(CoreError::validation("content", "Content is required"));
        }
        if tag_ids.is_empty() {
            return Err(CoreError::validation("tagIds", "At least one tag is required"));
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            tag_ids: crate::tagging::dedupe(tag_ids),
        })
    }
}

/// Owner-only changes applied by the store after the ownership guard passes
#[derive(Debug, Clone, PartialEq)]
pub enum PostMutation {
    Edit(PostDraft),
    ChangeStatus(PostStatus),
    Delete,
}

impl PostMutation {
    pub fn name(&self) -> &'static str {
        match self {
            PostMutation::Edit(_) => "edit",
            PostMutation::ChangeStatus(_) => "change_status",
            PostMutation::Delete => "delete",
        }
    }
}
