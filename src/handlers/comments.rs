use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::CommentDetail;
use crate::middleware::{ApiResponse, ApiResult, AuthMember, ValidJson, ValidPath};
use crate::types::{CommentId, PostId};

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// GET /api/v1/posts/:id/comments - Oldest first
pub async fn list(State(state): State<AppState>, ValidPath(post_id): ValidPath<PostId>) -> ApiResult<Vec<CommentDetail>> {
    Ok(ApiResponse::success(state.services.comments.list_comments(post_id).await?))
}

/// POST /api/v1/posts/:id/comments
pub async fn create(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(post_id): ValidPath<PostId>,
    ValidJson(body): ValidJson<CommentRequest>,
) -> ApiResult<CommentDetail> {
    let comment = state
        .services
        .comments
        .create_comment(member_id, post_id, &body.content)
        .await?;
    Ok(ApiResponse::created(comment))
}

/// PUT /api/v1/comments/:id
pub async fn update(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(comment_id): ValidPath<CommentId>,
    ValidJson(body): ValidJson<CommentRequest>,
) -> ApiResult<CommentDetail> {
    let comment = state
        .services
        .comments
        .update_comment(member_id, comment_id, &body.content)
        .await?;
    Ok(ApiResponse::success(comment))
}

/// DELETE /api/v1/comments/:id
pub async fn delete(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(comment_id): ValidPath<CommentId>,
) -> ApiResult<()> {
    state.services.comments.delete_comment(member_id, comment_id).await?;
    Ok(ApiResponse::no_content())
}
