use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{PostDetail, PostStatus, PostSummary};
use crate::error::ApiError;
use crate::filter::{Page, PageRequest};
use crate::middleware::{ApiResponse, ApiResult, AuthMember, ValidJson, ValidPath, ValidQuery};
use crate::types::{PostId, TagId};

#[derive(Debug, Default, Deserialize)]
pub struct PostListQuery {
    pub status: Option<PostStatus>,
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: PostStatus,
}

fn page_request(page: Option<i64>, size: Option<i64>) -> Result<PageRequest, ApiError> {
    PageRequest::from_config(page, size).map_err(|e| ApiError::from(crate::error::CoreError::from(e)))
}

/// GET /api/v1/posts - Filtered listing, most recently updated first
pub async fn list(State(state): State<AppState>, ValidQuery(query): ValidQuery<PostListQuery>) -> ApiResult<Page<PostSummary>> {
    let page = page_request(query.page, query.size)?;
    let posts = state
        .services
        .posts
        .list_posts(query.status, query.keyword.as_deref(), page)
        .await?;
    Ok(ApiResponse::success(posts))
}

/// GET /api/v1/posts/me - The requester's own posts
pub async fn list_mine(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> ApiResult<Page<PostSummary>> {
    let page = page_request(query.page, query.size)?;
    let posts = state.services.posts.list_my_posts(member_id, page).await?;
    Ok(ApiResponse::success(posts))
}

/// GET /api/v1/posts/:id
pub async fn get(State(state): State<AppState>, ValidPath(post_id): ValidPath<PostId>) -> ApiResult<PostDetail> {
    Ok(ApiResponse::success(state.services.posts.get_post(post_id).await?))
}

/// POST /api/v1/posts
pub async fn create(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidJson(body): ValidJson<PostRequest>,
) -> ApiResult<PostDetail> {
    let post = state
        .services
        .posts
        .create_post(member_id, &body.title, &body.content, &body.tag_ids)
        .await?;
    Ok(ApiResponse::created(post))
}

/// PUT /api/v1/posts/:id - Replace title, content and tags
pub async fn update(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(post_id): ValidPath<PostId>,
    ValidJson(body): ValidJson<PostRequest>,
) -> ApiResult<PostDetail> {
    let post = state
        .services
        .posts
        .update_post(member_id, post_id, &body.title, &body.content, &body.tag_ids)
        .await?;
    Ok(ApiResponse::success(post))
}

/// PATCH /api/v1/posts/:id/status
pub async fn update_status(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(post_id): ValidPath<PostId>,
    ValidJson(body): ValidJson<StatusRequest>,
) -> ApiResult<PostDetail> {
    let post = state.services.posts.update_status(member_id, post_id, body.status).await?;
    Ok(ApiResponse::success(post))
}

/// DELETE /api/v1/posts/:id
pub async fn delete(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidPath(post_id): ValidPath<PostId>,
) -> ApiResult<()> {
    state.services.posts.delete_post(member_id, post_id).await?;
    Ok(ApiResponse::no_content())
}
