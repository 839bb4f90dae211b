use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::MemberSummary;
use crate::middleware::{ApiResponse, ApiResult, AuthMember, ValidJson, ValidPath};
use crate::services::LoginResult;
use crate::types::MemberId;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub nickname: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NicknameRequest {
    pub nickname: String,
}

/// POST /api/v1/members - Sign up
pub async fn sign_up(State(state): State<AppState>, ValidJson(body): ValidJson<CredentialsRequest>) -> ApiResult<MemberSummary> {
    let member = state.services.members.sign_up(&body.nickname, &body.password).await?;
    Ok(ApiResponse::created(member.summary()))
}

/// POST /api/v1/members/login - Exchange nickname and password for a token
pub async fn login(State(state): State<AppState>, ValidJson(body): ValidJson<CredentialsRequest>) -> ApiResult<LoginResult> {
    let result = state.services.members.login(&body.nickname, &body.password).await?;
    Ok(ApiResponse::success(result))
}

/// GET /api/v1/members/:id - Public profile
pub async fn find_by_id(
    State(state): State<AppState>,
    ValidPath(member_id): ValidPath<MemberId>,
) -> ApiResult<MemberSummary> {
    let member = state.services.members.get_member(member_id).await?;
    Ok(ApiResponse::success(member.summary()))
}

/// GET /api/v1/members/me
pub async fn me(State(state): State<AppState>, AuthMember(member_id): AuthMember) -> ApiResult<MemberSummary> {
    let member = state.services.members.get_member(member_id).await?;
    Ok(ApiResponse::success(member.summary()))
}

/// PATCH /api/v1/members/me - Change nickname
pub async fn update_me(
    State(state): State<AppState>,
    AuthMember(member_id): AuthMember,
    ValidJson(body): ValidJson<NicknameRequest>,
) -> ApiResult<MemberSummary> {
    let member = state.services.members.update_nickname(member_id, &body.nickname).await?;
    Ok(ApiResponse::success(member.summary()))
}

/// DELETE /api/v1/members/me - Soft-delete the account
pub async fn delete_me(State(state): State<AppState>, AuthMember(member_id): AuthMember) -> ApiResult<()> {
    state.services.members.delete_member(member_id).await?;
    Ok(ApiResponse::no_content())
}
