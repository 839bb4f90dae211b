use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{self, IdentityVerifier};
use crate::database::models::{Member, MemberSummary};
use crate::database::EntityStore;
use crate::error::CoreError;
use crate::types::MemberId;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub access_token: String,
    pub member: MemberSummary,
}

#[derive(Clone)]
pub struct MemberService {
    store: Arc<dyn EntityStore>,
    identity: Arc<dyn IdentityVerifier>,
}

impl MemberService {
    pub fn new(store: Arc<dyn EntityStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self { store, identity }
    }

    pub async fn sign_up(&self, nickname: &str, password: &str) -> Result<Member, CoreError> {
        let nickname = Member::validate_nickname(nickname)?;
        Member::validate_password(password)?;

        if self.store.find_member_by_nickname(&nickname).await?.is_some() {
            return Err(CoreError::DuplicateNickname(nickname));
        }

        let password_hash = auth::hash_password(password).map_err(|e| CoreError::Internal(e.to_string()))?;
        // The store re-checks uniqueness atomically; the lookup above only
        // avoids hashing for an obvious conflict.
        let member = self.store.insert_member(&nickname, &password_hash).await?;
        info!("Member {} signed up as '{}'", member.id, member.nickname);
        Ok(member)
    }

    /// Unknown nickname and wrong password fail the same way
    pub async fn login(&self, nickname: &str, password: &str) -> Result<LoginResult, CoreError> {
        let member = self
            .store
            .find_member_by_nickname(nickname.trim())
            .await?
            .ok_or(CoreError::InvalidCredentials)?;

        if !auth::verify_password(password, &member.password_hash) {
            tracing::warn!("Failed login for member {}", member.id);
            return Err(CoreError::InvalidCredentials);
        }

        let access_token = self
            .identity
            .issue(member.id)
            .map_err(|e| CoreError::Internal(e.to_string()))?;
        info!("Member {} logged in", member.id);

        Ok(LoginResult {
            access_token,
            member: member.summary(),
        })
    }

    pub async fn get_member(&self, member_id: MemberId) -> Result<Member, CoreError> {
        self.store.find_member(member_id).await
    }

    /// Submitting the current nickname again is accepted without change
    pub async fn update_nickname(&self, member_id: MemberId, nickname: &str) -> Result<Member, CoreError> {
        let nickname = Member::validate_nickname(nickname)?;
        let member = self.store.rename_member(member_id, &nickname).await?;
        info!("Member {} is now '{}'", member.id, member.nickname);
        Ok(member)
    }

    pub async fn delete_member(&self, member_id: MemberId) -> Result<(), CoreError> {
        self.store.soft_delete_member(member_id).await?;
        info!("Member {} soft-deleted", member_id);
        Ok(())
    }
}
