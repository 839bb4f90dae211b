use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::CoreError;
use crate::types::MemberId;

pub const NICKNAME_MIN_CHARS: usize = 2;
pub const NICKNAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 2;
pub const PASSWORD_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: MemberId,
    pub nickname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_image: Option<String>,
    #[serde(skip_serializing)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a member, embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub id: MemberId,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Member> for MemberSummary {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            nickname: member.nickname.clone(),
            profile_image: member.profile_image.clone(),
            created_at: member.created_at,
        }
    }
}

impl Member {
    pub fn summary(&self) -> MemberSummary {
        MemberSummary::from(self)
    }

    /// Trims and checks a requested nickname, returning the stored form
    pub fn validate_nickname(raw: &str) -> Result<String, CoreError> {
        let nickname = raw.trim();
        if nickname.is_empty() {
            return Err(CoreError::validation("nickname", "Nickname is required"));
        }
        let len = nickname.chars().count();
        if !(NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&len) {
            return Err(CoreError::validation(
                "nickname",
                format!("Nickname must be {}-{} characters", NICKNAME_MIN_CHARS, NICKNAME_MAX_CHARS),
            ));
        }
        Ok(nickname.to_string())
    }

    pub fn validate_password(raw: &str) -> Result<(), CoreError> {
        if raw.trim().is_empty() {
            return Err(CoreError::validation("password", "Password is required"));
        }
        let len = raw.chars().count();
        if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&len) {
            return Err(CoreError::validation(
                "password",
                format!("Password must be {}-{} characters", PASSWORD_MIN_CHARS, PASSWORD_MAX_CHARS),
            ));
        }
        Ok(())
    }
}
