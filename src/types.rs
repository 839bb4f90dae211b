//! Shared types used across the codebase

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub type MemberId = i64;
pub type PostId = i64;
pub type CommentId = i64;
pub type TagId = i64;

/// Entity families the core reports on in NotFound / AccessDenied errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Member,
    Post,
    Comment,
    Tag,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Member => "member",
            EntityKind::Post => "post",
            EntityKind::Comment => "comment",
            EntityKind::Tag => "tag",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp for a write that follows `previous`.
///
/// Always strictly later than `previous` at microsecond resolution (what
/// Postgres keeps), so `updated_at != created_at` holds after any update even
/// when the clock has not visibly advanced.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    let floor = previous + Duration::microseconds(1);
    if now >= floor {
        now
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_timestamp_is_strictly_later() {
        let future = Utc::now() + Duration::hours(1);
        let next = next_timestamp(future);
        assert!(next > future);
        assert_eq!(next - future, Duration::microseconds(1));

        let past = Utc::now() - Duration::hours(1);
        assert!(next_timestamp(past) > past + Duration::minutes(59));
    }
}
