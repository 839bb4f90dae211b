use crate::error::CoreError;
use crate::types::{EntityKind, MemberId};

pub fn is_owner(owner_id: MemberId, requester_id: MemberId) -> bool {
    owner_id == requester_id
}

/// Fails with `AccessDenied` unless the requester owns the entity. Stores call
/// this after locking the row and before issuing any write.
pub fn authorize(kind: EntityKind, owner_id: MemberId, requester_id: MemberId) -> Result<(), CoreError> {
    if is_owner(owner_id, requester_id) {
        Ok(())
    } else {
        tracing::warn!("Member {} denied mutation of {} owned by member {}", requester_id, kind, owner_id);
        Err(CoreError::AccessDenied(kind))
    }
}
