use std::collections::{HashMap, HashSet};

use crate::database::models::Tag;
use crate::error::CoreError;
use crate::types::{EntityKind, TagId};

/// Drops repeated ids, keeping the first occurrence of each
pub fn dedupe(tag_ids: &[TagId]) -> Vec<TagId> {
    let mut seen = HashSet::with_capacity(tag_ids.len());
    tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Orders `found` by `requested`. Any requested id without a catalog entry
/// fails the whole resolution.
pub fn resolve(requested: &[TagId], found: Vec<Tag>) -> Result<Vec<Tag>, CoreError> {
    let mut by_id: HashMap<TagId, Tag> = found.into_iter().map(|t| (t.id, t)).collect();
    let mut resolved = Vec::with_capacity(requested.len());
    for id in dedupe(requested) {
        match by_id.remove(&id) {
            Some(tag) => resolved.push(tag),
            None => {
                tracing::warn!("Unknown tag id {}", id);
                return Err(CoreError::NotFound(EntityKind::Tag));
            }
        }
    }
    Ok(resolved)
}
