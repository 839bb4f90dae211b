use std::sync::Arc;
use tracing::info;

use crate::database::models::{Tag, TagCategory, DEFAULT_TAGS};
use crate::database::EntityStore;
use crate::error::CoreError;

#[derive(Clone)]
pub struct TagService {
    store: Arc<dyn EntityStore>,
}

impl TagService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn list_tags(&self, category: Option<TagCategory>) -> Result<Vec<Tag>, CoreError> {
        self.store.list_tags(category).await
    }

    /// Seeds the default catalog into an empty tag table
    pub async fn seed_defaults(&self) -> Result<usize, CoreError> {
        let inserted = self.store.seed_tags(DEFAULT_TAGS).await?;
        if inserted > 0 {
            info!("Seeded {} default tags", inserted);
        }
        Ok(inserted)
    }
}
