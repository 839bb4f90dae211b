use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Tag, TagCategory};
use crate::middleware::{ApiResponse, ApiResult, ValidQuery};

#[derive(Debug, Default, Deserialize)]
pub struct TagQuery {
    pub category: Option<TagCategory>,
}

/// GET /api/v1/tags - Catalog, optionally one category
pub async fn list(State(state): State<AppState>, ValidQuery(query): ValidQuery<TagQuery>) -> ApiResult<Vec<Tag>> {
    Ok(ApiResponse::success(state.services.tags.list_tags(query.category).await?))
}
