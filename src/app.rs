use axum::{
    http::HeaderValue,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::IdentityVerifier;
use crate::config::SecurityConfig;
use crate::database::EntityStore;
use crate::handlers::{self, comments, members, posts, tags};
use crate::services::Services;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub identity: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn EntityStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>, identity: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            services: Services::new(store.clone(), identity.clone()),
            identity,
            store,
        }
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(member_routes())
        .merge(post_routes())
        .merge(comment_routes())
        .route("/api/v1/tags", get(tags::list))
        .layer(cors_layer(security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/members", post(members::sign_up))
        .route("/api/v1/members/login", post(members::login))
        .route(
            "/api/v1/members/me",
            get(members::me).patch(members::update_me).delete(members::delete_me),
        )
        .route("/api/v1/members/:id", get(members::find_by_id))
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/posts", get(posts::list).post(posts::create))
        .route("/api/v1/posts/me", get(posts::list_mine))
        .route(
            "/api/v1/posts/:id",
            get(posts::get).put(posts::update).delete(posts::delete),
        )
        .route("/api/v1/posts/:id/status", patch(posts::update_status))
}

fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/posts/:id/comments",
            get(comments::list).post(comments::create),
        )
        .route(
            "/api/v1/comments/:id",
            put(comments::update).delete(comments::delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
