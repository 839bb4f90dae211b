#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use tower::ServiceExt;

use review_board::app::{self, AppState};
use review_board::auth::{IdentityVerifier, JwtIdentity};
use review_board::config::SecurityConfig;
use review_board::database::models::{Member, PostDetail};
use review_board::database::{DatabaseManager, EntityStore, MemoryStore, PgStore};
use review_board::services::Services;
use review_board::types::TagId;

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub services: Services,
    pub identity: Arc<JwtIdentity>,
    pub router: Router,
}

/// Fresh in-memory store with the default tag catalog
pub async fn setup() -> Result<TestApp> {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(JwtIdentity::new(TEST_SECRET, 1)?);
    let dyn_store: Arc<dyn EntityStore> = store.clone();
    let dyn_identity: Arc<dyn IdentityVerifier> = identity.clone();

    let state = AppState::new(dyn_store, dyn_identity);
    state.services.tags.seed_defaults().await?;

    let security = SecurityConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_hours: 1,
        cors_origins: vec!["http://localhost:3000".to_string()],
    };

    Ok(TestApp {
        store,
        services: state.services.clone(),
        identity,
        router: app::router(state, &security),
    })
}

impl TestApp {
    pub async fn member(&self, nickname: &str) -> Result<Member> {
        Ok(self.services.members.sign_up(nickname, "pw1234").await?)
    }

    pub async fn tag(&self, name: &str) -> Result<TagId> {
        let tags = self.services.tags.list_tags(None).await?;
        tags.iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .with_context(|| format!("tag {} not seeded", name))
    }

    pub async fn post(&self, owner: &Member, title: &str, content: &str, tags: &[&str]) -> Result<PostDetail> {
        let mut ids = Vec::new();
        for name in tags {
            ids.push(self.tag(name).await?);
        }
        Ok(self.services.posts.create_post(owner.id, title, content, &ids).await?)
    }

    pub fn token(&self, member: &Member) -> Result<String> {
        Ok(self.identity.issue(member.id)?)
    }

    /// Sends one request through the router and decodes the JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }
}

/// Services over a `PgStore` confined to a throwaway Postgres schema. Only
/// available when `DATABASE_URL` is set; each fixture gets its own schema so
/// suites can run in parallel against one database.
pub struct PgApp {
    pub pool: PgPool,
    pub store: Arc<PgStore>,
    pub services: Services,
    schema: String,
}

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

impl PgApp {
    /// `Ok(None)` when no database is configured
    pub async fn connect() -> Result<Option<PgApp>> {
        let _ = dotenvy::dotenv();
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => {
                eprintln!("DATABASE_URL not set; skipping Postgres store test");
                return Ok(None);
            }
        };

        let schema = format!(
            "rb_test_{}_{}",
            std::process::id(),
            SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .context("failed to connect to DATABASE_URL")?;

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema))
            .execute(&pool)
            .await?;
        sqlx::query(&format!("CREATE SCHEMA {}", schema)).execute(&pool).await?;
        DatabaseManager::apply_schema(&pool).await?;

        let store = Arc::new(PgStore::new(pool.clone()));
        let identity: Arc<dyn IdentityVerifier> = Arc::new(JwtIdentity::new(TEST_SECRET, 1)?);
        let dyn_store: Arc<dyn EntityStore> = store.clone();
        let services = Services::new(dyn_store, identity);

        Ok(Some(PgApp {
            pool,
            store,
            services,
            schema,
        }))
    }

    pub async fn seeded() -> Result<Option<PgApp>> {
        let app = match Self::connect().await? {
            Some(app) => app,
            None => return Ok(None),
        };
        app.services.tags.seed_defaults().await?;
        Ok(Some(app))
    }

    pub async fn member(&self, nickname: &str) -> Result<Member> {
        Ok(self.services.members.sign_up(nickname, "pw1234").await?)
    }

    pub async fn tag(&self, name: &str) -> Result<TagId> {
        let tags = self.services.tags.list_tags(None).await?;
        tags.iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .with_context(|| format!("tag {} not seeded", name))
    }

    pub async fn post(&self, owner: &Member, title: &str, content: &str, tags: &[&str]) -> Result<PostDetail> {
        let mut ids = Vec::new();
        for name in tags {
            ids.push(self.tag(name).await?);
        }
        Ok(self.services.posts.create_post(owner.id, title, content, &ids).await?)
    }

    pub async fn teardown(self) -> Result<()> {
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}
