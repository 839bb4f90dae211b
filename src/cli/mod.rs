use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::app::{self, AppState};
use crate::auth::{IdentityVerifier, JwtIdentity};
use crate::config::{self, AppConfig};
use crate::database::{DatabaseManager, EntityStore, MemoryStore, PgStore};
use crate::services::TagService;

#[derive(Parser)]
#[command(name = "review-board")]
#[command(about = "Community code-review board API server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,

        #[arg(long, help = "Use the in-process store instead of Postgres")]
        memory: bool,
    },

    #[command(about = "Create missing tables and seed the tag catalog")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::config();
    info!("Starting review-board in {:?} mode", config.environment);

    match cli.command {
        Commands::Serve { port, memory } => serve(config, port, memory).await,
        Commands::Migrate => migrate(config).await,
    }
}

async fn serve(config: &AppConfig, port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let identity: Arc<dyn IdentityVerifier> =
        Arc::new(JwtIdentity::from_config(&config.security).context("JWT_SECRET and JWT_EXPIRY_HOURS must be valid")?);

    let store: Arc<dyn EntityStore> = if memory {
        if crate::is_production!() {
            tracing::warn!("In-memory store selected in production");
        }
        info!("Using in-memory store; data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        DatabaseManager::apply_schema(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    TagService::new(store.clone()).seed_defaults().await?;

    let app = app::router(AppState::new(store, identity), &config.security);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn migrate(config: &AppConfig) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config.database).await?;
    DatabaseManager::apply_schema(&pool).await?;
    let seeded = TagService::new(Arc::new(PgStore::new(pool))).seed_defaults().await?;
    info!("Migration complete ({} tags seeded)", seeded);
    Ok(())
}
