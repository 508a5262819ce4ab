use anyhow::{Context, Result};
use portfolio_cms::config::{Config, StoreBackend};
use portfolio_cms::db::{DocumentStore, MemoryStore, PgStore};
use portfolio_cms::web::{self, AppState};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portfolio_cms=info".parse()?),
        )
        .init();

    info!("Starting portfolio content service");

    // Load configuration from environment
    let config = Config::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL not set")?;
            info!("Connecting to PostgreSQL");
            Arc::new(
                PgStore::connect(url)
                    .await
                    .context("Failed to connect to database")?,
            )
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; content is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, &config);
    web::serve(state, config.port).await
}
