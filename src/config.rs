use anyhow::{bail, Context, Result};

/// Which `DocumentStore` backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,

    // Admin
    pub admin_api_key: String,

    // Server
    pub port: u16,

    // Media
    pub upload_dir: String,
    pub upload_url_prefix: String,
    pub max_upload_bytes: usize,
    pub image_max_width: u32,
    pub image_quality: u8,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_backend = match std::env::var("STORE")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => bail!("Unknown STORE '{}'. Expected 'postgres' or 'memory'", other),
        };

        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL not set");
        }

        let admin_api_key = std::env::var("ADMIN_API_KEY").context("ADMIN_API_KEY not set")?;
        if admin_api_key.trim().is_empty() {
            bail!("ADMIN_API_KEY must not be empty");
        }

        Ok(Self {
            store_backend,
            database_url,
            admin_api_key,

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".to_string()),
            upload_url_prefix: std::env::var("UPLOAD_URL_PREFIX")
                .unwrap_or_else(|_| "/uploads".to_string()),
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5 * 1024 * 1024),
            image_max_width: std::env::var("IMAGE_MAX_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(800),
            image_quality: std::env::var("IMAGE_QUALITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(70),
        })
    }
}
