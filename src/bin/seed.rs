//! Load previously exported content into the database.
//!
//! Usage:
//!   cargo run --bin seed -- bundle.json
//!   cargo run --bin seed -- projects.json blogs.json certificates.json
//!
//! A bundle is `{ "projects": [...], "blogs": [...], "certificates": [...] }`.
//! Per-collection files are the downloads from `/admin/export/{collection}`;
//! the collection is taken from the file name.

use anyhow::{bail, Context, Result};
use portfolio_cms::db::PgStore;
use portfolio_cms::export::{import_bundle, parse_export, ImportBundle};
use portfolio_cms::models::CollectionKind;
use std::fs;
use std::path::Path;
use tracing::info;

fn load(paths: &[String]) -> Result<ImportBundle> {
    let mut bundle = ImportBundle::default();

    for path in paths {
        let body = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
        let stem = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        match CollectionKind::from_name(stem) {
            Ok(kind) => {
                let entries = parse_export(&body).with_context(|| format!("Invalid export {}", path))?;
                info!("Read {} {} from {}", entries.len(), kind, path);
                match kind {
                    CollectionKind::Projects => bundle.projects.extend(entries),
                    CollectionKind::Blogs => bundle.blogs.extend(entries),
                    CollectionKind::Certificates => bundle.certificates.extend(entries),
                }
            }
            Err(_) => {
                let parsed: ImportBundle = serde_json::from_str(&body)
                    .with_context(|| format!("{} is neither a collection export nor a bundle", path))?;
                info!("Read bundle of {} entries from {}", parsed.len(), path);
                bundle.projects.extend(parsed.projects);
                bundle.blogs.extend(parsed.blogs);
                bundle.certificates.extend(parsed.certificates);
            }
        }
    }

    Ok(bundle)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seed=info".parse()?)
                .add_directive("portfolio_cms=info".parse()?),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("Usage: seed <bundle.json | projects.json blogs.json certificates.json>");
    }

    let bundle = load(&paths)?;
    if bundle.is_empty() {
        info!("Nothing to import");
        return Ok(());
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let store = PgStore::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let imported = import_bundle(&store, bundle).await?;
    info!("✓ Imported {} entries", imported);

    Ok(())
}
