use crate::db::DocumentStore;
use crate::error::{CmsError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SETTINGS_COLLECTION: &str = "settings";
pub const PROFILE_DOCUMENT: &str = "profile";

/// The singleton profile settings document: opaque string pairs such as
/// resume references. Writes merge one key at a time.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn DocumentStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Current settings; empty until the first write. Non-string values are skipped.
    pub async fn get(&self) -> Result<BTreeMap<String, String>> {
        let document = self
            .store
            .get(SETTINGS_COLLECTION, PROFILE_DOCUMENT)
            .await?;

        let mut settings = BTreeMap::new();
        if let Some(document) = document {
            for (key, value) in document.data {
                match value {
                    Value::String(s) => {
                        settings.insert(key, s);
                    }
                    other => warn!("Ignoring non-string setting {}: {}", key, other),
                }
            }
        }
        Ok(settings)
    }

    /// Set one key, leaving the others untouched.
    pub async fn merge(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CmsError::Validation("setting key is required".to_string()));
        }

        let mut fields = Map::new();
        fields.insert(key.to_string(), Value::String(value.to_string()));

        self.store
            .merge(SETTINGS_COLLECTION, PROFILE_DOCUMENT, fields)
            .await
            .map_err(|e| {
                error!("Failed to update setting {}: {}", key, e);
                e
            })?;

        info!("Updated setting {}", key);
        Ok(())
    }
}
