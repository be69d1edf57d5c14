//! In-memory `SettingsRepository`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::DatabaseError;
use crate::store::traits::SettingsRepository;

/// Settings held in a map; nothing survives the process.
#[derive(Default)]
pub struct InMemorySettings {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettings {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), DatabaseError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<bool, DatabaseError> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}
