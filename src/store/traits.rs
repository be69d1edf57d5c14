//! `SettingsRepository`: key-value persistence for JSON settings blobs.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Backend-agnostic settings store.
///
/// Values are JSON documents keyed by a fixed name (see
/// `setup::model::settings_keys`).
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Get a setting, or `None` if it was never saved.
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or replace a setting.
    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), DatabaseError>;

    /// Remove a setting. Returns whether it existed.
    async fn clear(&self, key: &str) -> Result<bool, DatabaseError>;
}
