//! libSQL backend for `SettingsRepository`.
//!
//! Supports a local database file and an in-memory database for tests.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::SettingsRepository;

/// Owner of every row; the assistant is single-user.
pub const DEFAULT_USER: &str = "default";

/// Settings stored in the `settings` table, one JSON value per key.
///
/// `libsql::Connection` is `Send + Sync`, so a single connection is shared.
pub struct LibSqlSettings {
    _db: Arc<LibSqlDatabase>,
    conn: Connection,
    user_id: String,
}

impl LibSqlSettings {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;
        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Settings database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
            user_id: DEFAULT_USER.to_string(),
        })
    }

    /// Scope reads and writes to another user id.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }
}

#[async_trait]
impl SettingsRepository for LibSqlSettings {
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![self.user_id.as_str(), key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("load setting: {e}")))?;
                let value = serde_json::from_str(&value_str)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
                debug!(key, "Setting loaded");
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load setting: {e}"))),
        }
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.user_id.as_str(), key, value_str, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save setting: {e}")))?;
        debug!(key, "Setting saved");
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![self.user_id.as_str(), key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("clear setting: {e}")))?;
        Ok(count > 0)
    }
}
