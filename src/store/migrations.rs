//! Schema versions for the settings database.
//!
//! Applied versions are recorded in `_migrations`. Each pending step runs in
//! its own transaction together with its version record, so a failed step
//! leaves the schema at the previous version.

use libsql::{Connection, params};
use tracing::{debug, info};

use crate::error::DatabaseError;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered schema steps. Append only.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "settings",
    sql: "CREATE TABLE IF NOT EXISTS settings (
              user_id TEXT NOT NULL,
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              PRIMARY KEY (user_id, key)
          );",
}];

/// Latest schema version this build knows about.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Bring the schema up to [`latest_version`].
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
             version INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             applied_at TEXT NOT NULL DEFAULT (datetime('now'))
         );",
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("_migrations: {e}")))?;

    let applied = current_version(conn).await?;
    let pending = MIGRATIONS.iter().filter(|m| m.version > applied);
    for step in pending {
        apply(conn, step).await?;
        info!(version = step.version, name = step.name, "Schema migrated");
    }

    debug!(version = latest_version(), "Schema up to date");
    Ok(())
}

/// Highest recorded version, 0 for a fresh database.
pub async fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;
    let Some(row) = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?
    else {
        return Ok(0);
    };
    row.get::<i64>(0)
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

async fn apply(conn: &Connection, step: &Migration) -> Result<(), DatabaseError> {
    let failed =
        |e: libsql::Error| DatabaseError::Migration(format!("V{} {}: {e}", step.version, step.name));

    let tx = conn.transaction().await.map_err(failed)?;
    tx.execute_batch(step.sql).await.map_err(failed)?;
    tx.execute(
        "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
        params![step.version, step.name],
    )
    .await
    .map_err(failed)?;
    tx.commit().await.map_err(failed)
}
