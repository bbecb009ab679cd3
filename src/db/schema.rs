//! Schema migrations
//!
//! Migrations are plain SQL files compiled into the binary and applied in
//! version order. Each one runs in its own transaction together with the
//! `schema_version` row that records it.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::errors::{DbError, DbResult};

const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../migrations/001_policy_documents.sql")),
    (2, include_str!("../../migrations/002_collaborators.sql")),
];

/// Latest schema version known to this build
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}

/// Apply every migration newer than the stored schema version
pub fn run_migrations(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
             version    INTEGER PRIMARY KEY,
             applied_at TEXT    NOT NULL
         );",
    )?;

    let current = current_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        tracing::info!(version, "running migration");

        let tx = conn.transaction()?;
        tx.execute_batch(sql).map_err(|e| DbError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![version, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
    }

    Ok(())
}

/// Current schema version (0 on an empty database)
pub fn current_version(conn: &Connection) -> DbResult<i64> {
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}
