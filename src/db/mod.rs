//! # Relational Store
//!
//! SQLite via `rusqlite`, behind a process-wide connection pool with an
//! explicit open/close lifecycle.

pub mod config;
pub mod errors;
pub mod pool;
pub mod schema;

pub use config::DatabaseConfig;
pub use errors::{DbError, DbResult};
pub use pool::DbPool;

use chrono::{DateTime, TimeZone, Utc};

/// Persisted form of a timestamp: microseconds since the Unix epoch
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

/// Inverse of [`to_micros`]
pub fn from_micros(table: &'static str, micros: i64) -> DbResult<DateTime<Utc>> {
    Utc.timestamp_micros(micros)
        .single()
        .ok_or_else(|| DbError::corrupt(table, format!("timestamp out of range: {micros}")))
}
