//! # Audit Records
//!
//! Insert/list of scheduled and completed audits, plus a per-status summary
//! whose labels are normalized case- and whitespace-insensitively.

pub mod errors;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbPool, DbResult};

pub use errors::{AuditError, AuditResult};

/// A stored audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub audit_id: String,
    pub audit_name: String,
    #[serde(default)]
    pub dept_audited: Option<String>,
    #[serde(default)]
    pub auditor: Option<String>,
    #[serde(default)]
    pub audit_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One row of the status summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Display label for a raw status value
pub fn status_label(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "completed" => "Completed".to_string(),
        "scheduled" => "Scheduled".to_string(),
        "in progress" => "In Progress".to_string(),
        "pending" => "Pending".to_string(),
        "" => "Unknown".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Audit store backed by the shared pool
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: DbPool,
}

impl AuditRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All audits, newest `audit_date` first
    pub async fn list(&self) -> AuditResult<Vec<Audit>> {
        let audits = self
            .pool
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT audit_id, audit_name, dept_audited, auditor, audit_date, status
                       FROM audits
                      ORDER BY audit_date DESC, audit_id ASC",
                )?;
                let rows = stmt.query_map([], read_audit)?;
                let mut audits = Vec::new();
                for row in rows {
                    audits.push(row??);
                }
                Ok(audits)
            })
            .await?;
        Ok(audits)
    }

    /// Insert an audit exactly as sent
    pub async fn insert(&self, audit: Audit) -> AuditResult<Audit> {
        if audit.audit_id.trim().is_empty() {
            return Err(AuditError::Validation("audit_id is required".into()));
        }
        if audit.audit_name.trim().is_empty() {
            return Err(AuditError::Validation("audit_name is required".into()));
        }

        let stored = audit.clone();
        let inserted = self
            .pool
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO audits
                         (audit_id, audit_name, dept_audited, auditor, audit_date, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        stored.audit_id,
                        stored.audit_name,
                        stored.dept_audited,
                        stored.auditor,
                        stored.audit_date.map(|d| d.to_string()),
                        stored.status,
                    ],
                )?;
                Ok(())
            })
            .await;

        match inserted {
            Ok(()) => {
                tracing::info!(audit_id = %audit.audit_id, "audit added");
                Ok(audit)
            }
            Err(e) if e.is_unique_violation() => Err(AuditError::Duplicate(audit.audit_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Count audits per normalized status label, sorted by label
    pub async fn status_summary(&self) -> AuditResult<Vec<StatusCount>> {
        let grouped: Vec<(Option<String>, i64)> = self
            .pool
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT TRIM(LOWER(status)) AS normalized_status, COUNT(*)
                       FROM audits
                      GROUP BY normalized_status",
                )?;
                let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
                let mut grouped = Vec::new();
                for row in rows {
                    grouped.push(row?);
                }
                Ok(grouped)
            })
            .await?;

        // Different raw spellings can still land on the same label
        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for (raw, count) in grouped {
            *counts
                .entry(status_label(raw.as_deref().unwrap_or("")))
                .or_insert(0) += count;
        }

        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }
}

fn read_audit(row: &Row<'_>) -> rusqlite::Result<DbResult<Audit>> {
    let audit_date: Option<String> = row.get(4)?;
    let audit_date = match audit_date {
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => return Ok(Err(DbError::corrupt("audits", format!("audit_date: {e}")))),
        },
        None => None,
    };

    Ok(Ok(Audit {
        audit_id: row.get(0)?,
        audit_name: row.get(1)?,
        dept_audited: row.get(2)?,
        auditor: row.get(3)?,
        audit_date,
        status: row.get(5)?,
    }))
}
