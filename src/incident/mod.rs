//! # Incident Reports
//!
//! Incidents are stored as submitted, with an optional evidence file kept in
//! the blob store. New incidents always start `open`.

pub mod errors;

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{params, Row};
use serde::Serialize;

use crate::blob::{BlobHandle, BlobStore};
use crate::db::{DbError, DbPool, DbResult};

pub use errors::{IncidentError, IncidentResult};

/// Status given to every new incident
pub const INITIAL_STATUS: &str = "open";

/// A stored incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incident {
    pub incident_id: i64,
    pub incident_type: Option<String>,
    pub severity_level: Option<String>,
    /// Serialized as `YYYY-MM-DD`
    pub date_reported: Option<NaiveDate>,
    pub department: Option<String>,
    pub description: Option<String>,
    /// Blob handle of the evidence file
    pub evidence: Option<String>,
    pub status: String,
}

/// Evidence upload
#[derive(Debug, Clone)]
pub struct EvidenceFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Submitted incident form
#[derive(Debug, Clone, Default)]
pub struct NewIncident {
    pub incident_type: Option<String>,
    pub severity_level: Option<String>,
    pub date_reported: Option<NaiveDate>,
    pub department: Option<String>,
    pub description: Option<String>,
    pub evidence: Option<EvidenceFile>,
}

/// Parse a form date; blank means "not given"
pub fn parse_report_date(raw: &str) -> IncidentResult<Option<NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| IncidentError::Validation(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// Incident store backed by the shared pool and blob store
#[derive(Debug, Clone)]
pub struct IncidentRepository {
    pool: DbPool,
    blobs: Arc<dyn BlobStore>,
}

impl IncidentRepository {
    pub fn new(pool: DbPool, blobs: Arc<dyn BlobStore>) -> Self {
        Self { pool, blobs }
    }

    /// All incidents in id order
    pub async fn list(&self) -> IncidentResult<Vec<Incident>> {
        let incidents = self
            .pool
            .run(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT incident_id, incident_type, severity_level, date_reported,
                            department, description, evidence, status
                       FROM incidents
                      ORDER BY incident_id ASC",
                )?;
                let rows = stmt.query_map([], read_incident)?;
                let mut incidents = Vec::new();
                for row in rows {
                    incidents.push(row??);
                }
                Ok(incidents)
            })
            .await?;
        Ok(incidents)
    }

    /// Store the evidence (if any), then insert the incident
    pub async fn submit(&self, incident: NewIncident) -> IncidentResult<i64> {
        let NewIncident {
            incident_type,
            severity_level,
            date_reported,
            department,
            description,
            evidence,
        } = incident;

        let handle = match evidence {
            Some(file) => {
                let blobs = Arc::clone(&self.blobs);
                let handle = tokio::task::spawn_blocking(move || {
                    blobs.store(&file.data, &file.file_name)
                })
                .await
                .map_err(|e| IncidentError::Storage(e.to_string()))??;
                Some(handle)
            }
            None => None,
        };

        let evidence = handle.as_ref().map(|h| h.as_str().to_string());
        let inserted = self
            .pool
            .run(move |conn| {
                conn.execute(
                    "INSERT INTO incidents
                         (incident_type, severity_level, date_reported, department,
                          description, evidence, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        incident_type,
                        severity_level,
                        date_reported.map(|d| d.to_string()),
                        department,
                        description,
                        evidence,
                        INITIAL_STATUS,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await;

        match inserted {
            Ok(incident_id) => {
                tracing::info!(incident_id, "incident submitted");
                Ok(incident_id)
            }
            Err(e) => {
                if let Some(handle) = handle {
                    self.discard_blob(handle).await;
                }
                Err(e.into())
            }
        }
    }

    async fn discard_blob(&self, handle: BlobHandle) {
        let blobs = Arc::clone(&self.blobs);
        let removed = tokio::task::spawn_blocking(move || blobs.delete(&handle)).await;
        if !matches!(removed, Ok(Ok(()))) {
            tracing::warn!("could not remove evidence of failed incident insert");
        }
    }
}

fn read_incident(row: &Row<'_>) -> rusqlite::Result<DbResult<Incident>> {
    let date_reported: Option<String> = row.get(3)?;
    let date_reported = match date_reported {
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(e) => {
                return Ok(Err(DbError::corrupt(
                    "incidents",
                    format!("date_reported: {e}"),
                )))
            }
        },
        None => None,
    };

    Ok(Ok(Incident {
        incident_id: row.get(0)?,
        incident_type: row.get(1)?,
        severity_level: row.get(2)?,
        date_reported,
        department: row.get(4)?,
        description: row.get(5)?,
        evidence: row.get(6)?,
        status: row.get(7)?,
    }))
}
