//! # Document Repository
//!
//! Owns the `policy_documents` table. Reads go straight through the pool;
//! lifecycle writes run as one `BEGIN IMMEDIATE` transaction each, so the read
//! of the current state, the policy decision and the write cannot interleave
//! with another writer.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::errors::{DocumentError, DocumentResult};
use super::lifecycle::{transition, LifecycleOp, TransitionOutcome};
use super::model::{
    ApprovalStatus, AttachedFile, DocumentContent, DocumentDetail, DocumentSummary,
    LifecycleState, NewFile, ParseApprovalStatusError, PolicyDocument,
};
use crate::blob::{BlobError, BlobHandle, BlobStore};
use crate::clock::Clock;
use crate::db::{from_micros, to_micros, DbError, DbPool, DbResult};

const TABLE: &str = "policy_documents";

const SELECT_COLUMNS: &str = "document_id, document_name, owner_dept, approval_status,
     last_review, document_approved, file_name, blob_handle, file_size, file_sha256, created_at";

/// Parse a path id. Anything that is not a UUID cannot name a document.
pub fn parse_document_id(raw: &str) -> DocumentResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| DocumentError::not_found(raw))
}

/// SHA-256 of the content, lowercase hex
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Policy document store
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: DbPool,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
}

impl DocumentRepository {
    pub fn new(pool: DbPool, blobs: Arc<dyn BlobStore>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, blobs, clock }
    }

    /// Insert a new Pending document, storing the file first if one is given.
    ///
    /// A failed blob store creates no record; a failed insert removes the blob.
    pub async fn create(
        &self,
        document_name: &str,
        owner_dept: &str,
        file: Option<NewFile>,
    ) -> DocumentResult<Uuid> {
        let document_name = required("document_name", document_name)?;
        let owner_dept = required("owner_dept", owner_dept)?;

        let attached = match file {
            Some(file) => Some(self.store_blob(file).await?),
            None => None,
        };

        let doc = PolicyDocument {
            document_id: Uuid::new_v4(),
            document_name,
            owner_dept,
            lifecycle: LifecycleState::default(),
            file: attached.clone(),
            created_at: self.clock.now().trunc_subsecs(6),
        };
        let document_id = doc.document_id;

        let inserted = self.pool.run(move |conn| insert_document(conn, &doc)).await;

        if let Err(e) = inserted {
            if let Some(file) = attached {
                self.discard_blob(BlobHandle::from_stored(file.blob_handle)).await;
            }
            return Err(e.into());
        }

        tracing::info!(%document_id, "document created");
        Ok(document_id)
    }

    /// Summary fields only
    pub async fn get(&self, document_id: Uuid) -> DocumentResult<DocumentSummary> {
        Ok(self.fetch(document_id).await?.summary())
    }

    /// Summary plus original filename
    pub async fn get_detail(&self, document_id: Uuid) -> DocumentResult<DocumentDetail> {
        Ok(self.fetch(document_id).await?.detail())
    }

    /// Stored file for download. A document without a file is `NotFound`.
    pub async fn get_content(&self, document_id: Uuid) -> DocumentResult<DocumentContent> {
        let doc = self.fetch(document_id).await?;
        let file = doc
            .file
            .ok_or_else(|| DocumentError::not_found(document_id))?;

        let blobs = Arc::clone(&self.blobs);
        let handle = BlobHandle::from_stored(file.blob_handle.clone());
        let data = tokio::task::spawn_blocking(move || blobs.load(&handle))
            .await
            .map_err(|e| DocumentError::Storage(e.to_string()))?
            .map_err(|e| match e {
                BlobError::NotFound(_) | BlobError::InvalidHandle(_) => DocumentError::Storage(
                    format!("blob {} referenced by {} is missing", file.blob_handle, document_id),
                ),
                other => other.into(),
            })?;

        if content_digest(&data) != file.sha256 {
            return Err(DocumentError::Storage(format!(
                "checksum mismatch for blob {}",
                file.blob_handle
            )));
        }

        Ok(DocumentContent {
            file_name: file.file_name,
            data,
        })
    }

    /// All documents, by name ascending
    pub async fn list(&self) -> DocumentResult<Vec<DocumentSummary>> {
        let docs = self.pool.run(|conn| list_documents(conn)).await?;
        Ok(docs.iter().map(PolicyDocument::summary).collect())
    }

    /// Record a review; approval fields are untouched
    pub async fn review(&self, document_id: Uuid) -> DocumentResult<DocumentDetail> {
        self.apply(document_id, LifecycleOp::Review).await
    }

    /// Approve; the first approval timestamp is kept forever
    pub async fn approve(&self, document_id: Uuid) -> DocumentResult<DocumentDetail> {
        self.apply(document_id, LifecycleOp::Approve).await
    }

    async fn apply(&self, document_id: Uuid, op: LifecycleOp) -> DocumentResult<DocumentDetail> {
        let clock = Arc::clone(&self.clock);
        let applied = self
            .pool
            .run(move |conn| apply_transition(conn, document_id, op, clock.as_ref()))
            .await?;

        let (doc, outcome) = applied.ok_or_else(|| DocumentError::not_found(document_id))?;

        if outcome.clock_behind {
            tracing::warn!(%document_id, %op, "clock behind stored review time, last_review kept");
        }
        tracing::info!(
            %document_id,
            %op,
            newly_approved = outcome.newly_approved,
            status = %doc.lifecycle.approval_status,
            "lifecycle transition applied"
        );

        Ok(doc.detail())
    }

    async fn fetch(&self, document_id: Uuid) -> DocumentResult<PolicyDocument> {
        self.pool
            .run(move |conn| fetch_document(conn, document_id))
            .await?
            .ok_or_else(|| DocumentError::not_found(document_id))
    }

    async fn store_blob(&self, file: NewFile) -> DocumentResult<AttachedFile> {
        let blobs = Arc::clone(&self.blobs);
        let stored = tokio::task::spawn_blocking(move || {
            let handle = blobs.store(&file.data, &file.file_name)?;
            Ok::<_, BlobError>(AttachedFile {
                blob_handle: handle.as_str().to_string(),
                size: file.data.len() as u64,
                sha256: content_digest(&file.data),
                file_name: file.file_name,
            })
        })
        .await
        .map_err(|e| DocumentError::Storage(e.to_string()))?;

        stored.map_err(|e| {
            tracing::error!(error = %e, "blob store failed, document not created");
            DocumentError::from(e)
        })
    }

    async fn discard_blob(&self, handle: BlobHandle) {
        let blobs = Arc::clone(&self.blobs);
        let removed = tokio::task::spawn_blocking(move || blobs.delete(&handle)).await;
        if !matches!(removed, Ok(Ok(()))) {
            tracing::warn!("could not remove blob of failed document insert");
        }
    }
}

fn required(field: &str, value: &str) -> DocumentResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DocumentError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// ==================
// SQL
// ==================

fn insert_document(conn: &mut Connection, doc: &PolicyDocument) -> DbResult<()> {
    let file = doc.file.as_ref();
    conn.execute(
        "INSERT INTO policy_documents
             (document_id, document_name, owner_dept, approval_status, last_review,
              document_approved, file_name, blob_handle, file_size, file_sha256, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            doc.document_id.to_string(),
            doc.document_name,
            doc.owner_dept,
            doc.lifecycle.approval_status.as_str(),
            doc.lifecycle.last_review.map(to_micros),
            doc.lifecycle.document_approved.map(to_micros),
            file.map(|f| f.file_name.as_str()),
            file.map(|f| f.blob_handle.as_str()),
            file.map(|f| f.size as i64),
            file.map(|f| f.sha256.as_str()),
            to_micros(doc.created_at),
        ],
    )?;
    Ok(())
}

fn fetch_document(conn: &Connection, document_id: Uuid) -> DbResult<Option<PolicyDocument>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM policy_documents WHERE document_id = ?1");
    let row = conn
        .query_row(&sql, params![document_id.to_string()], DocumentRow::read)
        .optional()?;
    row.map(DocumentRow::into_document).transpose()
}

fn list_documents(conn: &Connection) -> DbResult<Vec<PolicyDocument>> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM policy_documents ORDER BY document_name ASC, document_id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], DocumentRow::read)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(row?.into_document()?);
    }
    Ok(docs)
}

/// Read-decide-write under the database write lock.
///
/// `now` is sampled after the lock is taken, so transactions commit in the
/// order their timestamps were drawn.
fn apply_transition(
    conn: &mut Connection,
    document_id: Uuid,
    op: LifecycleOp,
    clock: &dyn Clock,
) -> DbResult<Option<(PolicyDocument, TransitionOutcome)>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let Some(mut doc) = fetch_document(&tx, document_id)? else {
        return Ok(None);
    };

    let now = clock.now().trunc_subsecs(6);
    let outcome = transition(&doc.lifecycle, op, now);

    tx.execute(
        "UPDATE policy_documents
            SET approval_status = ?2, last_review = ?3, document_approved = ?4
          WHERE document_id = ?1",
        params![
            document_id.to_string(),
            outcome.next.approval_status.as_str(),
            outcome.next.last_review.map(to_micros),
            outcome.next.document_approved.map(to_micros),
        ],
    )?;
    tx.commit()?;

    doc.lifecycle = outcome.next;
    Ok(Some((doc, outcome)))
}

/// Raw column values, converted after the statement finishes
struct DocumentRow {
    document_id: String,
    document_name: String,
    owner_dept: String,
    approval_status: String,
    last_review: Option<i64>,
    document_approved: Option<i64>,
    file_name: Option<String>,
    blob_handle: Option<String>,
    file_size: Option<i64>,
    file_sha256: Option<String>,
    created_at: i64,
}

impl DocumentRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            document_id: row.get(0)?,
            document_name: row.get(1)?,
            owner_dept: row.get(2)?,
            approval_status: row.get(3)?,
            last_review: row.get(4)?,
            document_approved: row.get(5)?,
            file_name: row.get(6)?,
            blob_handle: row.get(7)?,
            file_size: row.get(8)?,
            file_sha256: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_document(self) -> DbResult<PolicyDocument> {
        let document_id = Uuid::parse_str(&self.document_id)
            .map_err(|e| DbError::corrupt(TABLE, format!("document_id: {e}")))?;
        let approval_status: ApprovalStatus = self
            .approval_status
            .parse()
            .map_err(|e: ParseApprovalStatusError| DbError::corrupt(TABLE, e.to_string()))?;

        let file = match (self.file_name, self.blob_handle) {
            (Some(file_name), Some(blob_handle)) => Some(AttachedFile {
                file_name,
                blob_handle,
                size: self.file_size.unwrap_or(0).max(0) as u64,
                sha256: self.file_sha256.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(PolicyDocument {
            document_id,
            document_name: self.document_name,
            owner_dept: self.owner_dept,
            lifecycle: LifecycleState {
                approval_status,
                last_review: optional_ts(self.last_review)?,
                document_approved: optional_ts(self.document_approved)?,
            },
            file,
            created_at: from_micros(TABLE, self.created_at)?,
        })
    }
}

fn optional_ts(micros: Option<i64>) -> DbResult<Option<DateTime<Utc>>> {
    micros.map(|m| from_micros(TABLE, m)).transpose()
}
