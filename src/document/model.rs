//! Policy document records and their serialized views

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Approval state of a policy document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored status string that names no known status
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown approval status '{0}'")]
pub struct ParseApprovalStatusError(pub String);

impl FromStr for ApprovalStatus {
    type Err = ParseApprovalStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ApprovalStatus::Pending),
            "Approved" => Ok(ApprovalStatus::Approved),
            other => Err(ParseApprovalStatusError(other.to_string())),
        }
    }
}

/// The fields the lifecycle policy reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LifecycleState {
    pub approval_status: ApprovalStatus,
    pub last_review: Option<DateTime<Utc>>,
    pub document_approved: Option<DateTime<Utc>>,
}

/// Metadata of an uploaded file attached to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedFile {
    pub file_name: String,
    pub blob_handle: String,
    pub size: u64,
    pub sha256: String,
}

/// Full stored record, minus the raw content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    pub document_id: Uuid,
    pub document_name: String,
    pub owner_dept: String,
    pub lifecycle: LifecycleState,
    pub file: Option<AttachedFile>,
    pub created_at: DateTime<Utc>,
}

/// Listing view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub document_name: String,
    pub owner_dept: String,
    pub approval_status: ApprovalStatus,
    pub last_review: Option<DateTime<Utc>>,
    pub document_approved: Option<DateTime<Utc>>,
}

/// Single-document view: summary plus the original filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub summary: DocumentSummary,
    pub file_name: Option<String>,
}

/// Body returned by review and approve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleView {
    pub last_review: Option<DateTime<Utc>>,
    pub approval_status: ApprovalStatus,
    pub document_approved: Option<DateTime<Utc>>,
}

/// Downloadable content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContent {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Upload attached to a create request
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl PolicyDocument {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            document_id: self.document_id,
            document_name: self.document_name.clone(),
            owner_dept: self.owner_dept.clone(),
            approval_status: self.lifecycle.approval_status,
            last_review: self.lifecycle.last_review,
            document_approved: self.lifecycle.document_approved,
        }
    }

    pub fn detail(&self) -> DocumentDetail {
        DocumentDetail {
            summary: self.summary(),
            file_name: self.file.as_ref().map(|f| f.file_name.clone()),
        }
    }
}

impl DocumentDetail {
    pub fn lifecycle(&self) -> LifecycleView {
        LifecycleView {
            last_review: self.summary.last_review,
            approval_status: self.summary.approval_status,
            document_approved: self.summary.document_approved,
        }
    }
}
