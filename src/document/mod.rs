//! # Policy Documents
//!
//! Document records, the pure lifecycle policy that moves them from Pending to
//! Approved, and the repository that applies it atomically.

pub mod errors;
pub mod lifecycle;
pub mod model;
pub mod repository;

pub use errors::{DocumentError, DocumentResult};
pub use lifecycle::{transition, LifecycleOp, TransitionOutcome};
pub use model::{
    ApprovalStatus, DocumentContent, DocumentDetail, DocumentSummary, LifecycleState,
    LifecycleView, NewFile, ParseApprovalStatusError, PolicyDocument,
};
pub use repository::{parse_document_id, DocumentRepository};
