//! # Blob Store Module
//!
//! Uploaded file bytes live here, addressed by generated handles. Document and
//! incident records keep only the handle.

pub mod backend;
pub mod config;
pub mod errors;
pub mod local;
pub mod memory;

pub use backend::{BlobHandle, BlobStore};
pub use config::{BlobBackendKind, BlobConfig};
pub use errors::{BlobError, BlobResult};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
