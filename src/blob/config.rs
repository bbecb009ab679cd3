//! Blob store configuration

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::BlobStore;
use super::errors::BlobResult;
use super::local::LocalBlobStore;
use super::memory::MemoryBlobStore;

/// Which backend keeps uploaded bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackendKind {
    #[default]
    Filesystem,
    Memory,
}

/// Blob store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Backend (default: filesystem)
    #[serde(default)]
    pub backend: BlobBackendKind,

    /// Directory for the filesystem backend (default: "./uploads")
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
}

fn default_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackendKind::default(),
            dir: default_dir(),
        }
    }
}

impl BlobConfig {
    pub fn memory() -> Self {
        Self {
            backend: BlobBackendKind::Memory,
            ..Default::default()
        }
    }

    /// Construct the configured backend
    pub fn build(&self) -> BlobResult<Arc<dyn BlobStore>> {
        Ok(match self.backend {
            BlobBackendKind::Filesystem => Arc::new(LocalBlobStore::open(&self.dir)?),
            BlobBackendKind::Memory => Arc::new(MemoryBlobStore::new()),
        })
    }
}
