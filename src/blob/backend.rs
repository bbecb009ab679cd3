//! # Blob Store Trait

use std::fmt;
use std::sync::OnceLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::{BlobError, BlobResult};

/// Longest sanitized original-name suffix kept in a generated key
const MAX_NAME_LEN: usize = 100;

/// Opaque identifier addressing stored content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Generate a fresh handle for an upload.
    ///
    /// Format: `<unix millis>-<random>-<sanitized original name>`.
    pub fn generate(original_name: &str) -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        Self(format!("{}-{}-{}", millis, suffix, sanitize_name(original_name)))
    }

    /// Wrap a handle read back from persistent storage
    pub fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject handles that could escape the blob namespace
    pub fn validate(&self) -> BlobResult<()> {
        let raw = self.0.as_str();
        if raw.is_empty()
            || raw.contains('/')
            || raw.contains('\\')
            || raw.contains("..")
            || raw.chars().any(|c| c.is_control())
        {
            return Err(BlobError::InvalidHandle(raw.to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex is valid"))
}

/// Map an uploaded filename onto the key alphabet
pub fn sanitize_name(original_name: &str) -> String {
    let replaced = unsafe_chars().replace_all(original_name, "_");
    // ".." never survives, so keys stay within one directory level
    let mut cleaned = replaced.replace("..", "_");
    if cleaned.is_empty() {
        cleaned.push_str("file");
    }
    cleaned.chars().take(MAX_NAME_LEN).collect()
}

/// Backend trait for blob storage.
///
/// `store` is atomic: either the whole content becomes readable under the
/// returned handle, or an error is returned and nothing is visible.
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Persist content, returning the handle that addresses it
    fn store(&self, content: &[u8], original_name: &str) -> BlobResult<BlobHandle>;

    /// Read content back
    fn load(&self, handle: &BlobHandle) -> BlobResult<Vec<u8>>;

    /// Remove content. Deleting a missing blob is not an error.
    fn delete(&self, handle: &BlobHandle) -> BlobResult<()>;
}
