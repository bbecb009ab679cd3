//! # In-Memory Blob Store

use std::collections::HashMap;
use std::sync::RwLock;

use super::backend::{BlobHandle, BlobStore};
use super::errors::{BlobError, BlobResult};

/// Process-memory blob store with an optional byte budget
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobHandle, Vec<u8>>>,
    capacity_bytes: Option<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports `StorageFull` once `capacity_bytes` would be exceeded
    pub fn with_capacity_bytes(capacity_bytes: usize) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn store(&self, content: &[u8], original_name: &str) -> BlobResult<BlobHandle> {
        let handle = BlobHandle::generate(original_name);
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| BlobError::IoError("blob map lock poisoned".into()))?;

        if let Some(limit) = self.capacity_bytes {
            let used: usize = blobs.values().map(Vec::len).sum();
            if used + content.len() > limit {
                return Err(BlobError::StorageFull);
            }
        }

        blobs.insert(handle.clone(), content.to_vec());
        Ok(handle)
    }

    fn load(&self, handle: &BlobHandle) -> BlobResult<Vec<u8>> {
        handle.validate()?;
        let blobs = self
            .blobs
            .read()
            .map_err(|_| BlobError::IoError("blob map lock poisoned".into()))?;
        blobs
            .get(handle)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(handle.to_string()))
    }

    fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| BlobError::IoError("blob map lock poisoned".into()))?;
        blobs.remove(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_load_delete() {
        let store = MemoryBlobStore::new();
        let handle = store.store(b"bytes", "a.txt").unwrap();
        assert_eq!(store.load(&handle).unwrap(), b"bytes");

        store.delete(&handle).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.load(&handle), Err(BlobError::NotFound(_))));
    }

    #[test]
    fn test_capacity_limit() {
        let store = MemoryBlobStore::with_capacity_bytes(8);
        store.store(b"12345", "a").unwrap();

        let result = store.store(b"6789", "b");
        assert!(matches!(result, Err(BlobError::StorageFull)));
        assert_eq!(store.len(), 1);
    }
}
