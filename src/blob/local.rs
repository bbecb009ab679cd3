//! # Local Filesystem Blob Store

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use rand::Rng;

use super::backend::{BlobHandle, BlobStore};
use super::errors::{BlobError, BlobResult};

/// Blob store keeping one file per blob in a flat directory
#[derive(Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> BlobResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn full_path(&self, handle: &BlobHandle) -> BlobResult<PathBuf> {
        handle.validate()?;
        Ok(self.root.join(handle.as_str()))
    }

    fn staging_path(&self, handle: &BlobHandle) -> PathBuf {
        let nonce: u64 = rand::thread_rng().gen();
        self.root
            .join(format!(".{}.{:016x}.partial", handle.as_str(), nonce))
    }
}

impl BlobStore for LocalBlobStore {
    fn store(&self, content: &[u8], original_name: &str) -> BlobResult<BlobHandle> {
        let handle = BlobHandle::generate(original_name);
        let target = self.full_path(&handle)?;
        let staging = self.staging_path(&handle);

        // Write + fsync the staging file, then rename into place
        let written = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&staging)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&staging, &target)
        })();

        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            tracing::warn!(handle = %handle, error = %e, "blob write failed");
            return Err(match BlobError::from(e) {
                // A missing staging directory means the medium is gone, not the blob
                BlobError::NotFound(msg) => BlobError::IoError(msg),
                other => other,
            });
        }

        Ok(handle)
    }

    fn load(&self, handle: &BlobHandle) -> BlobResult<Vec<u8>> {
        let path = self.full_path(handle)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BlobError::NotFound(handle.to_string())
            } else {
                BlobError::from(e)
            }
        })
    }

    fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        let path = self.full_path(handle)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_load() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let handle = store.store(b"hello", "hello.txt").unwrap();
        assert_eq!(store.load(&handle).unwrap(), b"hello");
        assert!(temp.path().join(handle.as_str()).exists());
    }

    #[test]
    fn test_no_partial_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        store.store(b"one", "a.bin").unwrap();
        store.store(b"two", "a.bin").unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.ends_with(".partial")));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let handle = store.store(b"bye", "bye.txt").unwrap();
        store.delete(&handle).unwrap();
        store.delete(&handle).unwrap();
        assert!(matches!(store.load(&handle), Err(BlobError::NotFound(_))));
    }

    #[test]
    fn test_store_fails_when_directory_removed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("blobs");
        let store = LocalBlobStore::open(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        let result = store.store(b"data", "x.txt");
        assert!(matches!(result, Err(BlobError::IoError(_))));
    }

    #[test]
    fn test_load_rejects_traversal_handle() {
        let temp = TempDir::new().unwrap();
        let store = LocalBlobStore::open(temp.path()).unwrap();

        let result = store.load(&BlobHandle::from_stored("../outside"));
        assert!(matches!(result, Err(BlobError::InvalidHandle(_))));
    }
}
