use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, RoyaltyError};

/// Object storage for report bytes. The compressor never touches it directly.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>>;
    /// Store `bytes` under `key` and return the key written.
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;
    /// A time-limited download URL for `key`.
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String>;
    fn delete(&self, key: &str) -> Result<()>;
}

/// Blob store backed by a local directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        let valid = !key.is_empty()
            && rel
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !valid {
            return Err(RoyaltyError::MalformedInput(format!("invalid object key: {key}")));
        }
        Ok(self.root.join(rel))
    }
}

impl BlobStore for FsBlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        debug!(path = %path.display(), "reading object");
        Ok(std::fs::read(path)?)
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), content_type, size = bytes.len(), "stored object");
        Ok(key.to_string())
    }

    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String> {
        let path = self.resolve(key)?;
        let path = std::fs::canonicalize(&path)?;
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| RoyaltyError::UnexpectedFailure(e.to_string()))?;
        let expires = (chrono::Utc::now() + ttl).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        Ok(format!("file://{}?expires={expires}", path.display()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => {
                debug!(path = %path.display(), "deleted object");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub struct MemoryBlobStore {
    objects: std::cell::RefCell<std::collections::BTreeMap<String, (Vec<u8>, String)>>,
    pub fail_presign: std::cell::Cell<bool>,
}

#[cfg(test)]
impl MemoryBlobStore {
    pub fn new() -> Self {
        Self {
            objects: Default::default(),
            fail_presign: std::cell::Cell::new(false),
        }
    }

    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .borrow_mut()
            .insert(key.to_string(), (bytes.to_vec(), "text/csv".to_string()));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.borrow().get(key).map(|(_, ct)| ct.clone())
    }
}

#[cfg(test)]
impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .borrow()
            .get(key)
            .map(|(b, _)| b.clone())
            .ok_or_else(|| RoyaltyError::UnexpectedFailure(format!("no such key: {key}")))
    }

    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        self.objects
            .borrow_mut()
            .insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(key.to_string())
    }

    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String> {
        if self.fail_presign.get() {
            return Err(RoyaltyError::UnexpectedFailure("signing key unavailable".to_string()));
        }
        Ok(format!("memory://{key}?ttl={}", ttl.as_secs()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.objects.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let key = store.put("processed_reports/a.csv", b"x,y\n", "text/csv").unwrap();
        assert_eq!(key, "processed_reports/a.csv");
        assert_eq!(store.get(&key).unwrap(), b"x,y\n");
        assert!(dir.path().join("processed_reports").join("a.csv").exists());
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        for key in ["../secret", "/etc/passwd", "a/../../b", ""] {
            let err = store.get(key).unwrap_err();
            assert_eq!(err.code(), "malformed_input", "key {key:?}");
        }
    }

    #[test]
    fn test_missing_object_is_unexpected_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        let err = store.get("uploads/none.csv").unwrap_err();
        assert_eq!(err.code(), "unexpected_failure");
    }

    #[test]
    fn test_delete_removes_object_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.put("processed_reports/a.csv", b"a\n", "text/csv").unwrap();
        store.delete("processed_reports/a.csv").unwrap();
        assert!(!dir.path().join("processed_reports").join("a.csv").exists());
        store.delete("processed_reports/a.csv").unwrap();
    }

    #[test]
    fn test_presign_get_points_at_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        store.put("out.csv", b"a\n", "text/csv").unwrap();
        let url = store.presign_get("out.csv", Duration::from_secs(3600)).unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("out.csv?expires="));
    }
}
