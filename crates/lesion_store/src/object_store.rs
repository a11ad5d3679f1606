use std::{
    fs,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, info};
use crate::error::{Result, StoreError};

/// Blob storage addressed by `(bucket, key)`.
///
/// Implementations are handed to the I/O code explicitly; nothing in the
/// feature pipeline holds a client of its own.
pub trait ObjectStore: Send + Sync {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<()>;

    fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Create the bucket if needed; returns `true` when it was created
    fn ensure_bucket(&self, bucket: &str) -> Result<bool>;
}

/// Buckets as directories under a root, keys as relative paths.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        validate_key(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_path(bucket)?.join(key))
    }
}

/// Keys must stay inside their bucket: relative, no `..`, not empty.
fn validate_key(key: &str) -> Result<()> {
    let path = Path::new(key);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if key.is_empty() || escapes {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl ObjectStore for FsObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(bucket, key, size = bytes.len(), "object read");
                Ok(bytes)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        debug!(bucket, key, size = bytes.len(), "object written");
        Ok(())
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.object_path(bucket, key)?.is_file())
    }

    fn ensure_bucket(&self, bucket: &str) -> Result<bool> {
        let path = self.bucket_path(bucket)?;
        if path.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&path)?;
        info!(bucket, "created bucket");
        Ok(true)
    }
}
