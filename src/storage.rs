//! Object storage for avatars and post images.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub const AVATARS: &str = "avatars";
pub const POST_IMAGES: &str = "post-images";

const BUCKETS: &[&str] = &[AVATARS, POST_IMAGES];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    UnknownBucket(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`, replacing any existing object.
    async fn upload(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read an object back. `None` when it does not exist.
    async fn fetch(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// URL under which the object is publicly reachable.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Buckets are directories under a root; objects are plain files.
pub struct LocalObjectStore {
    root: PathBuf,
    public_base: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        if !BUCKETS.contains(&bucket) {
            return Err(StorageError::UnknownBucket(bucket.to_string()));
        }
        let relative = Path::new(path);
        let clean = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !clean {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(bucket, path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(bucket, path, size = bytes.len(), "Stored object");
        Ok(())
    }

    async fn fetch(&self, bucket: &str, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let target = self.resolve(bucket, path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base, bucket, path)
    }
}

/// `<prefix>/<user>/<millis>.<ext>`, or `<user>/<millis>.<ext>` without a prefix.
pub fn object_name(prefix: Option<&str>, user_id: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    match prefix {
        Some(prefix) => format!("{prefix}/{user_id}/{millis}.{extension}"),
        None => format!("{user_id}/{millis}.{extension}"),
    }
}
