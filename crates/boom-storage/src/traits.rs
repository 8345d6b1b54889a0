//! Remote asset store trait
//!
//! Every backend implements `AssetStore`; the upload coordinator and the reconciliation
//! sweep only ever see `Arc<dyn AssetStore>`.

use async_trait::async_trait;
use boom_core::models::{AssetKind, RemoteAsset};
use boom_core::StorageBackend;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid remote id: {0}")]
    InvalidKey(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An object found while listing a folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub remote_id: String,
    pub last_modified: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Durable, URL-addressable storage for uploaded assets.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Copy a staged local file into `folder`.
    ///
    /// Videos are streamed as a multipart upload in fixed-size chunks; thumbnails are sent
    /// in a single request. Not idempotent: calling twice stores two objects.
    async fn put(&self, local_path: &Path, kind: AssetKind, folder: &str)
        -> StorageResult<RemoteAsset>;

    /// Delete an asset. Deleting an object that no longer exists succeeds.
    async fn delete(&self, remote_id: &str, kind: AssetKind) -> StorageResult<()>;

    /// List every object stored under `folder` (recursively).
    async fn list(&self, folder: &str) -> StorageResult<Vec<StoredObject>>;

    fn backend_type(&self) -> StorageBackend;
}
