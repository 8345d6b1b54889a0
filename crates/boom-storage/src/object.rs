use crate::keys::{folder_prefix, generate_remote_id, validate_remote_id};
use crate::traits::{AssetStore, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use boom_core::models::{AssetKind, RemoteAsset};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload, WriteMultipart};
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

#[cfg(feature = "storage-s3")]
use object_store::aws::AmazonS3Builder;
#[cfg(feature = "storage-local")]
use object_store::local::LocalFileSystem;
#[cfg(feature = "storage-local")]
use std::path::PathBuf;

/// Read size when streaming a staged video into the multipart writer.
const READ_BUFFER_SIZE: usize = 256 * 1024;
/// Parts allowed in flight before the writer applies backpressure.
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// Remote asset store backed by any `object_store` implementation
#[derive(Clone)]
pub struct ObjectAssetStore {
    store: Arc<dyn ObjectStore>,
    backend: StorageBackend,
    /// Bucket name or base directory, for logs
    location: String,
    public_base_url: String,
    chunk_size: usize,
}

impl ObjectAssetStore {
    /// Wrap an existing object store.
    ///
    /// `public_base_url` is joined with the remote id to form the asset URL;
    /// `chunk_size` is the part size used for chunked video puts.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        backend: StorageBackend,
        location: impl Into<String>,
        public_base_url: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            store,
            backend,
            location: location.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// S3 or an S3-compatible provider
    ///
    /// Credentials come from the standard AWS environment variables.
    /// * `endpoint_url` - custom endpoint (e.g. "http://localhost:9000" for MinIO)
    /// * `public_base_url` - overrides the URL prefix handed to clients (CDN, custom domain)
    #[cfg(feature = "storage-s3")]
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
        chunk_size: usize,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        // Path-style URLs for custom endpoints, virtual-hosted style for AWS.
        let base_url = public_base_url.unwrap_or_else(|| match endpoint_url {
            Some(ref endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        });

        Ok(Self::new(
            Arc::new(store),
            StorageBackend::S3,
            bucket,
            base_url,
            chunk_size,
        ))
    }

    /// Local filesystem rooted at `base_path`, served from `base_url`
    #[cfg(feature = "storage-local")]
    pub async fn local(
        base_path: impl Into<PathBuf>,
        base_url: String,
        chunk_size: usize,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        tokio::fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&base_path)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(
            Arc::new(store),
            StorageBackend::Local,
            base_path.display().to_string(),
            base_url,
            chunk_size,
        ))
    }

    /// Process-local store; contents vanish with the process.
    pub fn memory(base_url: impl Into<String>, chunk_size: usize) -> Self {
        Self::new(
            Arc::new(InMemory::new()),
            StorageBackend::Memory,
            "memory",
            base_url,
            chunk_size,
        )
    }

    fn public_url(&self, remote_id: &str) -> String {
        format!("{}/{}", self.public_base_url, remote_id)
    }

    /// Single-request put, used for thumbnails.
    async fn put_single(&self, location: &ObjectPath, local_path: &Path) -> StorageResult<u64> {
        let data = tokio::fs::read(local_path).await?;
        let size = data.len() as u64;

        self.store
            .put(location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(size)
    }

    /// Multipart put in `chunk_size` parts, used for videos.
    ///
    /// The staged file is streamed, never loaded whole. A failed transfer aborts the
    /// multipart upload so no partial object is left behind.
    async fn put_chunked(&self, location: &ObjectPath, local_path: &Path) -> StorageResult<u64> {
        let mut file = File::open(local_path).await?;

        let upload = self
            .store
            .put_multipart(location)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, self.chunk_size);

        match copy_into_writer(&mut file, &mut writer).await {
            Ok(size) => {
                writer
                    .finish()
                    .await
                    .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
                Ok(size)
            }
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        key = %location,
                        "Failed to abort multipart upload"
                    );
                }
                Err(e)
            }
        }
    }
}

async fn copy_into_writer(file: &mut File, writer: &mut WriteMultipart) -> StorageResult<u64> {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }

        writer
            .wait_for_capacity(MAX_IN_FLIGHT_PARTS)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        writer.write(&buffer[..bytes_read]);
        total += bytes_read as u64;
    }

    Ok(total)
}

fn to_stored_object(meta: ObjectMeta) -> StoredObject {
    StoredObject {
        remote_id: meta.location.to_string(),
        last_modified: meta.last_modified,
        size_bytes: meta.size as u64,
    }
}

#[async_trait]
impl AssetStore for ObjectAssetStore {
    async fn put(
        &self,
        local_path: &Path,
        kind: AssetKind,
        folder: &str,
    ) -> StorageResult<RemoteAsset> {
        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let remote_id = generate_remote_id(folder, &extension);
        validate_remote_id(&remote_id)?;
        let location = ObjectPath::from(remote_id.clone());

        let start = std::time::Instant::now();

        let result = match kind {
            AssetKind::Video => self.put_chunked(&location, local_path).await,
            AssetKind::Thumbnail => self.put_single(&location, local_path).await,
        };

        let size = result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                location = %self.location,
                key = %remote_id,
                kind = %kind,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Asset upload failed"
            );
            e
        })?;

        tracing::info!(
            backend = %self.backend,
            location = %self.location,
            key = %remote_id,
            kind = %kind,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset upload successful"
        );

        let url = self.public_url(&remote_id);
        Ok(RemoteAsset::new(remote_id, url, kind))
    }

    async fn delete(&self, remote_id: &str, kind: AssetKind) -> StorageResult<()> {
        validate_remote_id(remote_id)?;
        let location = ObjectPath::from(remote_id);

        let start = std::time::Instant::now();

        match self.store.delete(&location).await {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(key = %remote_id, kind = %kind, "Asset already absent");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = %self.backend,
                    key = %remote_id,
                    kind = %kind,
                    resource_type = kind.resource_type(),
                    "Asset delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            backend = %self.backend,
            key = %remote_id,
            kind = %kind,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset delete successful"
        );

        Ok(())
    }

    async fn list(&self, folder: &str) -> StorageResult<Vec<StoredObject>> {
        let prefix = ObjectPath::from(folder_prefix(folder));

        let objects: Vec<ObjectMeta> = self
            .store
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        Ok(objects.into_iter().map(to_stored_object).collect())
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
