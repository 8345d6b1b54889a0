use crate::{AssetStore, ObjectAssetStore, StorageBackend, StorageError, StorageResult};
use boom_core::Config;
use std::sync::Arc;

/// Create the remote asset store selected by configuration
pub async fn create_asset_store(config: &Config) -> StorageResult<Arc<dyn AssetStore>> {
    let chunk_size = config.upload().video_chunk_size_bytes;

    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);
            let public_base_url = config.s3_public_base_url().map(String::from);

            let store = ObjectAssetStore::s3(bucket, region, endpoint, public_base_url, chunk_size)?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let store = ObjectAssetStore::local(base_path, base_url, chunk_size).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),

        StorageBackend::Memory => {
            tracing::warn!("Using in-memory asset store; uploaded assets are lost on restart");
            let base_url = config
                .local_storage_base_url()
                .unwrap_or("http://localhost/media")
                .to_string();
            Ok(Arc::new(ObjectAssetStore::memory(base_url, chunk_size)))
        }
    }
}
