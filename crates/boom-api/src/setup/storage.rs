//! Storage setup and initialization

use anyhow::Result;
use boom_core::Config;
use boom_storage::{create_asset_store, AssetStore};
use std::sync::Arc;

/// Build the remote asset store selected by `STORAGE_BACKEND`
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn AssetStore>> {
    tracing::info!("Initializing remote asset store...");
    let store = create_asset_store(config).await?;
    tracing::info!(
        backend = ?store.backend_type(),
        video_folder = %config.upload().video_folder,
        thumbnail_folder = %config.upload().thumbnail_folder,
        "Remote asset store initialized"
    );
    Ok(store)
}
