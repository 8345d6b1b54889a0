//! Application state and sub-state extractors.
//!
//! AppState is split into sub-states so handlers can extract only what they need via
//! Axum's `FromRef`.

use crate::services::media_lifecycle::MediaLifecycleService;
use crate::services::upload::{Stager, UploadCoordinator};
use boom_core::UploadConfig;
use boom_db::MediaRecordStore;
use boom_storage::{AssetStore, DeleteRetryPolicy};
use std::sync::Arc;

/// Media record persistence
#[derive(Clone)]
pub struct DbState {
    pub records: Arc<dyn MediaRecordStore>,
}

/// Remote store, upload pipeline and record lifecycle
#[derive(Clone)]
pub struct MediaState {
    pub store: Arc<dyn AssetStore>,
    pub coordinator: Arc<UploadCoordinator>,
    pub lifecycle: MediaLifecycleService,
    pub upload: UploadConfig,
}

/// Token verification and CORS
#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub media: MediaState,
    pub security: SecurityConfig,
}

impl AppState {
    /// Wire the upload pipeline and lifecycle service around the given stores.
    pub fn new(
        records: Arc<dyn MediaRecordStore>,
        store: Arc<dyn AssetStore>,
        upload: UploadConfig,
        security: SecurityConfig,
    ) -> Arc<Self> {
        let coordinator = Arc::new(UploadCoordinator::new(
            upload.clone(),
            Stager::new(&upload),
            store.clone(),
            records.clone(),
        ));
        let lifecycle = MediaLifecycleService::new(
            records.clone(),
            store.clone(),
            DeleteRetryPolicy::from_upload_config(&upload),
        );

        Arc::new(Self {
            db: DbState { records },
            media: MediaState {
                store,
                coordinator,
                lifecycle,
                upload,
            },
            security,
        })
    }
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for SecurityConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.security.clone()
    }
}
