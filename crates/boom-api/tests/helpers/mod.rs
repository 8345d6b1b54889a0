//! Test helpers: build AppState and router around in-memory fakes.
//!
//! Run from workspace root: `cargo test -p boom-api`. No database or object store is
//! needed; the fakes record every call so tests can assert ordering.

#![allow(dead_code)]

pub mod auth;
pub mod records;
pub mod store;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use boom_api::setup::routes::build_router;
use boom_api::state::{AppState, SecurityConfig};
use boom_core::UploadConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub use records::InMemoryRecordStore;
pub use store::{FakeAssetStore, StoreCall};

/// Test application: server, fakes, and the staging directory it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<FakeAssetStore>,
    pub records: Arc<InMemoryRecordStore>,
    pub staging: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files currently left in the staging directory
    pub fn staged_files(&self) -> usize {
        count_files(self.staging.path())
    }
}

pub fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

/// Upload limits tuned for fast tests: short remote timeout, near-instant retries.
pub fn test_upload_config(staging: &Path) -> UploadConfig {
    let mut upload = UploadConfig::with_staging_dir(staging);
    upload.remote_request_timeout = Duration::from_millis(300);
    upload.delete_max_attempts = 2;
    upload.delete_retry_delay = Duration::from_millis(1);
    upload
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {})
}

/// Same as [`setup_test_app`] with a hook to adjust the upload configuration.
pub fn setup_test_app_with(configure: impl FnOnce(&mut UploadConfig)) -> TestApp {
    let staging = TempDir::new().expect("Failed to create staging dir");
    let mut upload = test_upload_config(staging.path());
    configure(&mut upload);

    let store = Arc::new(FakeAssetStore::new(staging.path()));
    let records = Arc::new(InMemoryRecordStore::default());

    let state = AppState::new(
        records.clone(),
        store.clone(),
        upload.clone(),
        SecurityConfig {
            jwt_secret: auth::TEST_JWT_SECRET.to_string(),
            cors_origins: vec!["*".to_string()],
        },
    );

    let max_body = (upload.max_asset_size_bytes as usize) * 2 + 1024 * 1024;
    let app = build_router(state, max_body, 64).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        records,
        staging,
    }
}

pub fn file_part(bytes: &[u8], file_name: &str, mime: &str) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_type(mime.to_string())
}

/// A valid upload form: mp4 video, png thumbnail, title and description.
pub fn valid_upload_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("title", "Skate session")
        .add_text("description", "Sunday at the park")
        .add_text("tags", "Skate, fun")
        .add_part("video", file_part(&[7u8; 4096], "session.mp4", "video/mp4"))
        .add_part("thumbnail", file_part(&[9u8; 512], "session.png", "image/png"))
}

/// Upload the default form as `user` and return the committed record.
pub async fn upload_video(app: &TestApp, user: &auth::TestUser) -> boom_core::models::MediaRecord {
    let response = app
        .client()
        .post("/api/videos/upload")
        .add_header("Authorization", user.bearer())
        .multipart(valid_upload_form())
        .await;
    assert_eq!(response.status_code(), 201, "upload should succeed");
    response.json()
}
