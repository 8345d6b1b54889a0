//! Fault-injecting in-memory asset store with a call journal.

use async_trait::async_trait;
use boom_core::models::{AssetKind, RemoteAsset};
use boom_core::StorageBackend;
use boom_storage::{AssetStore, StorageError, StorageResult, StoredObject};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { kind: AssetKind, remote_id: String },
    PutFailed { kind: AssetKind },
    /// `staged_files` is how many files were still in the staging directory when the
    /// delete ran.
    Delete { remote_id: String, staged_files: usize },
}

pub struct FakeAssetStore {
    staging_dir: PathBuf,
    calls: Mutex<Vec<StoreCall>>,
    objects: Mutex<HashMap<String, StoredObject>>,
    failing_puts: Mutex<HashSet<AssetKind>>,
    hanging_puts: Mutex<HashSet<AssetKind>>,
    fail_deletes: AtomicBool,
}

impl FakeAssetStore {
    pub fn new(staging_dir: &Path) -> Self {
        Self {
            staging_dir: staging_dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
            failing_puts: Mutex::new(HashSet::new()),
            hanging_puts: Mutex::new(HashSet::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn fail_put(&self, kind: AssetKind) {
        self.failing_puts.lock().unwrap().insert(kind);
    }

    /// Puts of this kind never complete.
    pub fn hang_put(&self, kind: AssetKind) {
        self.hanging_puts.lock().unwrap().insert(kind);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::Delete { .. }))
            .collect()
    }

    pub fn object_ids(&self) -> HashSet<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AssetStore for FakeAssetStore {
    async fn put(
        &self,
        local_path: &Path,
        kind: AssetKind,
        folder: &str,
    ) -> StorageResult<RemoteAsset> {
        // The staged file must exist for the whole put.
        let size_bytes = tokio::fs::metadata(local_path).await?.len();

        let hang = self.hanging_puts.lock().unwrap().contains(&kind);
        if hang {
            std::future::pending::<()>().await;
        }
        let fail = self.failing_puts.lock().unwrap().contains(&kind);
        if fail {
            self.record(StoreCall::PutFailed { kind });
            return Err(StorageError::UploadFailed(format!("injected {} failure", kind)));
        }

        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let remote_id = format!(
            "{}/{}.{}",
            folder.trim_matches('/'),
            uuid::Uuid::new_v4(),
            extension
        );
        self.objects.lock().unwrap().insert(
            remote_id.clone(),
            StoredObject {
                remote_id: remote_id.clone(),
                last_modified: chrono::Utc::now(),
                size_bytes,
            },
        );
        self.record(StoreCall::Put {
            kind,
            remote_id: remote_id.clone(),
        });

        Ok(RemoteAsset::new(
            remote_id.clone(),
            format!("https://cdn.test/{}", remote_id),
            kind,
        ))
    }

    async fn delete(&self, remote_id: &str, _kind: AssetKind) -> StorageResult<()> {
        self.record(StoreCall::Delete {
            remote_id: remote_id.to_string(),
            staged_files: super::count_files(&self.staging_dir),
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(remote_id.to_string()));
        }
        self.objects.lock().unwrap().remove(remote_id);
        Ok(())
    }

    async fn list(&self, folder: &str) -> StorageResult<Vec<StoredObject>> {
        let prefix = format!("{}/", folder.trim_matches('/'));
        Ok(self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.remote_id.starts_with(&prefix))
            .cloned()
            .collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
