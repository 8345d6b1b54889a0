use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use boom_core::models::{AssetKind, RemoteAsset};
use boom_core::{ReconcileConfig, UploadConfig};
use boom_db::MediaRecordStore;
use boom_storage::{delete_with_retry, with_timeout, AssetStore, DeleteRetryPolicy, StoredObject};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Remote objects found under the asset folders
    pub scanned: usize,
    /// Of those, objects some record points at
    pub referenced: usize,
    /// Unreferenced and older than the grace period
    pub orphaned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Periodically deletes remote objects left behind by uploads whose compensation could not
/// run to completion (lost acknowledgements, crashes between put and commit).
///
/// Objects younger than the grace period are skipped so in-flight uploads are never touched.
#[derive(Clone)]
pub struct ReconciliationService {
    records: Arc<dyn MediaRecordStore>,
    store: Arc<dyn AssetStore>,
    folders: Vec<(String, AssetKind)>,
    config: ReconcileConfig,
    retry: DeleteRetryPolicy,
}

impl ReconciliationService {
    pub fn new(
        records: Arc<dyn MediaRecordStore>,
        store: Arc<dyn AssetStore>,
        upload: &UploadConfig,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            records,
            store,
            folders: vec![
                (upload.video_folder.clone(), AssetKind::Video),
                (upload.thumbnail_folder.clone(), AssetKind::Thumbnail),
            ],
            config,
            retry: DeleteRetryPolicy::from_upload_config(upload),
        }
    }

    /// Start the background sweep. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            // tokio panics on a zero period.
            let mut sweep_interval = interval(self.config.interval.max(Duration::from_secs(1)));
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so startup is not slowed down.
            sweep_interval.tick().await;

            loop {
                sweep_interval.tick().await;

                tracing::info!("Starting scheduled reconciliation of remote assets");

                match self.sweep_once().await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        referenced = report.referenced,
                        orphaned = report.orphaned,
                        deleted = report.deleted,
                        failed = report.failed,
                        "Reconciliation completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Reconciliation sweep failed"),
                }
            }
        })
    }

    /// List both asset folders, subtract everything referenced, and delete what is left
    /// once it is older than the grace period.
    #[tracing::instrument(skip(self), fields(reconcile.operation = "sweep"))]
    pub async fn sweep_once(&self) -> Result<SweepReport, anyhow::Error> {
        let mut report = SweepReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates: Vec<(StoredObject, AssetKind)> = Vec::new();

        // Listing happens before loading references: a record committed in between makes
        // an object look referenced, never orphaned.
        for (folder, kind) in &self.folders {
            let objects =
                with_timeout(self.retry.request_timeout, self.store.list(folder)).await?;
            for object in objects {
                // The thumbnail folder usually sits inside the video folder.
                if seen.insert(object.remote_id.clone()) {
                    candidates.push((object, *kind));
                }
            }
        }
        report.scanned = candidates.len();

        let referenced = self.records.referenced_remote_ids().await?;

        let grace = chrono::Duration::from_std(self.config.grace_period)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let cutoff = Utc::now() - grace;

        for (object, kind) in candidates {
            if referenced.contains(&object.remote_id) {
                report.referenced += 1;
                continue;
            }
            if object.last_modified > cutoff {
                continue;
            }
            report.orphaned += 1;

            // A folder listing cannot tell thumbnails from videos when one folder nests the
            // other, so the kind comes from the extension when it is recognisable.
            let kind = kind_from_extension(&object.remote_id).unwrap_or(kind);
            let asset = RemoteAsset::new(object.remote_id.clone(), String::new(), kind);

            match delete_with_retry(self.store.as_ref(), &asset, &self.retry).await {
                Ok(()) => {
                    tracing::info!(
                        remote_id = %object.remote_id,
                        last_modified = %object.last_modified,
                        size_bytes = object.size_bytes,
                        "Deleted orphaned remote asset"
                    );
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        remote_id = %object.remote_id,
                        "Failed to delete orphaned remote asset"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}

fn kind_from_extension(remote_id: &str) -> Option<AssetKind> {
    let ext = remote_id.rsplit_once('.')?.1;
    let mime = boom_core::models::mime_types_for_extension(ext).first()?;
    if mime.starts_with("image/") {
        Some(AssetKind::Thumbnail)
    } else {
        Some(AssetKind::Video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use boom_core::models::{Comment, MediaRecord, MediaRecordUpdate, NewMediaRecord};
    use boom_core::{AppError, StorageBackend};
    use boom_storage::{StorageError, StorageResult};
    use std::path::Path;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ListingStore {
        objects: Vec<(String, StoredObject)>,
        deleted: Mutex<Vec<String>>,
        fail_delete: Option<String>,
    }

    #[async_trait]
    impl AssetStore for ListingStore {
        async fn put(&self, _: &Path, _: AssetKind, _: &str) -> StorageResult<RemoteAsset> {
            unreachable!("sweep never puts")
        }

        async fn delete(&self, remote_id: &str, _: AssetKind) -> StorageResult<()> {
            if self.fail_delete.as_deref() == Some(remote_id) {
                return Err(StorageError::DeleteFailed(remote_id.to_string()));
            }
            self.deleted.lock().unwrap().push(remote_id.to_string());
            Ok(())
        }

        async fn list(&self, folder: &str) -> StorageResult<Vec<StoredObject>> {
            Ok(self
                .objects
                .iter()
                .filter(|(_, o)| o.remote_id.starts_with(folder))
                .map(|(_, o)| o.clone())
                .collect())
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::Memory
        }
    }

    struct ReferencedOnly(HashSet<String>);

    #[async_trait]
    impl MediaRecordStore for ReferencedOnly {
        async fn create(&self, _: NewMediaRecord) -> Result<MediaRecord, AppError> {
            unimplemented!()
        }
        async fn get(&self, _: Uuid) -> Result<Option<MediaRecord>, AppError> {
            unimplemented!()
        }
        async fn list(&self, _: i64, _: i64) -> Result<Vec<MediaRecord>, AppError> {
            unimplemented!()
        }
        async fn increment_likes(&self, _: Uuid) -> Result<Option<i64>, AppError> {
            unimplemented!()
        }
        async fn increment_views(&self, _: Uuid) -> Result<Option<i64>, AppError> {
            unimplemented!()
        }
        async fn update_fields(
            &self,
            _: Uuid,
            _: MediaRecordUpdate,
        ) -> Result<Option<MediaRecord>, AppError> {
            unimplemented!()
        }
        async fn add_comment(&self, _: Uuid, _: Uuid, _: String) -> Result<Option<Comment>, AppError> {
            unimplemented!()
        }
        async fn delete(&self, _: Uuid) -> Result<Option<MediaRecord>, AppError> {
            unimplemented!()
        }
        async fn referenced_remote_ids(&self) -> Result<HashSet<String>, AppError> {
            Ok(self.0.clone())
        }
        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn object(remote_id: &str, age: chrono::Duration) -> (String, StoredObject) {
        (
            remote_id.to_string(),
            StoredObject {
                remote_id: remote_id.to_string(),
                last_modified: Utc::now() - age,
                size_bytes: 10,
            },
        )
    }

    fn service(store: Arc<ListingStore>, referenced: &[&str]) -> ReconciliationService {
        let mut upload = UploadConfig::with_staging_dir(std::env::temp_dir());
        upload.delete_retry_delay = Duration::from_millis(1);
        upload.delete_max_attempts = 2;
        ReconciliationService::new(
            Arc::new(ReferencedOnly(
                referenced.iter().map(|s| s.to_string()).collect(),
            )),
            store,
            &upload,
            ReconcileConfig::default(),
        )
    }

    #[tokio::test]
    async fn deletes_only_old_unreferenced_objects() {
        let old = chrono::Duration::hours(2);
        let store = Arc::new(ListingStore {
            objects: vec![
                object("boom-videos/kept.mp4", old),
                object("boom-videos/thumbnails/kept.png", old),
                object("boom-videos/orphan.mp4", old),
                object("boom-videos/thumbnails/orphan.png", old),
                object("boom-videos/in-flight.mp4", chrono::Duration::minutes(1)),
            ],
            deleted: Mutex::new(vec![]),
            fail_delete: None,
        });

        let report = service(
            store.clone(),
            &["boom-videos/kept.mp4", "boom-videos/thumbnails/kept.png"],
        )
        .sweep_once()
        .await
        .unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 5,
                referenced: 2,
                orphaned: 2,
                deleted: 2,
                failed: 0,
            }
        );
        let mut deleted = store.deleted.lock().unwrap().clone();
        deleted.sort();
        assert_eq!(
            deleted,
            vec![
                "boom-videos/orphan.mp4".to_string(),
                "boom-videos/thumbnails/orphan.png".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn failed_deletes_are_counted_not_fatal() {
        let old = chrono::Duration::hours(2);
        let store = Arc::new(ListingStore {
            objects: vec![
                object("boom-videos/a.mp4", old),
                object("boom-videos/b.mp4", old),
            ],
            deleted: Mutex::new(vec![]),
            fail_delete: Some("boom-videos/a.mp4".to_string()),
        });

        let report = service(store.clone(), &[]).sweep_once().await.unwrap();

        assert_eq!(report.orphaned, 2);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn kind_is_inferred_from_extension() {
        assert_eq!(kind_from_extension("x/y.png"), Some(AssetKind::Thumbnail));
        assert_eq!(kind_from_extension("x/y.mkv"), Some(AssetKind::Video));
        assert_eq!(kind_from_extension("x/y"), None);
    }
}
