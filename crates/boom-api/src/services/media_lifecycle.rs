//! Edits and deletion of committed records, with ownership checks

use boom_core::models::{normalize_tags, MediaRecord, MediaRecordUpdate};
use boom_core::AppError;
use boom_db::MediaRecordStore;
use boom_storage::{delete_with_retry, AssetStore, DeleteRetryPolicy};
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct MediaLifecycleService {
    records: Arc<dyn MediaRecordStore>,
    store: Arc<dyn AssetStore>,
    retry: DeleteRetryPolicy,
}

impl MediaLifecycleService {
    pub fn new(
        records: Arc<dyn MediaRecordStore>,
        store: Arc<dyn AssetStore>,
        retry: DeleteRetryPolicy,
    ) -> Self {
        Self {
            records,
            store,
            retry,
        }
    }

    async fn owned(&self, id: Uuid, requester: Uuid) -> Result<MediaRecord, AppError> {
        let record = self
            .records
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if record.owner_id != requester {
            return Err(AppError::Forbidden(
                "Only the owner can modify this video".to_string(),
            ));
        }
        Ok(record)
    }

    /// Change title, description or tags of a record the requester owns.
    #[tracing::instrument(skip(self, update), fields(video_id = %id, user_id = %requester))]
    pub async fn update(
        &self,
        id: Uuid,
        requester: Uuid,
        mut update: MediaRecordUpdate,
    ) -> Result<MediaRecord, AppError> {
        if update.is_empty() {
            return Err(AppError::InvalidInput(
                "Nothing to update: provide title, description or tags".to_string(),
            ));
        }
        update.title = update.title.map(|t| t.trim().to_string());
        update.description = update.description.map(|d| d.trim().to_string());
        if update.title.as_deref() == Some("") || update.description.as_deref() == Some("") {
            return Err(AppError::Validation(
                "Title and description cannot be blank".to_string(),
            ));
        }
        update.tags = update.tags.map(normalize_tags);

        self.owned(id, requester).await?;

        self.records
            .update_fields(id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    /// Delete a record the requester owns, then its remote assets.
    ///
    /// Remote deletes are best effort: the record is already gone, so a failure only
    /// leaves an orphan for the reconciliation sweep.
    #[tracing::instrument(skip(self), fields(video_id = %id, user_id = %requester))]
    pub async fn delete(&self, id: Uuid, requester: Uuid) -> Result<MediaRecord, AppError> {
        self.owned(id, requester).await?;

        let record = self
            .records
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        let store = self.store.as_ref();
        let results = join_all(
            record
                .remote_assets()
                .into_iter()
                .map(|asset| async move { (asset, delete_with_retry(store, asset, &self.retry).await) }),
        )
        .await;

        for (asset, result) in results {
            if let Err(e) = result {
                tracing::error!(
                    error = %e,
                    remote_id = %asset.remote_id,
                    kind = %asset.kind,
                    "Failed to delete remote asset of deleted video"
                );
            }
        }

        tracing::info!(video_id = %record.id, "Video deleted");
        Ok(record)
    }
}
