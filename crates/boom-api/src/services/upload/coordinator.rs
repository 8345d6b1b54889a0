//! Upload Coordinator
//!
//! Drives one upload through `Received -> Staged -> Uploaded -> Committed`. Every step that
//! succeeds is written to an `UploadJournal`; when a later step fails the journal is turned
//! into a compensation plan (remote deletes first, then local removals) and executed once.
//!
//! A record only exists if both of its remote assets do, and nothing staged locally
//! outlives the run.

use super::stager::{remove_local, Stager};
use super::types::{IncomingAsset, UploadSubmission};
use boom_core::models::{AssetKind, MediaRecord, NewMediaRecord, RemoteAsset, StagedAsset};
use boom_core::{PipelineError, PipelineStage, UploadConfig};
use boom_db::MediaRecordStore;
use boom_storage::{delete_with_retry, with_timeout, AssetStore, DeleteRetryPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Where a run currently is
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Received,
    Staged {
        video: StagedAsset,
        thumbnail: StagedAsset,
    },
    Uploaded {
        video: RemoteAsset,
        thumbnail: RemoteAsset,
    },
    Committed(Box<MediaRecord>),
    Failed(PipelineStage),
}

impl UploadState {
    fn name(&self) -> &'static str {
        match self {
            UploadState::Received => "received",
            UploadState::Staged { .. } => "staged",
            UploadState::Uploaded { .. } => "uploaded",
            UploadState::Committed(_) => "committed",
            UploadState::Failed(_) => "failed",
        }
    }
}

/// Artifacts created so far that the coordinator is still responsible for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadJournal {
    /// Staged files, in staging order
    pub staged: Vec<PathBuf>,
    /// Remote assets not yet owned by a record, in put order
    pub remote: Vec<RemoteAsset>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Failed(PipelineStage),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompensatingAction {
    DeleteRemote(RemoteAsset),
    RemoveLocal(PathBuf),
}

/// Cleanup to run once a run has ended.
///
/// On failure every remote asset the coordinator still owns is deleted, strictly before
/// any local file is removed. On success only the local files go; the remote assets
/// belong to the committed record.
pub fn compensation_plan(outcome: Outcome, journal: &UploadJournal) -> Vec<CompensatingAction> {
    let mut plan = Vec::with_capacity(journal.remote.len() + journal.staged.len());

    if let Outcome::Failed(_) = outcome {
        plan.extend(
            journal
                .remote
                .iter()
                .cloned()
                .map(CompensatingAction::DeleteRemote),
        );
    }

    plan.extend(
        journal
            .staged
            .iter()
            .cloned()
            .map(CompensatingAction::RemoveLocal),
    );
    plan
}

pub struct UploadCoordinator {
    config: UploadConfig,
    stager: Stager,
    store: Arc<dyn AssetStore>,
    records: Arc<dyn MediaRecordStore>,
    retry: DeleteRetryPolicy,
}

impl UploadCoordinator {
    pub fn new(
        config: UploadConfig,
        stager: Stager,
        store: Arc<dyn AssetStore>,
        records: Arc<dyn MediaRecordStore>,
    ) -> Self {
        let retry = DeleteRetryPolicy::from_upload_config(&config);
        Self {
            config,
            stager,
            store,
            records,
            retry,
        }
    }

    /// Run one upload to completion, including cleanup.
    ///
    /// Exactly one compensation plan runs per call. Cleanup failures are logged and never
    /// replace the error that caused them.
    #[tracing::instrument(skip(self, submission), fields(owner_id = %submission.owner_id))]
    pub async fn run(&self, submission: UploadSubmission) -> Result<MediaRecord, PipelineError> {
        let started = Instant::now();
        let mut journal = UploadJournal::default();
        let mut state = UploadState::Received;

        let result = self.advance(submission, &mut journal, &mut state).await;

        let outcome = match &result {
            Ok(record) => {
                tracing::info!(
                    video_id = %record.id,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Upload committed"
                );
                Outcome::Committed
            }
            Err(e) => {
                let stage = e.stage();
                tracing::warn!(
                    error = %e,
                    stage = %stage,
                    from_state = state.name(),
                    asset_kind = ?e.asset_kind(),
                    "Upload failed, compensating"
                );
                state = UploadState::Failed(stage);
                Outcome::Failed(stage)
            }
        };

        let plan = compensation_plan(outcome, &journal);
        self.execute(plan).await;

        tracing::debug!(state = state.name(), "Upload finished");
        result
    }

    async fn advance(
        &self,
        submission: UploadSubmission,
        journal: &mut UploadJournal,
        state: &mut UploadState,
    ) -> Result<MediaRecord, PipelineError> {
        let UploadSubmission {
            owner_id,
            title,
            description,
            tags,
            video,
            thumbnail,
        } = submission;

        // Received -> Staged. Both assets are checked before either is written, so a
        // disallowed video never creates a file even when the thumbnail is fine.
        self.stager
            .validate(&video.file_name, &video.content_type, AssetKind::Video)?;
        self.stager.validate(
            &thumbnail.file_name,
            &thumbnail.content_type,
            AssetKind::Thumbnail,
        )?;

        let staged_video = self.stage(&video, AssetKind::Video, journal).await?;
        let staged_thumbnail = self
            .stage(&thumbnail, AssetKind::Thumbnail, journal)
            .await?;
        drop(video);
        drop(thumbnail);
        *state = UploadState::Staged {
            video: staged_video.clone(),
            thumbnail: staged_thumbnail.clone(),
        };

        // Staged -> Uploaded. The two puts are independent and run concurrently.
        let (video_result, thumbnail_result) =
            tokio::join!(self.put(&staged_video), self.put(&staged_thumbnail));

        // Journal whichever succeeded before looking at failures.
        if let Ok(asset) = &video_result {
            journal.remote.push(asset.clone());
        }
        if let Ok(asset) = &thumbnail_result {
            journal.remote.push(asset.clone());
        }
        let video_asset = video_result?;
        let thumbnail_asset = thumbnail_result?;
        *state = UploadState::Uploaded {
            video: video_asset.clone(),
            thumbnail: thumbnail_asset.clone(),
        };

        // Uploaded -> Committed
        let record = self
            .records
            .create(NewMediaRecord {
                title,
                description,
                tags,
                video_asset,
                thumbnail_asset,
                owner_id,
            })
            .await
            .map_err(|e| PipelineError::Persistence {
                source: Box::new(e),
            })?;

        // The record owns the remote assets from here on.
        journal.remote.clear();
        *state = UploadState::Committed(Box::new(record.clone()));
        Ok(record)
    }

    async fn stage(
        &self,
        asset: &IncomingAsset,
        kind: AssetKind,
        journal: &mut UploadJournal,
    ) -> Result<StagedAsset, PipelineError> {
        let staged = self
            .stager
            .stage(&asset.data[..], &asset.file_name, &asset.content_type, kind)
            .await?;
        journal.staged.push(staged.local_path.clone());
        Ok(staged)
    }

    async fn put(&self, staged: &StagedAsset) -> Result<RemoteAsset, PipelineError> {
        let kind = staged.kind;
        let folder = self.config.folder_for(kind);

        with_timeout(
            self.config.remote_request_timeout,
            self.store.put(&staged.local_path, kind, folder),
        )
        .await
        .map_err(|e| PipelineError::Upload {
            kind,
            message: e.to_string(),
        })
    }

    async fn execute(&self, plan: Vec<CompensatingAction>) {
        for action in plan {
            match action {
                CompensatingAction::DeleteRemote(asset) => {
                    if let Err(e) =
                        delete_with_retry(self.store.as_ref(), &asset, &self.retry).await
                    {
                        // Left for the reconciliation sweep.
                        tracing::error!(
                            error = %e,
                            remote_id = %asset.remote_id,
                            kind = %asset.kind,
                            "Failed to delete remote asset during compensation"
                        );
                    }
                }
                CompensatingAction::RemoveLocal(path) => {
                    if let Err(e) = remove_local(&path).await {
                        tracing::error!(
                            error = %e,
                            path = %path.display(),
                            "Failed to remove staged file"
                        );
                    }
                }
            }
        }
    }
}
