use std::collections::HashSet;

use boom_core::models::{Comment, MediaRecord, MediaRecordUpdate, NewMediaRecord};
use boom_core::AppError;
use uuid::Uuid;

/// Persistence for committed media records
///
/// The upload coordinator only ever calls `create`; everything else backs the HTTP
/// handlers and the reconciliation sweep. Methods returning `Option` yield `None` when
/// the record does not exist.
#[async_trait::async_trait]
pub trait MediaRecordStore: Send + Sync {
    /// Insert a record in one atomic statement; counters start at zero.
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    /// Newest first
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MediaRecord>, AppError>;

    /// Atomically add one like and return the new count.
    async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, AppError>;

    /// Atomically add one view and return the new count.
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError>;

    /// Change title, description or tags. Asset references cannot be updated.
    async fn update_fields(
        &self,
        id: Uuid,
        update: MediaRecordUpdate,
    ) -> Result<Option<MediaRecord>, AppError>;

    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, AppError>;

    /// Remove a record and its comments, returning what was deleted.
    async fn delete(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    /// Every remote id referenced by any record
    async fn referenced_remote_ids(&self) -> Result<HashSet<String>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
