//! In-memory media record store with a failure switch.

use async_trait::async_trait;
use boom_core::models::{Comment, MediaRecord, MediaRecordUpdate, NewMediaRecord};
use boom_core::AppError;
use boom_db::MediaRecordStore;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryRecordStore {
    /// Insertion order, oldest first
    records: Mutex<Vec<MediaRecord>>,
    fail_create: AtomicBool,
    fail_ping: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_ping(&self) {
        self.fail_ping.store(true, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<MediaRecord> {
        self.records.lock().unwrap().clone()
    }

    fn with_record<T>(&self, id: Uuid, f: impl FnOnce(&mut MediaRecord) -> T) -> Option<T> {
        let mut records = self.records.lock().unwrap();
        records.iter_mut().find(|r| r.id == id).map(f)
    }
}

#[async_trait]
impl MediaRecordStore for InMemoryRecordStore {
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected commit failure".to_string()));
        }
        let record = MediaRecord {
            id: Uuid::new_v4(),
            title: record.title,
            description: record.description,
            tags: record.tags,
            video_asset: record.video_asset,
            thumbnail_asset: record.thumbnail_asset,
            owner_id: record.owner_id,
            like_count: 0,
            view_count: 0,
            comments: Vec::new(),
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        Ok(self.with_record(id, |r| r.clone()))
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MediaRecord>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        Ok(self.with_record(id, |r| {
            r.like_count += 1;
            r.like_count
        }))
    }

    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        Ok(self.with_record(id, |r| {
            r.view_count += 1;
            r.view_count
        }))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        update: MediaRecordUpdate,
    ) -> Result<Option<MediaRecord>, AppError> {
        Ok(self.with_record(id, |r| {
            if let Some(title) = update.title {
                r.title = title;
            }
            if let Some(description) = update.description {
                r.description = description;
            }
            if let Some(tags) = update.tags {
                r.tags = tags;
            }
            r.clone()
        }))
    }

    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, AppError> {
        Ok(self.with_record(id, |r| {
            let comment = Comment {
                id: Uuid::new_v4(),
                author_id,
                text,
                created_at: Utc::now(),
            };
            r.comments.push(comment.clone());
            comment
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .position(|r| r.id == id)
            .map(|index| records.remove(index)))
    }

    async fn referenced_remote_ids(&self) -> Result<HashSet<String>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .flat_map(|r| r.remote_assets().map(|a| a.remote_id.clone()))
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected ping failure".to_string()));
        }
        Ok(())
    }
}
