use std::collections::{HashMap, HashSet};

use boom_core::models::{
    AssetKind, Comment, MediaRecord, MediaRecordUpdate, NewMediaRecord, RemoteAsset,
};
use boom_core::AppError;
use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use super::traits::MediaRecordStore;
use crate::db::transaction::TransactionGuard;

const VIDEO_COLUMNS: &str = "id, title, description, tags, video_remote_id, video_url, \
     thumbnail_remote_id, thumbnail_url, owner_id, like_count, view_count, created_at";

#[derive(Debug, FromRow)]
struct VideoRow {
    id: Uuid,
    title: String,
    description: String,
    tags: Vec<String>,
    video_remote_id: String,
    video_url: String,
    thumbnail_remote_id: String,
    thumbnail_url: String,
    owner_id: Uuid,
    like_count: i64,
    view_count: i64,
    created_at: DateTime<Utc>,
}

impl VideoRow {
    fn into_record(self, comments: Vec<Comment>) -> MediaRecord {
        MediaRecord {
            id: self.id,
            title: self.title,
            description: self.description,
            tags: self.tags,
            video_asset: RemoteAsset::new(self.video_remote_id, self.video_url, AssetKind::Video),
            thumbnail_asset: RemoteAsset::new(
                self.thumbnail_remote_id,
                self.thumbnail_url,
                AssetKind::Thumbnail,
            ),
            owner_id: self.owner_id,
            like_count: self.like_count,
            view_count: self.view_count,
            comments,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    video_id: Uuid,
    id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            author_id: row.author_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}

/// Comments of several videos in one query (avoids N+1 in `list`), oldest first.
async fn comments_for<'e, E>(
    executor: E,
    video_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Comment>>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    if video_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<CommentRow> = sqlx::query_as::<Postgres, CommentRow>(
        r#"
        SELECT video_id, id, author_id, text, created_at
        FROM video_comments
        WHERE video_id = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(video_ids)
    .fetch_all(executor)
    .await?;

    let mut by_video: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for row in rows {
        by_video.entry(row.video_id).or_default().push(row.into());
    }
    Ok(by_video)
}

/// Postgres-backed media record store
#[derive(Clone)]
pub struct PgMediaRecordStore {
    pool: PgPool,
}

impl PgMediaRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_comments(&self, row: VideoRow) -> Result<MediaRecord, AppError> {
        let mut comments = comments_for(&self.pool, &[row.id]).await?;
        let own = comments.remove(&row.id).unwrap_or_default();
        Ok(row.into_record(own))
    }
}

#[async_trait::async_trait]
impl MediaRecordStore for PgMediaRecordStore {
    #[tracing::instrument(skip(self, record), fields(db.table = "videos", db.operation = "insert", owner_id = %record.owner_id))]
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            INSERT INTO videos (
                id, title, description, tags,
                video_remote_id, video_url, thumbnail_remote_id, thumbnail_url,
                owner_id, like_count, view_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, 0, $10, $10)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.tags)
        .bind(&record.video_asset.remote_id)
        .bind(&record.video_asset.secure_url)
        .bind(&record.thumbnail_asset.remote_id)
        .bind(&record.thumbnail_asset.secure_url)
        .bind(record.owner_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, video_id = %id, "Failed to insert video record");
            AppError::from(e)
        })?;

        Ok(row.into_record(Vec::new()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_comments(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MediaRecord>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            SELECT {VIDEO_COLUMNS} FROM videos
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut comments = comments_for(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let own = comments.remove(&row.id).unwrap_or_default();
                row.into_record(own)
            })
            .collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn increment_likes(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        let likes: Option<i64> = sqlx::query_scalar(
            "UPDATE videos SET like_count = like_count + 1 WHERE id = $1 RETURNING like_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(likes)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn increment_views(&self, id: Uuid) -> Result<Option<i64>, AppError> {
        let views: Option<i64> = sqlx::query_scalar(
            "UPDATE videos SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(views)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn update_fields(
        &self,
        id: Uuid,
        update: MediaRecordUpdate,
    ) -> Result<Option<MediaRecord>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            UPDATE videos
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                tags = COALESCE($4, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.tags)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.with_comments(row).await?)),
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self, text), fields(db.table = "video_comments", db.operation = "insert", db.record_id = %id))]
    async fn add_comment(
        &self,
        id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> Result<Option<Comment>, AppError> {
        let row: Option<CommentRow> = sqlx::query_as::<Postgres, CommentRow>(
            r#"
            INSERT INTO video_comments (id, video_id, author_id, text, created_at)
            SELECT $1, v.id, $3, $4, NOW()
            FROM videos v
            WHERE v.id = $2
            RETURNING video_id, id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(id)
        .bind(author_id)
        .bind(&text)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let mut tx = TransactionGuard::begin_named(&self.pool, "delete_video").await?;

        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut comments = comments_for(&mut **tx, &[id]).await?;

        // Comments go with the video via ON DELETE CASCADE.
        sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;

        tx.commit().await?;

        let own = comments.remove(&id).unwrap_or_default();
        Ok(Some(row.into_record(own)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn referenced_remote_ids(&self) -> Result<HashSet<String>, AppError> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT video_remote_id FROM videos
            UNION
            SELECT thumbnail_remote_id FROM videos
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
