use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use boom_core::models::MediaRecord;
use boom_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const MAX_LIMIT: i64 = 100;

#[derive(Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = MediaRecord),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "get_video"))]
pub async fn get_video(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state
        .db
        .records
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    params(
        ListQuery
    ),
    responses(
        (status = 200, description = "Videos, newest first", body = Vec<MediaRecord>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "list_videos"))]
pub async fn list_videos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let limit = query.limit.clamp(1, MAX_LIMIT);
    let offset = query.offset.max(0);

    let records = state.db.records.list(limit, offset).await?;

    Ok(Json(records))
}
