use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use boom_core::models::{MediaRecord, MediaRecordUpdate};
use boom_core::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[utoipa::path(
    patch,
    path = "/api/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body = MediaRecordUpdate,
    responses(
        (status = 200, description = "Video updated", body = MediaRecord),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, update), fields(video_id = %id, user_id = %user.user_id, operation = "update_video"))]
pub async fn update_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<MediaRecordUpdate>,
) -> Result<impl IntoResponse, HttpAppError> {
    update.validate().map_err(AppError::from)?;

    let record = state
        .media
        .lifecycle
        .update(id, user.user_id, update)
        .await?;

    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Deleted video", body = MediaRecord),
        (status = 403, description = "Caller is not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(video_id = %id, user_id = %user.user_id, operation = "delete_video"))]
pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.media.lifecycle.delete(id, user.user_id).await?;
    Ok(Json(record))
}
