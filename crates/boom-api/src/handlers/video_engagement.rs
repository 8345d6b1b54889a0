use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use boom_core::models::{Comment, LikeResponse, NewCommentRequest, ViewResponse};
use boom_core::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Video not found".to_string())
}

#[utoipa::path(
    post,
    path = "/api/videos/like/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "New like count", body = LikeResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(video_id = %id, user_id = %user.user_id))]
pub async fn like_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let likes = state
        .db
        .records
        .increment_likes(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(LikeResponse { likes }))
}

#[utoipa::path(
    post,
    path = "/api/videos/view/{id}",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    responses(
        (status = 200, description = "New view count", body = ViewResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id))]
pub async fn view_video(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let views = state
        .db
        .records
        .increment_views(id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(ViewResponse { views }))
}

#[utoipa::path(
    post,
    path = "/api/videos/{id}/comments",
    tag = "videos",
    params(("id" = Uuid, Path, description = "Video ID")),
    request_body = NewCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Invalid comment", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, request), fields(video_id = %id, user_id = %user.user_id))]
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<NewCommentRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate().map_err(AppError::from)?;
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Comment must be 1-1000 characters".to_string()).into());
    }

    let comment = state
        .db
        .records
        .add_comment(id, user.user_id, text.to_string())
        .await?
        .ok_or_else(not_found)?;

    Ok((StatusCode::CREATED, Json(comment)))
}
