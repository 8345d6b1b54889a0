use crate::auth::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{read_upload_form, sanitize_filename};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use boom_core::models::MediaRecord;
use boom_core::PipelineError;
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/videos/upload",
    tag = "videos",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: video (file), thumbnail (file), title, description, tags (optional, repeated or comma-separated)"),
    responses(
        (status = 201, description = "Video uploaded", body = MediaRecord),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Upload failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user.user_id, operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: UserContext,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = read_upload_form(multipart, state.media.upload.max_asset_size_bytes).await?;
    let submission = form.into_submission(user.user_id)?;

    tracing::info!(
        video_file = %sanitize_filename(&submission.video.file_name),
        video_bytes = submission.video.data.len(),
        thumbnail_file = %sanitize_filename(&submission.thumbnail.file_name),
        thumbnail_bytes = submission.thumbnail.data.len(),
        "Upload received"
    );

    // The pipeline runs on its own task so a client disconnect cannot cancel it halfway
    // through a put or its compensation.
    let coordinator = state.media.coordinator.clone();
    let record = tokio::spawn(async move { coordinator.run(submission).await })
        .await
        .map_err(|e| PipelineError::Aborted(e.to_string()))??;

    Ok((StatusCode::CREATED, Json(record)))
}
