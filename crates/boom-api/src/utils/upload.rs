//! Common utilities for the upload handler and the stager

use crate::services::upload::{IncomingAsset, UploadSubmission};
use axum::extract::Multipart;
use boom_core::models::{normalize_tags, AssetKind};
use boom_core::{AppError, PipelineError};
use bytes::BytesMut;
use uuid::Uuid;

/// Normalize MIME type by stripping parameters (e.g. "image/png; q=1" -> "image/png").
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}

/// Validate content type against allowlist. Compares the normalized MIME type only, so
/// parameters cannot be used to sneak past the list.
pub fn validate_content_type(
    content_type: &str,
    allowed_types: &[String],
    kind: AssetKind,
) -> Result<String, PipelineError> {
    let normalized = normalize_mime_type(content_type);
    if !allowed_types.iter().any(|ct| normalized == ct.to_lowercase()) {
        return Err(PipelineError::validation(
            kind.field_name(),
            format!(
                "Invalid {} content type. Allowed types: {}",
                kind,
                allowed_types.join(", ")
            ),
        ));
    }
    Ok(normalized)
}

/// Validate file extension; returns it lowercased.
pub fn validate_file_extension(
    file_name: &str,
    allowed_extensions: &[String],
    kind: AssetKind,
) -> Result<String, PipelineError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if extension.is_empty() || !allowed_extensions.contains(&extension) {
        return Err(PipelineError::validation(
            kind.field_name(),
            format!(
                "Invalid {} file extension. Allowed extensions: {}",
                kind,
                allowed_extensions.join(", ")
            ),
        ));
    }

    Ok(extension)
}

/// Keep only the final path component and safe characters; for logs.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .replace("..", "");

    name.chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Tags arrive as repeated fields, comma-separated values, or both.
pub fn parse_tags(raw: &[String]) -> Vec<String> {
    normalize_tags(raw.iter().flat_map(|value| value.split(',')))
}

/// Fields of the upload form as they came off the wire
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub video: Option<IncomingAsset>,
    pub thumbnail: Option<IncomingAsset>,
}

impl UploadForm {
    /// Check required fields and attach the owner.
    pub fn into_submission(self, owner_id: Uuid) -> Result<UploadSubmission, AppError> {
        let (video, thumbnail) = match (self.video, self.thumbnail) {
            (Some(video), Some(thumbnail)) => (video, thumbnail),
            _ => {
                return Err(AppError::Validation(
                    "Video and thumbnail files are required".to_string(),
                ))
            }
        };

        let title = self.title.map(|t| t.trim().to_string()).unwrap_or_default();
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        if title.is_empty() || description.is_empty() {
            return Err(AppError::Validation(
                "Title and description are required".to_string(),
            ));
        }
        if title.chars().count() > 200 {
            return Err(AppError::Validation(
                "Title must be 1-200 characters".to_string(),
            ));
        }

        Ok(UploadSubmission {
            owner_id,
            title,
            description,
            tags: parse_tags(&self.tags),
            video,
            thumbnail,
        })
    }
}

/// Read the multipart upload form into memory.
///
/// Each file is capped at `max_asset_bytes` while reading, so an oversized part is rejected
/// without buffering all of it.
pub async fn read_upload_form(
    mut multipart: Multipart,
    max_asset_bytes: u64,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "video" | "thumbnail" => {
                let kind = if field_name == "video" {
                    AssetKind::Video
                } else {
                    AssetKind::Thumbnail
                };
                let slot = match kind {
                    AssetKind::Video => &form.video,
                    AssetKind::Thumbnail => &form.thumbnail,
                };
                if slot.is_some() {
                    return Err(AppError::InvalidInput(format!(
                        "Multiple {} files are not allowed",
                        kind
                    )));
                }

                let file_name = field.file_name().map(|s| s.to_string()).unwrap_or_default();
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let mut data = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read {} data: {}", kind, e))
                })? {
                    if (data.len() + chunk.len()) as u64 > max_asset_bytes {
                        return Err(AppError::from(PipelineError::TooLarge {
                            kind,
                            max_bytes: max_asset_bytes,
                        }));
                    }
                    data.extend_from_slice(&chunk);
                }

                let asset = IncomingAsset {
                    file_name,
                    content_type,
                    data: data.freeze(),
                };
                match kind {
                    AssetKind::Video => form.video = Some(asset),
                    AssetKind::Thumbnail => form.thumbnail = Some(asset),
                }
            }
            "title" | "description" | "tags" => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidInput(format!("Failed to read {}: {}", field_name, e))
                })?;
                match field_name.as_str() {
                    "title" => form.title = Some(value),
                    "description" => form.description = Some(value),
                    _ => form.tags.push(value),
                }
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}
