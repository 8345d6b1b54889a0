//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything convertible into
//! `AppError` becomes an `HttpAppError` with `?` and renders consistently (status, body,
//! logging).

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use boom_core::{AppError, ErrorMetadata, LogLevel, PipelineError};
use boom_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: IntoResponse and AppError both live outside this crate)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError(app)
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on
/// deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

/// Set once at startup from `Config::is_production`; details are hidden in production.
static PRODUCTION_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_production_mode(is_production: bool) {
    PRODUCTION_MODE.store(is_production, Ordering::Relaxed);
}

fn error_body(app_error: &AppError, is_production: bool) -> ErrorResponse {
    // Details never leave the process in production or for sensitive errors.
    let show_details = !is_production && !app_error.is_sensitive();

    ErrorResponse {
        message: app_error.client_message(),
        details: show_details.then(|| app_error.detailed_message()),
        error_type: show_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = error_body(app_error, PRODUCTION_MODE.load(Ordering::Relaxed));
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boom_core::models::AssetKind;

    #[test]
    fn upload_failure_renders_generic_500() {
        let err = HttpAppError::from(PipelineError::Upload {
            kind: AssetKind::Thumbnail,
            message: "connection reset by peer".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn storage_errors_map_by_variant() {
        let err = HttpAppError::from(StorageError::InvalidKey("../x".to_string()));
        assert!(matches!(err.0, AppError::InvalidInput(_)));

        let err = HttpAppError::from(StorageError::DeleteFailed("x".to_string()));
        assert!(matches!(err.0, AppError::Storage(_)));
    }

    #[test]
    fn production_hides_details() {
        let err = AppError::NotFound("Video not found".to_string());

        let body = error_body(&err, false);
        assert!(body.details.is_some());
        assert_eq!(body.error_type.as_deref(), Some("NotFound"));

        let body = error_body(&err, true);
        assert_eq!(body.message, "Video not found");
        assert!(body.details.is_none());
        assert!(body.error_type.is_none());
    }
}
