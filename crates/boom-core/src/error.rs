//! Error types module
//!
//! `AppError` is the error every HTTP-facing operation returns. Upload pipeline failures are
//! described by `PipelineError`, which records the failed transition and the asset kind so
//! the coordinator can pick a compensation plan; it converts into `AppError` at the edge.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::AssetKind;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable issues
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Transition of the upload state machine that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Received -> Staged (validation and local staging)
    Stage,
    /// Staged -> Uploaded (remote puts)
    Upload,
    /// Uploaded -> Committed (record persistence)
    Commit,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PipelineStage::Stage => f.write_str("stage"),
            PipelineStage::Upload => f.write_str("upload"),
            PipelineStage::Commit => f.write_str("commit"),
        }
    }
}

/// Failures of the media upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{kind} exceeds the maximum upload size of {max_bytes} bytes")]
    TooLarge { kind: AssetKind, max_bytes: u64 },

    #[error("failed to stage {kind} locally: {source}")]
    Io {
        kind: AssetKind,
        #[source]
        source: io::Error,
    },

    #[error("remote upload of {kind} failed: {message}")]
    Upload { kind: AssetKind, message: String },

    #[error("failed to persist media record: {source}")]
    Persistence {
        #[source]
        source: Box<AppError>,
    },

    #[error("upload task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Transition the error belongs to.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Validation { .. }
            | PipelineError::TooLarge { .. }
            | PipelineError::Io { .. } => PipelineStage::Stage,
            PipelineError::Upload { .. } => PipelineStage::Upload,
            PipelineError::Persistence { .. } | PipelineError::Aborted(_) => PipelineStage::Commit,
        }
    }

    /// Asset the error is about, if any.
    pub fn asset_kind(&self) -> Option<AssetKind> {
        match self {
            PipelineError::TooLarge { kind, .. }
            | PipelineError::Io { kind, .. }
            | PipelineError::Upload { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upload pipeline failed at {}: {source}", .source.stage())]
    Pipeline {
        #[source]
        source: PipelineError,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation error: {}", err))
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        if let PipelineError::TooLarge { .. } = err {
            return AppError::PayloadTooLarge(err.to_string());
        }
        match err {
            PipelineError::Validation { message, .. } => AppError::Validation(message),
            other => AppError::Pipeline { source: other },
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check the submitted fields and files"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Sign in again to obtain a fresh token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::Pipeline { .. } => (
            500,
            "UPLOAD_FAILED",
            true,
            Some("Retry the upload"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Validation(_) => "Validation",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Pipeline { .. } => "Pipeline",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Server error".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::Pipeline { .. } => "Failed to upload video".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn validation_pipeline_error_becomes_bad_request() {
        let err: AppError =
            PipelineError::validation("video", "Only video files are allowed").into();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "Only video files are allowed");
        assert!(!err.is_sensitive());
    }

    #[test]
    fn upload_pipeline_error_hides_details() {
        let err: AppError = PipelineError::Upload {
            kind: AssetKind::Thumbnail,
            message: "connection reset".to_string(),
        }
        .into();
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "UPLOAD_FAILED");
        assert_eq!(err.client_message(), "Failed to upload video");
        assert!(err.is_sensitive());
        assert!(err.detailed_message().contains("connection reset"));
    }

    #[test]
    fn too_large_maps_to_413() {
        let err: AppError = PipelineError::TooLarge {
            kind: AssetKind::Video,
            max_bytes: 10,
        }
        .into();
        assert_eq!(err.http_status_code(), 413);
    }

    #[test]
    fn pipeline_error_reports_stage_and_kind() {
        let io = PipelineError::Io {
            kind: AssetKind::Video,
            source: io::Error::other("disk full"),
        };
        assert_eq!(io.stage(), PipelineStage::Stage);
        assert_eq!(io.asset_kind(), Some(AssetKind::Video));

        let persist = PipelineError::Persistence {
            source: Box::new(AppError::Internal("boom".to_string())),
        };
        assert_eq!(persist.stage(), PipelineStage::Commit);
        assert_eq!(persist.asset_kind(), None);
    }
}
