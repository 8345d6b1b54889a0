//! Boom core library
//!
//! Shared configuration, error taxonomy and domain models used by every other crate
//! in the workspace.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

pub use config::{AllowedTypes, BaseConfig, Config, ReconcileConfig, ServiceConfig, UploadConfig};
pub use error::{AppError, ErrorMetadata, LogLevel, PipelineError, PipelineStage};
pub use storage_types::StorageBackend;
