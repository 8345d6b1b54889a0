//! Boom API Library
//!
//! HTTP handlers, authentication, the upload pipeline, and application setup.

mod api_doc;
mod handlers;
mod utils;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::upload::{Stager, UploadCoordinator};
