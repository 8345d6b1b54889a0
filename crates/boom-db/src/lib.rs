//! Boom Database Library
//!
//! Media Record Store: the trait the upload pipeline commits through, and its Postgres
//! implementation.

pub mod db;

pub use db::media::{MediaRecordStore, PgMediaRecordStore};
pub use db::transaction::TransactionGuard;

/// Migrations shipped with the workspace, run at startup.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
