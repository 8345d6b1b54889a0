//! Database repositories
//
// Media records, their comments and counters
pub mod media;
//
// Transaction utilities
pub mod transaction;

pub use media::{MediaRecordStore, PgMediaRecordStore};
