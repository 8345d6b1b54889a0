//! Boom Storage Library
//!
//! The Remote Asset Store: a trait for putting and deleting uploaded assets in a durable
//! object store, and an implementation over `object_store` that talks to S3 (or any
//! S3-compatible endpoint), the local filesystem, or memory.
//!
//! # Remote id format
//!
//! Every asset is stored under `{folder}/{uuid}.{ext}`; the video and thumbnail folders
//! are configured separately. Ids must not contain `..` or a leading `/`.

pub mod factory;
pub(crate) mod keys;
pub mod object;
pub mod retry;
pub mod traits;

pub use boom_core::StorageBackend;
pub use factory::create_asset_store;
pub use object::ObjectAssetStore;
pub use retry::{delete_with_retry, with_timeout, DeleteRetryPolicy};
pub use traits::{AssetStore, StorageError, StorageResult, StoredObject};
