//! Remote id generation and validation, shared by every backend.

use crate::traits::{StorageError, StorageResult};
use uuid::Uuid;

/// `{folder}/{uuid}.{ext}` with surrounding slashes trimmed from the folder.
pub(crate) fn generate_remote_id(folder: &str, extension: &str) -> String {
    let folder = folder.trim_matches('/');
    let id = Uuid::new_v4();
    match (folder.is_empty(), extension.is_empty()) {
        (true, true) => id.to_string(),
        (true, false) => format!("{}.{}", id, extension),
        (false, true) => format!("{}/{}", folder, id),
        (false, false) => format!("{}/{}.{}", folder, id, extension),
    }
}

/// Reject ids that could escape the store root.
pub(crate) fn validate_remote_id(remote_id: &str) -> StorageResult<()> {
    if remote_id.is_empty() || remote_id.contains("..") || remote_id.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Remote id contains invalid characters: {}",
            remote_id
        )));
    }
    Ok(())
}

/// Listing prefix for a folder, e.g. `/boom-videos/` -> `boom-videos`.
pub(crate) fn folder_prefix(folder: &str) -> String {
    folder.trim_matches('/').to_string()
}
