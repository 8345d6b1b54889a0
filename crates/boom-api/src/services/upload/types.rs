use bytes::Bytes;
use uuid::Uuid;

/// One file of the upload form, held in memory until it is staged
#[derive(Debug, Clone)]
pub struct IncomingAsset {
    pub file_name: String,
    /// Content type declared by the client
    pub content_type: String,
    pub data: Bytes,
}

/// A complete, authenticated upload request
#[derive(Debug, Clone)]
pub struct UploadSubmission {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub video: IncomingAsset,
    pub thumbnail: IncomingAsset,
}
