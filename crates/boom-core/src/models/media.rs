use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::asset::RemoteAsset;

/// A committed video together with its thumbnail, metadata and counters.
///
/// Asset references are fixed at creation; only title, description and tags
/// can change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub video_asset: RemoteAsset,
    pub thumbnail_asset: RemoteAsset,
    pub owner_id: Uuid,
    pub like_count: i64,
    pub view_count: i64,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl MediaRecord {
    /// Remote ids of both assets, video first.
    pub fn remote_assets(&self) -> [&RemoteAsset; 2] {
        [&self.video_asset, &self.thumbnail_asset]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to commit a record once both assets are remote.
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub video_asset: RemoteAsset,
    pub thumbnail_asset: RemoteAsset,
    pub owner_id: Uuid,
}

/// Editable fields of a record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MediaRecordUpdate {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
}

impl MediaRecordUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.tags.is_none()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ViewResponse {
    pub views: i64,
}

/// Normalize a tag list: trim, lowercase, drop empties and duplicates while keeping order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
