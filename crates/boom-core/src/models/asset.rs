use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use utoipa::ToSchema;

/// The two binary assets carried by an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Video,
    Thumbnail,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Thumbnail => "thumbnail",
        }
    }

    /// Resource type used by the remote store ("video" or "image").
    pub fn resource_type(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Thumbnail => "image",
        }
    }

    /// Multipart field name that carries this asset.
    pub fn field_name(&self) -> &'static str {
        self.as_str()
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// An inbound asset written to transient local storage.
///
/// Owned by the upload coordinator for the lifetime of one request and removed
/// before the request completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub local_path: PathBuf,
    pub kind: AssetKind,
    pub size_bytes: u64,
    pub declared_mime_type: String,
    /// Lowercased extension without the dot, e.g. "mp4".
    pub extension: String,
}

/// A durable copy of an asset in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct RemoteAsset {
    #[serde(rename = "id")]
    pub remote_id: String,
    #[serde(rename = "url")]
    pub secure_url: String,
    pub kind: AssetKind,
}

impl RemoteAsset {
    pub fn new(remote_id: impl Into<String>, secure_url: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            remote_id: remote_id.into(),
            secure_url: secure_url.into(),
            kind,
        }
    }
}

/// Expected MIME types for a file extension.
///
/// Used to check that the declared content type and the filename agree.
pub fn mime_types_for_extension(extension: &str) -> &'static [&'static str] {
    match extension {
        "mp4" => &["video/mp4"],
        "mov" => &["video/quicktime"],
        "avi" => &["video/x-msvideo", "video/avi", "video/msvideo"],
        "wmv" => &["video/x-ms-wmv"],
        "flv" => &["video/x-flv"],
        "mkv" => &["video/x-matroska"],
        "jpg" | "jpeg" => &["image/jpeg", "image/jpg"],
        "png" => &["image/png"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_asset_serializes_as_id_and_url() {
        let asset = RemoteAsset::new("boom-videos/a.mp4", "https://cdn/a.mp4", AssetKind::Video);
        let json = serde_json::to_value(&asset).unwrap();
        assert_eq!(json["id"], "boom-videos/a.mp4");
        assert_eq!(json["url"], "https://cdn/a.mp4");
        assert_eq!(json["kind"], "video");
    }

    #[test]
    fn extension_mime_table() {
        assert!(mime_types_for_extension("png").contains(&"image/png"));
        assert!(mime_types_for_extension("jpg").contains(&"image/jpeg"));
        assert!(mime_types_for_extension("mov").contains(&"video/quicktime"));
        assert!(mime_types_for_extension("exe").is_empty());
    }

    #[test]
    fn thumbnail_is_an_image_resource() {
        assert_eq!(AssetKind::Thumbnail.resource_type(), "image");
        assert_eq!(AssetKind::Video.resource_type(), "video");
    }
}
