pub mod asset;
pub mod media;

pub use asset::{mime_types_for_extension, AssetKind, RemoteAsset, StagedAsset};
pub use media::{
    normalize_tags, Comment, LikeResponse, MediaRecord, MediaRecordUpdate, NewCommentRequest,
    NewMediaRecord, ViewResponse,
};
