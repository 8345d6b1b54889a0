pub mod media_lifecycle;
pub mod upload;
