use crate::utils::upload::{validate_content_type, validate_file_extension};
use boom_core::models::{mime_types_for_extension, AssetKind, StagedAsset};
use boom_core::{AllowedTypes, PipelineError, UploadConfig};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Writes inbound assets to the staging directory.
///
/// Validation always happens before the filesystem is touched, and a failed write never
/// leaves a partial file behind.
#[derive(Debug, Clone)]
pub struct Stager {
    staging_dir: PathBuf,
    max_asset_size_bytes: u64,
    video_types: AllowedTypes,
    thumbnail_types: AllowedTypes,
}

impl Stager {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            staging_dir: config.staging_dir.clone(),
            max_asset_size_bytes: config.max_asset_size_bytes,
            video_types: config.video_types.clone(),
            thumbnail_types: config.thumbnail_types.clone(),
        }
    }

    fn allowed(&self, kind: AssetKind) -> &AllowedTypes {
        match kind {
            AssetKind::Video => &self.video_types,
            AssetKind::Thumbnail => &self.thumbnail_types,
        }
    }

    /// Check extension, MIME type and their agreement. Returns the lowercased extension.
    pub fn validate(
        &self,
        file_name: &str,
        declared_mime: &str,
        kind: AssetKind,
    ) -> Result<String, PipelineError> {
        let allowed = self.allowed(kind);
        let extension = validate_file_extension(file_name, &allowed.extensions, kind)?;
        let mime = validate_content_type(declared_mime, &allowed.content_types, kind)?;

        if !mime_types_for_extension(&extension).contains(&mime.as_str()) {
            return Err(PipelineError::validation(
                kind.field_name(),
                format!(
                    "{} extension .{} does not match content type {}",
                    kind, extension, mime
                ),
            ));
        }

        Ok(extension)
    }

    /// Copy `reader` into `{staging_dir}/{uuid}.{ext}`.
    #[tracing::instrument(skip(self, reader, declared_mime), fields(kind = %kind))]
    pub async fn stage<R>(
        &self,
        mut reader: R,
        file_name: &str,
        declared_mime: &str,
        kind: AssetKind,
    ) -> Result<StagedAsset, PipelineError>
    where
        R: AsyncRead + Unpin,
    {
        let extension = self.validate(file_name, declared_mime, kind)?;

        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|source| PipelineError::Io { kind, source })?;

        let local_path = self
            .staging_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));

        match self.copy_to(&mut reader, &local_path, kind).await {
            Ok(0) => {
                remove_quietly(&local_path).await;
                Err(PipelineError::validation(
                    kind.field_name(),
                    format!("{} file is empty", kind),
                ))
            }
            Ok(size_bytes) => {
                tracing::debug!(
                    path = %local_path.display(),
                    size_bytes,
                    "Asset staged"
                );
                Ok(StagedAsset {
                    local_path,
                    kind,
                    size_bytes,
                    declared_mime_type: crate::utils::upload::normalize_mime_type(declared_mime),
                    extension,
                })
            }
            Err(e) => {
                remove_quietly(&local_path).await;
                Err(e)
            }
        }
    }

    async fn copy_to<R>(
        &self,
        reader: &mut R,
        path: &Path,
        kind: AssetKind,
    ) -> Result<u64, PipelineError>
    where
        R: AsyncRead + Unpin,
    {
        let io_err = |source: io::Error| PipelineError::Io { kind, source };

        let mut file = File::create(path).await.map_err(io_err)?;
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            let n = reader.read(&mut buffer).await.map_err(io_err)?;
            if n == 0 {
                break;
            }
            written += n as u64;
            if written > self.max_asset_size_bytes {
                return Err(PipelineError::TooLarge {
                    kind,
                    max_bytes: self.max_asset_size_bytes,
                });
            }
            file.write_all(&buffer[..n]).await.map_err(io_err)?;
        }

        file.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

/// Remove a staged file. A file that is already gone is not an error.
pub(crate) async fn remove_local(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = remove_local(path).await {
        tracing::warn!(error = %e, path = %path.display(), "Failed to remove partial staged file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stager(dir: &TempDir, max: u64) -> Stager {
        let mut config = UploadConfig::with_staging_dir(dir.path());
        config.max_asset_size_bytes = max;
        Stager::new(&config)
    }

    fn files_in(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn stages_valid_video() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 1024);

        let staged = stager
            .stage(&b"video-bytes"[..], "clip.MP4", "video/mp4", AssetKind::Video)
            .await
            .unwrap();

        assert_eq!(staged.size_bytes, 11);
        assert_eq!(staged.extension, "mp4");
        assert!(staged.local_path.starts_with(dir.path()));
        assert_eq!(files_in(&dir), 1);

        remove_local(&staged.local_path).await.unwrap();
        assert_eq!(files_in(&dir), 0);
        // Removing twice is fine.
        remove_local(&staged.local_path).await.unwrap();
    }

    #[tokio::test]
    async fn disallowed_type_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 1024);

        let err = stager
            .stage(&b"x"[..], "clip.exe", "video/mp4", AssetKind::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));

        let err = stager
            .stage(&b"x"[..], "cover.png", "image/gif", AssetKind::Thumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
        assert_eq!(files_in(&dir), 0);
    }

    #[tokio::test]
    async fn mismatched_extension_and_mime_is_rejected() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 1024);

        let err = stager
            .stage(&b"x"[..], "cover.png", "image/jpeg", AssetKind::Thumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
    }

    #[tokio::test]
    async fn oversize_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 8);

        let err = stager
            .stage(&[7u8; 64][..], "clip.mp4", "video/mp4", AssetKind::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TooLarge { max_bytes: 8, .. }));
        assert_eq!(files_in(&dir), 0);
    }

    /// Yields one chunk, then fails like a dropped connection.
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<io::Result<()>> {
            if self.sent {
                return std::task::Poll::Ready(Err(io::Error::other("connection reset")));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn read_error_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 1024);

        let err = stager
            .stage(
                BrokenReader { sent: false },
                "clip.mp4",
                "video/mp4",
                AssetKind::Video,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Io {
                kind: AssetKind::Video,
                ..
            }
        ));
        assert_eq!(files_in(&dir), 0);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let stager = stager(&dir, 8);

        let err = stager
            .stage(&b""[..], "cover.jpg", "image/jpeg", AssetKind::Thumbnail)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Validation { .. }));
        assert_eq!(files_in(&dir), 0);
    }
}
