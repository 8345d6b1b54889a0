//! Configuration module
//!
//! Configuration is read once from the environment (and `.env` via dotenvy) at startup.
//! The upload pipeline receives its own `UploadConfig` explicitly so it never consults
//! ambient process state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::AssetKind;
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 5000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: u64 = 150;
const VIDEO_FOLDER: &str = "boom-videos";
const THUMBNAIL_FOLDER: &str = "boom-videos/thumbnails";
const VIDEO_CHUNK_SIZE_BYTES: usize = 6_000_000;
const REMOTE_REQUEST_TIMEOUT_SECS: u64 = 120;
const REMOTE_DELETE_MAX_ATTEMPTS: u32 = 3;
const REMOTE_DELETE_RETRY_DELAY_MS: u64 = 500;
const RECONCILE_INTERVAL_SECS: u64 = 3600;
const RECONCILE_GRACE_PERIOD_SECS: u64 = 3600;
/// Slack on top of the remote timeouts for staging and the record commit.
const RECONCILE_GRACE_MARGIN_SECS: u64 = 300;

const VIDEO_EXTENSIONS: &str = "mp4,mov,avi,wmv,flv,mkv";
const VIDEO_CONTENT_TYPES: &str =
    "video/mp4,video/quicktime,video/x-msvideo,video/x-ms-wmv,video/x-flv,video/x-matroska";
const THUMBNAIL_EXTENSIONS: &str = "jpg,jpeg,png";
const THUMBNAIL_CONTENT_TYPES: &str = "image/jpeg,image/jpg,image/png";

/// Settings shared by every part of the service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
    /// Emit logs as JSON lines (`LOG_FORMAT=json`)
    pub log_json: bool,
}

/// Allowed file types for one asset kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedTypes {
    pub extensions: Vec<String>,
    pub content_types: Vec<String>,
}

/// Everything the upload coordinator needs, passed in explicitly.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Transient directory for staged files
    pub staging_dir: PathBuf,
    /// Maximum size of a single asset
    pub max_asset_size_bytes: u64,
    pub video_folder: String,
    pub thumbnail_folder: String,
    /// Part size for chunked video puts
    pub video_chunk_size_bytes: usize,
    /// Upper bound for a single remote put or delete
    pub remote_request_timeout: Duration,
    pub delete_max_attempts: u32,
    pub delete_retry_delay: Duration,
    pub video_types: AllowedTypes,
    pub thumbnail_types: AllowedTypes,
}

impl UploadConfig {
    pub fn folder_for(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Video => &self.video_folder,
            AssetKind::Thumbnail => &self.thumbnail_folder,
        }
    }

    pub fn allowed_types(&self, kind: AssetKind) -> &AllowedTypes {
        match kind {
            AssetKind::Video => &self.video_types,
            AssetKind::Thumbnail => &self.thumbnail_types,
        }
    }

    /// Defaults rooted at `staging_dir`; handy for tests and local tooling.
    pub fn with_staging_dir(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            max_asset_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            video_folder: VIDEO_FOLDER.to_string(),
            thumbnail_folder: THUMBNAIL_FOLDER.to_string(),
            video_chunk_size_bytes: VIDEO_CHUNK_SIZE_BYTES,
            remote_request_timeout: Duration::from_secs(REMOTE_REQUEST_TIMEOUT_SECS),
            delete_max_attempts: REMOTE_DELETE_MAX_ATTEMPTS,
            delete_retry_delay: Duration::from_millis(REMOTE_DELETE_RETRY_DELAY_MS),
            video_types: AllowedTypes {
                extensions: split_list(VIDEO_EXTENSIONS),
                content_types: split_list(VIDEO_CONTENT_TYPES),
            },
            thumbnail_types: AllowedTypes {
                extensions: split_list(THUMBNAIL_EXTENSIONS),
                content_types: split_list(THUMBNAIL_CONTENT_TYPES),
            },
        }
    }
}

/// Orphaned remote object sweep
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    pub enabled: bool,
    pub interval: Duration,
    /// Objects younger than this are never considered orphans
    pub grace_period: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(RECONCILE_INTERVAL_SECS),
            grace_period: Duration::from_secs(RECONCILE_GRACE_PERIOD_SECS),
        }
    }
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub s3_public_base_url: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload: UploadConfig,
    pub reconcile: ReconcileConfig,
}

/// Cheap-to-clone handle on the loaded configuration
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.0.validate()
    }

    pub fn inner(&self) -> &ServiceConfig {
        &self.0
    }

    pub fn server_port(&self) -> u16 {
        self.0.base.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.0.base.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.0.base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.0.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.0.base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.0.base.db_timeout_seconds
    }

    pub fn environment(&self) -> &str {
        &self.0.base.environment
    }

    pub fn log_json(&self) -> bool {
        self.0.base.log_json
    }

    pub fn is_production(&self) -> bool {
        let env = self.0.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.0.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.0.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.0.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.0.s3_endpoint.as_deref()
    }

    pub fn s3_public_base_url(&self) -> Option<&str> {
        self.0.s3_public_base_url.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.0.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.0.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.0.local_storage_base_url.as_deref()
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.0.upload
    }

    pub fn reconcile(&self) -> &ReconcileConfig {
        &self.0.reconcile
    }

    /// Largest request body accepted: both assets plus form fields.
    pub fn max_request_body_bytes(&self) -> usize {
        (self.0.upload.max_asset_size_bytes as usize)
            .saturating_mul(2)
            .saturating_add(1024 * 1024)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_list(key: &str, default: &str) -> Vec<String> {
    split_list(&env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "s3".to_string())
            .parse::<StorageBackend>()?;

        let staging_dir = env::var("STAGING_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("boom-uploads"));

        let upload = UploadConfig {
            staging_dir,
            max_asset_size_bytes: env_parse("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB) * 1024 * 1024,
            video_folder: env::var("VIDEO_FOLDER").unwrap_or_else(|_| VIDEO_FOLDER.to_string()),
            thumbnail_folder: env::var("THUMBNAIL_FOLDER")
                .unwrap_or_else(|_| THUMBNAIL_FOLDER.to_string()),
            video_chunk_size_bytes: env_parse("VIDEO_CHUNK_SIZE_BYTES", VIDEO_CHUNK_SIZE_BYTES),
            remote_request_timeout: Duration::from_secs(env_parse(
                "REMOTE_REQUEST_TIMEOUT_SECS",
                REMOTE_REQUEST_TIMEOUT_SECS,
            )),
            delete_max_attempts: env_parse("REMOTE_DELETE_MAX_ATTEMPTS", REMOTE_DELETE_MAX_ATTEMPTS),
            delete_retry_delay: Duration::from_millis(env_parse(
                "REMOTE_DELETE_RETRY_DELAY_MS",
                REMOTE_DELETE_RETRY_DELAY_MS,
            )),
            video_types: AllowedTypes {
                extensions: env_list("VIDEO_ALLOWED_EXTENSIONS", VIDEO_EXTENSIONS),
                content_types: env_list("VIDEO_ALLOWED_CONTENT_TYPES", VIDEO_CONTENT_TYPES),
            },
            thumbnail_types: AllowedTypes {
                extensions: env_list("THUMBNAIL_ALLOWED_EXTENSIONS", THUMBNAIL_EXTENSIONS),
                content_types: env_list(
                    "THUMBNAIL_ALLOWED_CONTENT_TYPES",
                    THUMBNAIL_CONTENT_TYPES,
                ),
            },
        };

        let reconcile = ReconcileConfig {
            enabled: env::var("RECONCILE_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            interval: Duration::from_secs(env_parse(
                "RECONCILE_INTERVAL_SECS",
                RECONCILE_INTERVAL_SECS,
            )),
            grace_period: Duration::from_secs(env_parse(
                "RECONCILE_GRACE_PERIOD_SECS",
                RECONCILE_GRACE_PERIOD_SECS,
            )),
        };

        Ok(ServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_base_url: env::var("S3_PUBLIC_BASE_URL").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            upload,
            reconcile,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        let upload = &self.upload;
        if upload.video_folder.trim().is_empty() || upload.thumbnail_folder.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "VIDEO_FOLDER and THUMBNAIL_FOLDER must not be empty"
            ));
        }
        // S3 multipart parts other than the last must be at least 5 MiB.
        if upload.video_chunk_size_bytes < 5 * 1024 * 1024 {
            return Err(anyhow::anyhow!(
                "VIDEO_CHUNK_SIZE_BYTES must be at least 5242880"
            ));
        }
        if upload.delete_max_attempts == 0 {
            return Err(anyhow::anyhow!(
                "REMOTE_DELETE_MAX_ATTEMPTS must be at least 1"
            ));
        }
        if self.reconcile.interval.is_zero() {
            return Err(anyhow::anyhow!(
                "RECONCILE_INTERVAL_SECS must be at least 1"
            ));
        }
        // An in-flight upload holds remote objects with no record for up to two puts
        // plus the commit; the sweep must not treat those as orphans.
        let min_grace = upload.remote_request_timeout * 2
            + Duration::from_secs(RECONCILE_GRACE_MARGIN_SECS);
        if self.reconcile.grace_period <= min_grace {
            return Err(anyhow::anyhow!(
                "RECONCILE_GRACE_PERIOD_SECS must exceed {}s (twice REMOTE_REQUEST_TIMEOUT_SECS plus {}s)",
                min_grace.as_secs(),
                RECONCILE_GRACE_MARGIN_SECS
            ));
        }
        for kind in [AssetKind::Video, AssetKind::Thumbnail] {
            let types = upload.allowed_types(kind);
            if types.extensions.is_empty() || types.content_types.is_empty() {
                return Err(anyhow::anyhow!(
                    "Allowed extensions and content types for {} must not be empty",
                    kind
                ));
            }
        }

        Ok(())
    }
}
