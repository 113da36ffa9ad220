use std::env;
use std::time::Duration;

/// Which object store implementation backs the drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Any S3-compatible endpoint (AWS, MinIO, GCS interoperability).
    S3,
    /// Process-local map, lost on restart.
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "memory" | "mem" => StorageBackend::Memory,
            _ => StorageBackend::S3,
        }
    }
}

/// Runtime configuration, read from the environment with fallback defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Cloud project identifier (default: empty)
    pub project_id: String,

    /// HTTP listen port (default: 8080)
    pub port: u16,

    /// Default bucket holding the drive (default: "bucket-drive")
    pub bucket: String,

    pub storage_backend: StorageBackend,

    /// Custom S3 endpoint, e.g. `https://storage.googleapis.com`
    pub storage_endpoint: Option<String>,
    pub storage_region: String,
    pub storage_access_key: Option<String>,
    pub storage_secret_key: Option<String>,

    /// Profile database (default: local SQLite file)
    pub database_url: String,

    /// Upper bound for a single drive or profile operation (default: 10 s)
    pub operation_timeout: Duration,

    /// Request body limit for uploads in bytes (default: 32 MB)
    pub max_upload_size: usize,

    /// Allowed CORS origins (comma separated, empty means any)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            port: 8080,
            bucket: "bucket-drive".to_string(),
            storage_backend: StorageBackend::S3,
            storage_endpoint: None,
            storage_region: "us-east-1".to_string(),
            storage_access_key: None,
            storage_secret_key: None,
            database_url: "sqlite://profiles.db?mode=rwc".to_string(),
            operation_timeout: Duration::from_secs(10),
            max_upload_size: 32 * 1024 * 1024, // 32 MB
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            project_id: env_or("PROJECT_ID", default.project_id),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            bucket: env_or("BUCKET_NAME", default.bucket),

            storage_backend: env::var("STORAGE_BACKEND")
                .map(|v| StorageBackend::parse(&v))
                .unwrap_or(default.storage_backend),

            storage_endpoint: non_empty_env("STORAGE_ENDPOINT"),
            storage_region: env_or("STORAGE_REGION", default.storage_region),
            storage_access_key: non_empty_env("STORAGE_ACCESS_KEY"),
            storage_secret_key: non_empty_env("STORAGE_SECRET_KEY"),

            database_url: env_or("DATABASE_URL", default.database_url),

            operation_timeout: env::var("OPERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.operation_timeout),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Config for tests and local runs: in-memory storage and database.
    pub fn development() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }
}

/// Empty values count as unset, like a missing variable.
fn env_or(key: &str, default: String) -> String {
    non_empty_env(key).unwrap_or(default)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
