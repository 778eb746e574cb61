//! Configuration module
//!
//! Environment-driven configuration for the API binary and services,
//! covering server, database, storage backend, and token settings.

use std::env;
use std::str::FromStr;

use crate::constants::DEFAULT_TEMP_TOKEN_TTL_SECS;
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 2048;

/// File storage service configuration.
#[derive(Clone, Debug)]
pub struct StorageServiceConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    /// Secret behind session and temp token signatures.
    pub session_secret: String,
    /// Backend used for new uploads. Reads honor whatever backend a file was
    /// written with, provided it is configured in this process.
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub fs_storage_path: Option<String>,
    pub max_file_size_bytes: usize,
    pub temp_token_ttl_secs: i64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<StorageServiceConfig>);

impl Config {
    fn inner(&self) -> &StorageServiceConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .map(|s| StorageBackend::from_str(&s))
            .transpose()?
            .unwrap_or(StorageBackend::Database);

        let config = StorageServiceConfig {
            server_port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            cors_origins,
            environment,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            session_secret: env::var("SESSION_SECRET")
                .map_err(|_| anyhow::anyhow!("SESSION_SECRET must be set"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok().or(env::var("AWS_REGION").ok()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            fs_storage_path: env::var("FS_STORAGE_PATH").ok(),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            temp_token_ttl_secs: env::var("TEMP_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TEMP_TOKEN_TTL_SECS),
        };

        Ok(Config(Box::new(config)))
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn session_secret(&self) -> &str {
        &self.inner().session_secret
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn fs_storage_path(&self) -> Option<&str> {
        self.inner().fs_storage_path.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.inner().max_file_size_bytes
    }

    pub fn temp_token_ttl_secs(&self) -> i64 {
        self.inner().temp_token_ttl_secs
    }
}
