use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// This enum defines the available physical media for file content.
/// It's defined in core because it's used in configuration and database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "storage_backend", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Chunk rows in the metadata database
    Database,
    /// Single file per object on local disk
    Filesystem,
    /// S3 or an S3-compatible object store
    S3,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "db" => Ok(StorageBackend::Database),
            "filesystem" | "fs" | "local" => Ok(StorageBackend::Filesystem),
            "s3" => Ok(StorageBackend::S3),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Database => write!(f, "database"),
            StorageBackend::Filesystem => write!(f, "filesystem"),
            StorageBackend::S3 => write!(f, "s3"),
        }
    }
}
