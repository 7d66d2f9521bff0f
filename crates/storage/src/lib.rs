use directories::ProjectDirs;
use std::path::PathBuf;

pub mod object_store;
pub mod repository;
pub mod template_url;

pub use object_store::{
    DirectoryObjectStore, MemoryObjectStore, ObjectStore, StoredObject, UploadError,
};
pub use repository::{JsonFileRepository, MemoryRepository, UserRepository, RECORDS_SCHEMA_VERSION};
pub use template_url::{
    resolve_template_url, ResolvedTemplate, TemplateCandidates, TemplateUrlError,
};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("repository lock poisoned")]
    Poisoned,
}

/// Per-user data directory of the local installation.
pub fn default_data_dir() -> Result<PathBuf, StorageError> {
    let dirs = ProjectDirs::from("dev", "qrdeck", "qrdeck").ok_or(StorageError::NoDataDirectory)?;
    Ok(dirs.data_local_dir().to_path_buf())
}
