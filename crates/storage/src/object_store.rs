//! Upload boundary for template files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("refusing to upload an empty file")]
    EmptyPayload,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// Stores bytes and hands back a durable public URL.
pub trait ObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError>;
}

fn object_key(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect::<String>()
        .replace("..", "_");
    let name = name.trim_start_matches('.');
    let name = if name.is_empty() { "upload" } else { name };
    format!("{}-{name}", Uuid::new_v4())
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{key}", base.trim_end_matches('/'))
}

/// Writes objects as files under a root directory served at `public_base`.
#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
    public_base: String,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self { root: root.into(), public_base: public_base.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        fs::create_dir_all(&self.root)?;

        let key = object_key(filename);
        fs::write(self.root.join(&key), bytes)?;
        info!(%key, content_type, bytes = bytes.len(), "object uploaded");
        Ok(public_url(&self.public_base, &key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct MemoryObjectStore {
    public_base: String,
    objects: RwLock<Vec<StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self { public_base: public_base.into(), objects: RwLock::new(Vec::new()) }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.read().map(|objects| objects.clone()).unwrap_or_default()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
        content_type: &str,
    ) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        let key = object_key(filename);
        let mut objects = self
            .objects
            .write()
            .map_err(|_| UploadError::Rejected("store unavailable".to_owned()))?;
        objects.push(StoredObject {
            key: key.clone(),
            content_type: content_type.to_owned(),
            bytes: bytes.to_vec(),
        });
        Ok(public_url(&self.public_base, &key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_store_writes_file_and_returns_public_url() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let store = DirectoryObjectStore::new(temp.path(), "https://cdn.qrdeck.example/templates/");

        let url = store
            .upload(b"%PDF-1.4", "menu card.pdf", "application/pdf")
            .expect("upload should succeed");

        let key =
            url.strip_prefix("https://cdn.qrdeck.example/templates/").expect("public base prefix");
        assert!(key.ends_with("-menu_card.pdf"));
        assert_eq!(fs::read(temp.path().join(key)).expect("stored file"), b"%PDF-1.4");
    }

    #[test]
    fn empty_payload_is_rejected() {
        let store = MemoryObjectStore::new("https://cdn.qrdeck.example");
        let result = store.upload(&[], "a.pdf", "application/pdf");
        assert!(matches!(result, Err(UploadError::EmptyPayload)));
        assert!(store.objects().is_empty());
    }

    #[test]
    fn keys_are_unique_and_sanitized() {
        let store = MemoryObjectStore::new("https://cdn.qrdeck.example");
        let first =
            store.upload(b"1", "../../etc/passwd", "text/plain").expect("upload should succeed");
        let second =
            store.upload(b"2", "../../etc/passwd", "text/plain").expect("upload should succeed");

        assert_ne!(first, second);
        assert!(!first.contains(".."));
        assert_eq!(store.objects().len(), 2);
    }
}
