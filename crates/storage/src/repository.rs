//! Per-user document repositories.
//!
//! Every stored list belongs to exactly one [`UserId`]; there is no way to
//! read across users.

use doc_model::UserId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

use crate::{default_data_dir, StorageError};

pub const RECORDS_SCHEMA_VERSION: u32 = 1;

pub trait UserRepository<T> {
    /// All records of `user`; empty when nothing was stored yet.
    fn get(&self, user: &UserId) -> Result<Vec<T>, StorageError>;

    /// Replaces the records of `user`.
    fn put(&self, user: &UserId, items: &[T]) -> Result<(), StorageError>;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    items: &'a [T],
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    items: Vec<T>,
}

/// One JSON file per user under `<root>/<collection>/`.
#[derive(Debug, Clone)]
pub struct JsonFileRepository<T> {
    dir: PathBuf,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileRepository<T> {
    pub fn with_root(root: impl AsRef<Path>, collection: &str) -> Self {
        Self { dir: root.as_ref().join(collection), _records: PhantomData }
    }

    pub fn from_default_project(collection: &str) -> Result<Self, StorageError> {
        Ok(Self::with_root(default_data_dir()?, collection))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn user_path(&self, user: &UserId) -> PathBuf {
        self.dir.join(format!("{}.json", user.as_str()))
    }
}

impl<T: Serialize + DeserializeOwned> UserRepository<T> for JsonFileRepository<T> {
    fn get(&self, user: &UserId) -> Result<Vec<T>, StorageError> {
        let path = self.user_path(user);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&path)?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if envelope.version != RECORDS_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: envelope.version,
                expected: RECORDS_SCHEMA_VERSION,
            });
        }
        Ok(envelope.items)
    }

    fn put(&self, user: &UserId, items: &[T]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let envelope = EnvelopeRef { version: RECORDS_SCHEMA_VERSION, items };
        let bytes = serde_json::to_vec_pretty(&envelope)?;
        let path = self.user_path(user);
        fs::write(&path, bytes)?;
        debug!(user = %user, count = items.len(), path = %path.display(), "records saved");
        Ok(())
    }
}

#[derive(Debug)]
pub struct MemoryRepository<T> {
    records: RwLock<HashMap<UserId, Vec<T>>>,
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self { records: RwLock::new(HashMap::new()) }
    }
}

impl<T> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Clone> UserRepository<T> for MemoryRepository<T> {
    fn get(&self, user: &UserId) -> Result<Vec<T>, StorageError> {
        let records = self.records.read().map_err(|_| StorageError::Poisoned)?;
        Ok(records.get(user).cloned().unwrap_or_default())
    }

    fn put(&self, user: &UserId, items: &[T]) -> Result<(), StorageError> {
        let mut records = self.records.write().map_err(|_| StorageError::Poisoned)?;
        records.insert(user.clone(), items.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Campaign, Project};

    fn user(id: &str) -> UserId {
        UserId::parse(id).expect("valid user id")
    }

    #[test]
    fn campaigns_round_trip_per_user() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let repo: JsonFileRepository<Campaign> =
            JsonFileRepository::with_root(temp.path(), "campaigns");

        let mut spring = Campaign::new("Spring", 1_700_000_000_000);
        spring.description = "Flyers".to_owned();
        repo.put(&user("alice"), std::slice::from_ref(&spring)).expect("save should succeed");

        assert_eq!(repo.get(&user("alice")).expect("load should succeed"), vec![spring]);
        assert!(repo.get(&user("bob")).expect("load should succeed").is_empty());
        assert!(temp.path().join("campaigns").join("alice.json").exists());
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let repo: JsonFileRepository<Project> =
            JsonFileRepository::with_root(temp.path(), "projects");
        fs::create_dir_all(repo.dir()).expect("create dir");
        fs::write(repo.dir().join("alice.json"), r#"{ "version": 99, "items": [] }"#)
            .expect("write");

        let err = repo.get(&user("alice")).expect_err("should reject");
        assert!(matches!(err, StorageError::UnsupportedVersion { found: 99, expected: 1 }));
    }

    #[test]
    fn memory_repository_isolates_users() {
        let repo = MemoryRepository::new();
        let project = Project {
            id: uuid::Uuid::new_v4(),
            name: "Menu".to_owned(),
            template_url: None,
            created_at: 0,
        };

        repo.put(&user("alice"), std::slice::from_ref(&project)).expect("put should succeed");
        repo.put(&user("alice"), &[project.clone(), project.clone()]).expect("put should succeed");

        assert_eq!(repo.get(&user("alice")).expect("get should succeed").len(), 2);
        assert!(repo.get(&user("carol")).expect("get should succeed").is_empty());
    }
}
