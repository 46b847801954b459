//! Per-user project storage
//!
//! A project is a named, independently stored [`PersistedData`] blob keyed by
//! (user, project). The [`ProjectStore`] trait is the seam to a storage
//! backend; [`MemoryProjectStore`] and [`FileProjectStore`] implement it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::template::is_safe_id;

use super::envelope::{check_shape, PersistedData};
use super::error::StorageError;

/// Identifies one stored project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectKey {
    pub user_id: String,
    pub project_id: String,
}

impl ProjectKey {
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
        }
    }

    fn not_found(&self) -> StorageError {
        StorageError::NotFound {
            user_id: self.user_id.clone(),
            project_id: self.project_id.clone(),
        }
    }
}

impl std::fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.project_id)
    }
}

/// Entry of a project listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// Limits applied when creating and naming projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLimits {
    pub max_per_user: usize,
    pub max_name_length: usize,
}

impl Default for ProjectLimits {
    fn default() -> Self {
        Self {
            max_per_user: 25,
            max_name_length: 100,
        }
    }
}

impl ProjectLimits {
    /// Trim and truncate a project name; blank names are rejected
    pub fn normalize_name(&self, name: &str) -> Result<String, StorageError> {
        let name: String = name.trim().chars().take(self.max_name_length).collect();
        let name = name.trim_end().to_string();
        if name.is_empty() {
            return Err(StorageError::EmptyName);
        }
        Ok(name)
    }
}

/// Backend holding project records
pub trait ProjectStore {
    /// Projects of a user, most recently updated first
    fn list(&self, user_id: &str) -> Result<Vec<ProjectSummary>, StorageError>;

    /// Create a project holding `data`
    fn create(
        &mut self,
        user_id: &str,
        name: &str,
        data: &PersistedData,
    ) -> Result<ProjectSummary, StorageError>;

    /// Raw stored data of a project, `None` when the project does not exist
    fn load(&self, key: &ProjectKey) -> Result<Option<Value>, StorageError>;

    /// Replace a project's data
    fn save(&mut self, key: &ProjectKey, data: &PersistedData) -> Result<(), StorageError>;

    fn rename(&mut self, key: &ProjectKey, name: &str) -> Result<(), StorageError>;

    fn delete(&mut self, key: &ProjectKey) -> Result<(), StorageError>;
}

/// Clone a project under a new name
///
/// The source data must pass the envelope shape check before it is used.
pub fn duplicate_project<S: ProjectStore + ?Sized>(
    store: &mut S,
    key: &ProjectKey,
    new_name: &str,
) -> Result<ProjectSummary, StorageError> {
    let value = store.load(key)?.ok_or_else(|| key.not_found())?;
    let data = PersistedData::from_value(value)?;
    let summary = store.create(&key.user_id, new_name, &data)?;
    info!(source = %key, project_id = %summary.id, "duplicated project");
    Ok(summary)
}

/// Stored form of a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectRecord {
    id: String,
    name: String,
    updated_at: DateTime<Utc>,
    data: Value,
}

impl ProjectRecord {
    fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

fn new_project_id() -> String {
    Uuid::now_v7().to_string()
}

fn encode(data: &PersistedData) -> Result<Value, StorageError> {
    let value = data.to_value()?;
    check_shape(&value)?;
    Ok(value)
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    records: HashMap<ProjectKey, (u64, ProjectRecord)>,
    revision: u64,
    limits: ProjectLimits,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ProjectLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Store a raw, unchecked blob; for simulating foreign writers
    pub fn insert_raw(&mut self, key: &ProjectKey, name: &str, data: Value) {
        self.revision += 1;
        let record = ProjectRecord {
            id: key.project_id.clone(),
            name: name.to_string(),
            updated_at: Utc::now(),
            data,
        };
        self.records.insert(key.clone(), (self.revision, record));
    }

    fn touch(&mut self, key: &ProjectKey) -> Result<&mut ProjectRecord, StorageError> {
        self.revision += 1;
        let revision = self.revision;
        let (rev, record) = self.records.get_mut(key).ok_or_else(|| key.not_found())?;
        *rev = revision;
        record.updated_at = Utc::now();
        Ok(record)
    }
}

impl ProjectStore for MemoryProjectStore {
    fn list(&self, user_id: &str) -> Result<Vec<ProjectSummary>, StorageError> {
        let mut entries: Vec<&(u64, ProjectRecord)> = self
            .records
            .iter()
            .filter(|(k, _)| k.user_id == user_id)
            .map(|(_, entry)| entry)
            .collect();
        entries.sort_by(|a, b| (b.1.updated_at, b.0).cmp(&(a.1.updated_at, a.0)));
        Ok(entries.into_iter().map(|(_, r)| r.summary()).collect())
    }

    fn create(
        &mut self,
        user_id: &str,
        name: &str,
        data: &PersistedData,
    ) -> Result<ProjectSummary, StorageError> {
        let name = self.limits.normalize_name(name)?;
        let count = self.records.keys().filter(|k| k.user_id == user_id).count();
        if count >= self.limits.max_per_user {
            return Err(StorageError::LimitReached {
                max: self.limits.max_per_user,
            });
        }

        let key = ProjectKey::new(user_id, new_project_id());
        self.insert_raw(&key, &name, encode(data)?);
        debug!(project = %key, "created project");
        let (_, record) = &self.records[&key];
        Ok(record.summary())
    }

    fn load(&self, key: &ProjectKey) -> Result<Option<Value>, StorageError> {
        Ok(self.records.get(key).map(|(_, r)| r.data.clone()))
    }

    fn save(&mut self, key: &ProjectKey, data: &PersistedData) -> Result<(), StorageError> {
        let value = encode(data)?;
        self.touch(key)?.data = value;
        Ok(())
    }

    fn rename(&mut self, key: &ProjectKey, name: &str) -> Result<(), StorageError> {
        let name = self.limits.normalize_name(name)?;
        self.touch(key)?.name = name;
        Ok(())
    }

    fn delete(&mut self, key: &ProjectKey) -> Result<(), StorageError> {
        self.records
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| key.not_found())
    }
}

/// Store keeping one JSON record per project under `<root>/<user>/<id>.json`
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
    limits: ProjectLimits,
}

fn check_component(value: &str) -> Result<&str, StorageError> {
    if is_safe_id(value) {
        Ok(value)
    } else {
        Err(StorageError::InvalidKey {
            value: value.to_string(),
        })
    }
}

impl FileProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            limits: ProjectLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ProjectLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(check_component(user_id)?))
    }

    fn record_path(&self, key: &ProjectKey) -> Result<PathBuf, StorageError> {
        let dir = self.user_dir(&key.user_id)?;
        Ok(dir.join(format!("{}.json", check_component(&key.project_id)?)))
    }

    fn read_record(&self, key: &ProjectKey) -> Result<Option<ProjectRecord>, StorageError> {
        let path = self.record_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write via a temporary file and rename, so readers never see a partial record
    fn write_record(&self, key: &ProjectKey, record: &ProjectRecord) -> Result<(), StorageError> {
        let path = self.record_path(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn update(
        &self,
        key: &ProjectKey,
        apply: impl FnOnce(&mut ProjectRecord),
    ) -> Result<(), StorageError> {
        let mut record = self.read_record(key)?.ok_or_else(|| key.not_found())?;
        apply(&mut record);
        record.updated_at = Utc::now();
        self.write_record(key, &record)
    }
}

impl ProjectStore for FileProjectStore {
    fn list(&self, user_id: &str) -> Result<Vec<ProjectSummary>, StorageError> {
        let dir = self.user_dir(user_id)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match serde_json::from_str::<ProjectRecord>(&fs::read_to_string(&path)?) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping corrupt project record");
                }
            }
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    fn create(
        &mut self,
        user_id: &str,
        name: &str,
        data: &PersistedData,
    ) -> Result<ProjectSummary, StorageError> {
        let name = self.limits.normalize_name(name)?;
        let existing = self.list(user_id)?.len();
        if existing >= self.limits.max_per_user {
            return Err(StorageError::LimitReached {
                max: self.limits.max_per_user,
            });
        }

        let key = ProjectKey::new(user_id, new_project_id());
        let record = ProjectRecord {
            id: key.project_id.clone(),
            name,
            updated_at: Utc::now(),
            data: encode(data)?,
        };
        self.write_record(&key, &record)?;
        info!(project = %key, "created project");
        Ok(record.summary())
    }

    fn load(&self, key: &ProjectKey) -> Result<Option<Value>, StorageError> {
        Ok(self.read_record(key)?.map(|r| r.data))
    }

    fn save(&mut self, key: &ProjectKey, data: &PersistedData) -> Result<(), StorageError> {
        let value = encode(data)?;
        self.update(key, |record| record.data = value)
    }

    fn rename(&mut self, key: &ProjectKey, name: &str) -> Result<(), StorageError> {
        let name = self.limits.normalize_name(name)?;
        self.update(key, |record| record.name = name)
    }

    fn delete(&mut self, key: &ProjectKey) -> Result<(), StorageError> {
        match fs::remove_file(self.record_path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(key.not_found()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::envelope::default_persisted_data;
    use serde_json::json;

    #[test]
    fn test_normalize_name() {
        let limits = ProjectLimits {
            max_per_user: 1,
            max_name_length: 5,
        };
        assert_eq!(limits.normalize_name("  Hello World ").unwrap(), "Hello");
        assert!(matches!(limits.normalize_name("   "), Err(StorageError::EmptyName)));
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let mut store = MemoryProjectStore::new();
        let data = default_persisted_data();

        let first = store.create("alice", "First", &data).unwrap();
        let second = store.create("alice", "Second", &data).unwrap();
        store.create("bob", "Other", &data).unwrap();

        let names: Vec<String> = store.list("alice").unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Second", "First"]);

        let key = ProjectKey::new("alice", &first.id);
        store.rename(&key, "Renamed").unwrap();
        assert_eq!(store.list("alice").unwrap()[0].name, "Renamed");

        store.delete(&ProjectKey::new("alice", &second.id)).unwrap();
        assert_eq!(store.list("alice").unwrap().len(), 1);
        assert!(matches!(
            store.delete(&ProjectKey::new("alice", &second.id)),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_memory_store_limit() {
        let mut store = MemoryProjectStore::with_limits(ProjectLimits {
            max_per_user: 1,
            max_name_length: 100,
        });
        let data = default_persisted_data();
        store.create("alice", "One", &data).unwrap();
        assert!(matches!(
            store.create("alice", "Two", &data),
            Err(StorageError::LimitReached { max: 1 })
        ));
    }

    #[test]
    fn test_duplicate_requires_valid_source() {
        let mut store = MemoryProjectStore::new();
        let key = ProjectKey::new("alice", "broken");
        store.insert_raw(&key, "Broken", json!({ "version": 1 }));

        let result = duplicate_project(&mut store, &key, "Copy");
        assert!(matches!(result, Err(StorageError::InvalidData(_))));
        assert_eq!(store.list("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_list_skips_corrupt_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileProjectStore::new(dir.path());
        let created = store.create("alice", "Kept", &default_persisted_data()).unwrap();
        fs::write(dir.path().join("alice").join("broken.json"), "{ not json").unwrap();

        let listed = store.list("alice").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[test]
    fn test_file_store_rejects_path_components() {
        let store = FileProjectStore::new("/tmp/unused");
        let key = ProjectKey::new("../etc", "passwd");
        assert!(matches!(store.load(&key), Err(StorageError::InvalidKey { .. })));
    }
}
