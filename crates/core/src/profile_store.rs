//! Profile document stores.
//!
//! [`FileProfileStore`] keeps one pretty-printed JSON document per account at
//! `<profiles_dir>/<s1>/<s2>/<id>/profile.json`. [`MemoryProfileStore`] keeps documents in a
//! map and is used when nothing should touch disk.

use crate::constants::PROFILE_JSON_FILENAME;
use crate::identity::ProfileStore;
use crate::profile::RawProfileRecord;
use crate::user_id::UserId;
use crate::{PortalError, PortalResult};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Combine `fields` into `existing` (merge) or replace it.
fn apply_write(
    existing: Option<RawProfileRecord>,
    fields: RawProfileRecord,
    merge: bool,
) -> RawProfileRecord {
    match existing {
        Some(mut doc) if merge => {
            doc.extend(fields);
            doc
        }
        _ => fields,
    }
}

#[derive(Debug, Clone)]
pub struct FileProfileStore {
    profiles_dir: PathBuf,
}

impl FileProfileStore {
    /// Create a store rooted at `profiles_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::StorageDirCreation` if the directory cannot be created.
    pub fn new(profiles_dir: impl Into<PathBuf>) -> PortalResult<Self> {
        let profiles_dir = profiles_dir.into();
        fs::create_dir_all(&profiles_dir).map_err(PortalError::StorageDirCreation)?;
        Ok(Self { profiles_dir })
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    fn document_path(&self, user: &UserId) -> PathBuf {
        user.sharded_dir(&self.profiles_dir)
            .join(PROFILE_JSON_FILENAME)
    }
}

impl ProfileStore for FileProfileStore {
    fn read_profile(&self, user: &UserId) -> PortalResult<Option<RawProfileRecord>> {
        let path = self.document_path(user);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(PortalError::FileRead)?;
        let value: Value = serde_json::from_str(&json).map_err(PortalError::Deserialization)?;
        match value {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(PortalError::NotAnObject),
        }
    }

    fn write_profile(
        &self,
        user: &UserId,
        fields: RawProfileRecord,
        merge: bool,
    ) -> PortalResult<()> {
        let existing = if merge { self.read_profile(user)? } else { None };
        let document = apply_write(existing, fields, merge);

        let dir = user.sharded_dir(&self.profiles_dir);
        fs::create_dir_all(&dir).map_err(PortalError::StorageDirCreation)?;

        let json = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(PortalError::Serialization)?;
        fs::write(dir.join(PROFILE_JSON_FILENAME), json).map_err(PortalError::FileWrite)?;

        tracing::debug!(user = %user, merge, "profile document written");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    documents: Mutex<HashMap<UserId, RawProfileRecord>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn read_profile(&self, user: &UserId) -> PortalResult<Option<RawProfileRecord>> {
        Ok(self
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
            .cloned())
    }

    fn write_profile(
        &self,
        user: &UserId,
        fields: RawProfileRecord,
        merge: bool,
    ) -> PortalResult<()> {
        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        let document = apply_write(documents.remove(user), fields, merge);
        documents.insert(user.clone(), document);
        Ok(())
    }
}
