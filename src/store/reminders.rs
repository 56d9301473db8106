// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::project_store::{write_atomic_in_root, StoreError, WriteDurability};

/// Sidecar store for the reminders list, one JSON array in a single file next
/// to the project documents.
///
/// Reminder entries are carried as opaque JSON values; their shape belongs to
/// the front end. The load path is self-healing: a missing or corrupt file is
/// replaced with an empty list instead of failing the caller.
#[derive(Debug, Clone)]
pub struct RemindersStore {
    path: PathBuf,
    durability: WriteDurability,
}

impl RemindersStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the reminders list, resetting the file to `[]` when it is
    /// missing or unreadable.
    pub fn load(&self) -> Vec<Value> {
        let parsed = fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Vec<Value>>(&raw).ok());
        match parsed {
            Some(items) => items,
            None => {
                log::warn!("reminders at {:?} missing or unreadable, resetting", self.path);
                if let Err(err) = self.save(&[]) {
                    log::warn!("failed to reset reminders at {:?}: {err}", self.path);
                }
                Vec::new()
            }
        }
    }

    pub fn save(&self, items: &[Value]) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| StoreError::InvalidRelativePath {
                field: "reminders",
                value: self.path.clone(),
            })?;
        let body = serde_json::to_string(items).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        write_atomic_in_root(parent, &self.path, body.as_bytes(), self.durability)
    }
}
