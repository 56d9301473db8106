// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    sanitize_title, DocumentContent, IdError, ProjectDocument, ProjectId, ProjectKind,
    ProjectSummary, SaveInput, SnapshotBlob, DEFAULT_CREATE_TITLE, DEFAULT_RENAME_TITLE,
};

/// Naming convention for project document files inside the storage root.
pub const PROJECT_FILE_SUFFIX: &str = ".canvas.json";

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidId {
        field: &'static str,
        value: String,
        source: Box<IdError>,
    },
    InvalidRelativePath {
        field: &'static str,
        value: PathBuf,
    },
    PathOutsideRoot {
        root: PathBuf,
        path: PathBuf,
    },
    SymlinkRefused {
        path: PathBuf,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::InvalidRelativePath { field, value } => {
                write!(f, "invalid relative path for {field}: {value:?}")
            }
            Self::PathOutsideRoot { root, path } => {
                write!(f, "path is outside storage root: root={root:?} path={path:?}")
            }
            Self::SymlinkRefused { path } => {
                write!(f, "refusing to write through symlink at {path:?}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::InvalidRelativePath { .. } => None,
            Self::PathOutsideRoot { .. } => None,
            Self::SymlinkRefused { .. } => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents and rename operations to stable
    /// storage where possible. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

/// Receipt for a successful content save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// Path relative to the storage root, echoing the caller's input.
    pub path: PathBuf,
    pub updated_at: DateTime<Utc>,
}

/// On-disk document envelope, camelCase to match the persisted format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocumentJson {
    id: String,
    title: String,
    #[serde(rename = "type")]
    kind: ProjectKind,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    content: String,
}

/// Document Store and Catalog Scanner over one storage directory.
///
/// Every operation takes paths relative to the root and refuses anything that
/// would resolve outside it. The directory itself is self-healing: any
/// operation that depends on it creates it first when absent.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
    durability: WriteDurability,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn durability(&self) -> WriteDurability {
        self.durability
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_file_name(id: &ProjectId) -> String {
        format!("{}{PROJECT_FILE_SUFFIX}", id.as_str())
    }

    /// Creates the storage root if absent. Idempotent and safe to race.
    pub fn ensure_root(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    /// Rebuilds the catalog by enumerating the storage root.
    ///
    /// Hidden entries, non-files, and names outside the `*.canvas.json`
    /// convention are ignored. Entries that fail to parse are logged and
    /// skipped; one corrupt file never aborts the listing. Results are ordered
    /// by title, descending, case-insensitively.
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        self.ensure_root()?;

        let entries = fs::read_dir(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    log::warn!("catalog scan: unreadable entry under {:?}: {source}", self.root);
                    continue;
                }
            };

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(PROJECT_FILE_SUFFIX) {
                continue;
            }
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            match self.read_envelope(&entry.path()) {
                Ok(envelope) => match summary_from_envelope(envelope, PathBuf::from(name)) {
                    Ok(summary) => summaries.push(summary),
                    Err(err) => log::warn!("catalog scan: skipping {name}: {err}"),
                },
                Err(err) => log::warn!("catalog scan: skipping {name}: {err}"),
            }
        }

        summaries.sort_by(|a, b| {
            title_cmp(b.title(), a.title()).then_with(|| b.id().cmp(a.id()))
        });
        Ok(summaries)
    }

    /// Creates a new project document with a fresh id, a sanitized title, and
    /// the empty-canvas placeholder snapshot. Filesystem failures surface to
    /// the caller.
    pub fn create_project(&self, title: &str) -> Result<ProjectSummary, StoreError> {
        self.ensure_root()?;

        let id = ProjectId::generate();
        let title = sanitize_title(title).unwrap_or_else(|| DEFAULT_CREATE_TITLE.to_owned());
        let created_at = Utc::now();

        let envelope = ProjectDocumentJson {
            id: id.as_str().to_owned(),
            title: title.clone(),
            kind: ProjectKind::Canvas,
            created_at: Some(created_at),
            updated_at: Some(created_at),
            content: SnapshotBlob::empty(created_at).into_string(),
        };

        let relative = PathBuf::from(Self::project_file_name(&id));
        let full = self.root.join(&relative);
        self.write_envelope(&full, &envelope, self.durability)?;

        Ok(ProjectSummary::new(
            id,
            title,
            ProjectKind::Canvas,
            relative,
            Some(created_at),
            Some(created_at),
        ))
    }

    /// Loads one document. A missing or unparseable file is logged and
    /// reported as `None` ("not found/unreadable"); only path-safety
    /// violations are errors. Content gets the two-level parse: structured
    /// when it decodes as JSON, the raw string otherwise.
    pub fn read_project(&self, relative: &Path) -> Result<Option<ProjectDocument>, StoreError> {
        self.ensure_root()?;
        let full = self.resolve_in_root(relative)?;

        let raw = match fs::read_to_string(&full) {
            Ok(raw) => raw,
            Err(source) => {
                log::warn!("read project {relative:?}: {source}");
                return Ok(None);
            }
        };

        let envelope: ProjectDocumentJson = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(source) => {
                log::warn!("read project {relative:?}: invalid document: {source}");
                return Ok(None);
            }
        };

        match document_from_envelope(envelope) {
            Ok(document) => Ok(Some(document)),
            Err(err) => {
                log::warn!("read project {relative:?}: {err}");
                Ok(None)
            }
        }
    }

    /// Idempotent full overwrite of one document's content.
    ///
    /// Re-reads the existing envelope so identity fields (`id`, `title`,
    /// `createdAt`) are preserved, normalizes the content to its string form,
    /// stamps `updatedAt`, and replaces the file atomically: a failure before
    /// completion leaves the prior valid file intact.
    pub fn update_project(
        &self,
        relative: &Path,
        content: SaveInput,
        durability: WriteDurability,
    ) -> Result<SaveReceipt, StoreError> {
        self.ensure_root()?;
        let full = self.resolve_in_root(relative)?;

        let mut envelope = self.read_envelope(&full)?;
        envelope.content = content.into_blob().into_string();
        let updated_at = Utc::now();
        envelope.updated_at = Some(updated_at);

        self.write_envelope(&full, &envelope, durability)?;
        Ok(SaveReceipt {
            path: relative.to_path_buf(),
            updated_at,
        })
    }

    /// Retitles one document with the same load-modify-write discipline as
    /// [`Self::update_project`], restricted to `title` and `updatedAt`.
    pub fn rename_project(
        &self,
        relative: &Path,
        new_title: &str,
    ) -> Result<DateTime<Utc>, StoreError> {
        self.ensure_root()?;
        let full = self.resolve_in_root(relative)?;

        let mut envelope = self.read_envelope(&full)?;
        envelope.title =
            sanitize_title(new_title).unwrap_or_else(|| DEFAULT_RENAME_TITLE.to_owned());
        let updated_at = Utc::now();
        envelope.updated_at = Some(updated_at);

        self.write_envelope(&full, &envelope, self.durability)?;
        Ok(updated_at)
    }

    /// Removes one document. Absence is success: a repeated delete is a no-op.
    pub fn delete_project(&self, relative: &Path) -> Result<(), StoreError> {
        self.ensure_root()?;
        let full = self.resolve_in_root(relative)?;

        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path: full, source }),
        }
    }

    fn resolve_in_root(&self, relative: &Path) -> Result<PathBuf, StoreError> {
        validate_relative_path("path", relative)?;
        Ok(self.root.join(relative))
    }

    fn read_envelope(&self, full: &Path) -> Result<ProjectDocumentJson, StoreError> {
        let raw = fs::read_to_string(full).map_err(|source| StoreError::Io {
            path: full.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: full.to_path_buf(),
            source,
        })
    }

    fn write_envelope(
        &self,
        full: &Path,
        envelope: &ProjectDocumentJson,
        durability: WriteDurability,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(envelope).map_err(|source| StoreError::Json {
            path: full.to_path_buf(),
            source,
        })?;
        write_atomic_in_root(&self.root, full, format!("{body}\n").as_bytes(), durability)
    }
}

// Extracted envelope conversion and safe filesystem helpers for `ProjectStore`.
include!("project_store/helpers.rs");

#[cfg(test)]
mod tests;
