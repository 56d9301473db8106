// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::ProjectId;

/// Fallback title when creating a project with an unusable name.
pub const DEFAULT_CREATE_TITLE: &str = "New Project";
/// Fallback title when renaming a project to an unusable name.
pub const DEFAULT_RENAME_TITLE: &str = "Untitled Project";

/// Document kind discriminator. A single variant today; kept on the envelope
/// for forward compatibility with other document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Canvas,
}

/// A complete point-in-time serialization of the live canvas document.
///
/// Sealed and opaque at the storage boundary: the payload is carried as a
/// string, never validated or rewritten. [`SnapshotBlob::probe`] is the one
/// permitted structural peek, used for the read path's two-level parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotBlob(String);

impl SnapshotBlob {
    pub fn from_string(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// The placeholder snapshot a freshly created project starts with: an
    /// empty canvas store stamped with the creation time.
    pub fn empty(created_at: DateTime<Utc>) -> Self {
        Self::from_value(&serde_json::json!({
            "store": {},
            "createdAt": created_at,
        }))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Attempts to parse the payload as JSON. `None` means the payload is a
    /// plain or legacy-format string, which is legitimate, not an error.
    pub fn probe(&self) -> Option<Value> {
        serde_json::from_str(&self.0).ok()
    }
}

/// Result of the read path's two-level content parse: the envelope's
/// `content` string, structurally decoded when possible, raw otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    Structured(Value),
    Raw(String),
}

impl DocumentContent {
    pub fn from_blob(blob: SnapshotBlob) -> Self {
        match blob.probe() {
            Some(value) => Self::Structured(value),
            None => Self::Raw(blob.into_string()),
        }
    }

    pub fn into_blob(self) -> SnapshotBlob {
        match self {
            Self::Structured(value) => SnapshotBlob::from_value(&value),
            Self::Raw(raw) => SnapshotBlob::from_string(raw),
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}

/// Content handed to a save operation: either an already-serialized snapshot
/// or structured data to be normalized to its string form on write.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveInput {
    Raw(String),
    Structured(Value),
}

impl SaveInput {
    pub fn into_blob(self) -> SnapshotBlob {
        match self {
            Self::Raw(raw) => SnapshotBlob::from_string(raw),
            Self::Structured(value) => SnapshotBlob::from_value(&value),
        }
    }
}

impl From<SnapshotBlob> for SaveInput {
    fn from(blob: SnapshotBlob) -> Self {
        Self::Raw(blob.into_string())
    }
}

/// A fully loaded project document.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDocument {
    id: ProjectId,
    title: String,
    kind: ProjectKind,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    content: DocumentContent,
}

impl ProjectDocument {
    pub fn new(
        id: ProjectId,
        title: String,
        kind: ProjectKind,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
        content: DocumentContent,
    ) -> Self {
        Self {
            id,
            title,
            kind,
            created_at,
            updated_at,
            content,
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn content(&self) -> &DocumentContent {
        &self.content
    }

    pub fn into_content(self) -> DocumentContent {
        self.content
    }
}

/// Lightweight catalog projection of a [`ProjectDocument`]: everything needed
/// to render a project list without loading content. Rebuilt on every catalog
/// request, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    id: ProjectId,
    title: String,
    kind: ProjectKind,
    path: PathBuf,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ProjectSummary {
    pub fn new(
        id: ProjectId,
        title: String,
        kind: ProjectKind,
        path: PathBuf,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title,
            kind,
            path,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> ProjectKind {
        self.kind
    }

    /// Path relative to the storage root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Restricts a title to letters, digits, whitespace and `-_.`, then trims.
/// Returns `None` when nothing usable remains; callers substitute their
/// default placeholder.
pub fn sanitize_title(raw: &str) -> Option<String> {
    static ILLEGAL_TITLE_CHARS: OnceLock<Regex> = OnceLock::new();
    let illegal = ILLEGAL_TITLE_CHARS
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9\s\-_.]").expect("hard-coded title regex is valid"));

    let cleaned = illegal.replace_all(raw, "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
