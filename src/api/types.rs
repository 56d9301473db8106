// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    DocumentContent, ProjectDocument, ProjectId, ProjectKind, ProjectSummary, SaveInput,
    SnapshotBlob,
};
use crate::store::project_store::validate_relative_path;
use crate::store::StoreError;

/// One catalog row as it crosses the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    /// Path relative to the storage root.
    pub path: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectSummaryDto {
    pub fn from_summary(summary: &ProjectSummary) -> Self {
        Self {
            id: summary.id().as_str().to_owned(),
            title: summary.title().to_owned(),
            kind: summary.kind(),
            path: summary.path().to_string_lossy().into_owned(),
            created_at: summary.created_at(),
            updated_at: summary.updated_at(),
        }
    }

    /// Validates the untrusted id and path before handing a summary back to
    /// the typed layer.
    pub fn to_summary(&self) -> Result<ProjectSummary, StoreError> {
        let id: ProjectId = self.id.parse().map_err(|source| StoreError::InvalidId {
            field: "id",
            value: self.id.clone(),
            source: Box::new(source),
        })?;
        let path = PathBuf::from(&self.path);
        validate_relative_path("path", &path)?;
        Ok(ProjectSummary::new(
            id,
            self.title.clone(),
            self.kind,
            path,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// Document content on the wire. A JSON string stays a raw string; any other
/// JSON shape is structured data. Variant order matters for deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentDto {
    Raw(String),
    Structured(Value),
}

impl ContentDto {
    pub fn to_blob(&self) -> SnapshotBlob {
        match self {
            Self::Raw(raw) => SnapshotBlob::from_string(raw.clone()),
            Self::Structured(value) => SnapshotBlob::from_value(value),
        }
    }

    pub fn to_save_input(&self) -> SaveInput {
        match self {
            Self::Raw(raw) => SaveInput::Raw(raw.clone()),
            Self::Structured(value) => SaveInput::Structured(value.clone()),
        }
    }
}

impl From<DocumentContent> for ContentDto {
    fn from(content: DocumentContent) -> Self {
        match content {
            DocumentContent::Structured(value) => Self::Structured(value),
            DocumentContent::Raw(raw) => Self::Raw(raw),
        }
    }
}

/// The full document as handed to a selecting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContentDto {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub content: ContentDto,
}

impl ProjectContentDto {
    pub fn from_document(document: ProjectDocument) -> Self {
        let (id, title, kind, created_at, updated_at) = (
            document.id().as_str().to_owned(),
            document.title().to_owned(),
            document.kind(),
            document.created_at(),
            document.updated_at(),
        );
        Self {
            id,
            title,
            kind,
            created_at,
            updated_at,
            content: document.into_content().into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectRequest {
    pub id: String,
    /// Path relative to the storage root.
    pub path: String,
    pub content: ContentDto,
}

/// Outcome envelope for a save, mirroring what clients pattern-match on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveProjectResponse {
    pub fn ok(path: &Path, updated_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            path: Some(path.to_string_lossy().into_owned()),
            updated_at: Some(updated_at),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            path: None,
            updated_at: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub success: bool,
    pub new_item: ProjectSummaryDto,
}
