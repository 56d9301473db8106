// SPDX-License-Identifier: MIT

//! Core data model: identifiers, the project document envelope, and the
//! opaque canvas snapshot type.

pub mod ids;
pub mod project;

pub use ids::{Id, IdError, ProjectId};
pub use project::{
    sanitize_title, DocumentContent, ProjectDocument, ProjectKind, ProjectSummary, SaveInput,
    SnapshotBlob, DEFAULT_CREATE_TITLE, DEFAULT_RENAME_TITLE,
};
