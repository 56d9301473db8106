// SPDX-License-Identifier: MIT

use std::path::Path;

use serde_json::Value;

use crate::model::{ProjectKind, SaveInput};
use crate::store::{ProjectStore, RemindersStore, WriteDurability};

use super::types::{
    CreateProjectResponse, ProjectContentDto, ProjectSummaryDto, SaveProjectRequest,
    SaveProjectResponse,
};

/// Boundary facade over the stores.
///
/// Error policy mirrors what each caller can act on: saves surface their
/// failure in the response envelope, reads and creates degrade to an empty or
/// absent result, and rename/delete failures are logged and swallowed because
/// the client refreshes the catalog afterwards either way.
#[derive(Debug)]
pub struct ProjectsApi {
    store: ProjectStore,
    reminders: RemindersStore,
}

impl ProjectsApi {
    pub fn new(store: ProjectStore, reminders: RemindersStore) -> Self {
        Self { store, reminders }
    }

    /// Convenience constructor wiring both stores to one space directory.
    pub fn for_space(root: impl Into<std::path::PathBuf>) -> Self {
        let root = root.into();
        let reminders = RemindersStore::new(root.join("reminders.json"));
        Self::new(ProjectStore::new(root), reminders)
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub async fn list_projects(&self) -> Vec<ProjectSummaryDto> {
        match self.store.list_projects() {
            Ok(summaries) => summaries.iter().map(ProjectSummaryDto::from_summary).collect(),
            Err(err) => {
                log::error!("list projects: {err}");
                Vec::new()
            }
        }
    }

    /// Loads one document for display. Any failure, including an invalid
    /// path, yields `None`; the client treats that as "project unavailable".
    pub async fn get_project_content(&self, path: &str) -> Option<ProjectContentDto> {
        match self.store.read_project(Path::new(path)) {
            Ok(Some(document)) => Some(ProjectContentDto::from_document(document)),
            Ok(None) => None,
            Err(err) => {
                log::error!("get project content {path:?}: {err}");
                None
            }
        }
    }

    pub async fn save_project(
        &self,
        request: &SaveProjectRequest,
        durability: WriteDurability,
    ) -> SaveProjectResponse {
        let input: SaveInput = request.content.to_save_input();
        match self
            .store
            .update_project(Path::new(&request.path), input, durability)
        {
            Ok(receipt) => SaveProjectResponse::ok(&receipt.path, receipt.updated_at),
            Err(err) => {
                log::error!("save project {} at {:?}: {err}", request.id, request.path);
                SaveProjectResponse::failed(err)
            }
        }
    }

    /// Creates a project. The parent marker mirrors the wire contract and is
    /// an unused placeholder: all projects live flat in the storage root.
    pub async fn create_project(&self, _parent: &str, name: &str) -> Option<CreateProjectResponse> {
        match self.store.create_project(name) {
            Ok(summary) => Some(CreateProjectResponse {
                success: true,
                new_item: ProjectSummaryDto::from_summary(&summary),
            }),
            Err(err) => {
                log::error!("create project {name:?}: {err}");
                None
            }
        }
    }

    pub async fn rename_project(&self, path: &str, new_title: &str) {
        if let Err(err) = self.store.rename_project(Path::new(path), new_title) {
            log::error!("rename project at {path:?}: {err}");
        }
    }

    /// Deletes a project document. Only canvas documents live in the store,
    /// so other kinds are ignored.
    pub async fn delete_project(&self, path: &str, kind: ProjectKind) {
        match kind {
            ProjectKind::Canvas => {
                if let Err(err) = self.store.delete_project(Path::new(path)) {
                    log::error!("delete project at {path:?}: {err}");
                }
            }
        }
    }

    pub async fn load_reminders(&self) -> Vec<Value> {
        self.reminders.load()
    }

    pub async fn save_reminders(&self, items: &[Value]) {
        if let Err(err) = self.reminders.save(items) {
            log::error!("save reminders: {err}");
        }
    }
}
