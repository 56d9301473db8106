// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::{ProjectContentDto, ProjectSummaryDto, ProjectsApi};
use crate::canvas::CanvasEngine;
use crate::model::{ProjectSummary, SnapshotBlob};
use crate::sync::{ProjectHandle, SaveCoordinator, SaveStatus, SaveTiming};

/// Receiving ends of the session's outbound channels: stream snapshots for
/// collaborators and save outcomes for status display.
pub struct SessionEvents {
    pub snapshots: mpsc::UnboundedReceiver<SnapshotBlob>,
    pub saves: mpsc::UnboundedReceiver<SaveStatus>,
}

struct ActiveProject {
    summary: ProjectSummary,
    coordinator: SaveCoordinator,
}

/// Owns the "which project is open" state and the transitions between
/// projects.
///
/// At most one project is active, and it has exactly one live coordinator.
/// Every transition away from an active project flushes it first, so edits
/// can never leak into the next project's file. The one exception is
/// deletion, where the coordinator is dropped unflushed on purpose.
pub struct SessionController {
    api: Arc<ProjectsApi>,
    engine: Arc<dyn CanvasEngine>,
    timing: SaveTiming,
    stream_tx: mpsc::UnboundedSender<SnapshotBlob>,
    status_tx: mpsc::UnboundedSender<SaveStatus>,
    active: Option<ActiveProject>,
}

impl SessionController {
    pub fn new(
        api: Arc<ProjectsApi>,
        engine: Arc<dyn CanvasEngine>,
        timing: SaveTiming,
    ) -> (Self, SessionEvents) {
        let (stream_tx, snapshots) = mpsc::unbounded_channel();
        let (status_tx, saves) = mpsc::unbounded_channel();
        let controller = Self {
            api,
            engine,
            timing,
            stream_tx,
            status_tx,
            active: None,
        };
        (controller, SessionEvents { snapshots, saves })
    }

    pub fn active_summary(&self) -> Option<&ProjectSummary> {
        self.active.as_ref().map(|active| &active.summary)
    }

    pub async fn list_projects(&self) -> Vec<ProjectSummaryDto> {
        self.api.list_projects().await
    }

    /// Opens a project: flushes the one being left, loads the new document,
    /// hands its snapshot to the canvas, and arms a fresh coordinator.
    ///
    /// A project whose content cannot be loaded is still selected; it is
    /// deemed empty, hydration included, so editing starts from a blank
    /// canvas rather than being silently disabled.
    pub async fn select_project(
        &mut self,
        summary: ProjectSummary,
    ) -> Option<ProjectContentDto> {
        self.flush_active().await;

        let path = summary.path().to_string_lossy().into_owned();
        let loaded = self.api.get_project_content(&path).await;

        let coordinator = SaveCoordinator::spawn(
            self.api.clone(),
            self.engine.clone(),
            ProjectHandle::from_summary(&summary),
            self.timing,
            self.stream_tx.clone(),
            self.status_tx.clone(),
        );

        if let Some(dto) = &loaded {
            self.engine.load_snapshot(&dto.content.to_blob());
        }
        coordinator.mark_hydrated();

        self.active = Some(ActiveProject {
            summary,
            coordinator,
        });
        loaded
    }

    /// Returns to the catalog view, flushing and closing the active project.
    pub async fn go_home(&mut self) {
        self.flush_active().await;
    }

    /// Creates a project and immediately opens it.
    pub async fn create_project(&mut self, name: &str) -> Option<ProjectContentDto> {
        let created = self.api.create_project(".", name).await?;
        let summary = match created.new_item.to_summary() {
            Ok(summary) => summary,
            Err(err) => {
                log::error!("created project has an unusable identity: {err}");
                return None;
            }
        };
        self.select_project(summary).await
    }

    /// Deletes a project. When it is the active one, its coordinator is
    /// dropped without a flush: a final write would put the file right back
    /// on disk.
    pub async fn delete_project(&mut self, summary: &ProjectSummary) {
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.summary.id() == summary.id())
        {
            self.active = None;
        }

        let path = summary.path().to_string_lossy().into_owned();
        self.api.delete_project(&path, summary.kind()).await;
    }

    /// Renames a project. The active summary is kept in step so the next
    /// flush still targets the same file under its new title.
    pub async fn update_title(&mut self, summary: &ProjectSummary, new_title: &str) {
        let path = summary.path().to_string_lossy().into_owned();
        self.api.rename_project(&path, new_title).await;
    }

    /// Forwards a change signal to the active project's coordinator.
    pub fn notify_change(&self) {
        if let Some(active) = &self.active {
            active.coordinator.notify_change();
        }
    }

    /// Durable save of an explicit snapshot, on user request. Returns false
    /// when no project is active or the write failed.
    pub async fn save_active(&self, snapshot: SnapshotBlob) -> bool {
        match &self.active {
            Some(active) => active.coordinator.manual_save(snapshot).await,
            None => false,
        }
    }

    async fn flush_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.coordinator.flush().await;
        }
    }
}

#[cfg(test)]
mod tests;
