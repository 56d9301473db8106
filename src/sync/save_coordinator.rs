// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use crate::api::{ContentDto, ProjectsApi, SaveProjectRequest};
use crate::canvas::CanvasEngine;
use crate::model::{ProjectId, ProjectSummary, SnapshotBlob};
use crate::store::WriteDurability;

/// Cadence of the two save channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTiming {
    /// Throttle window for stream emissions on change.
    pub stream_window: Duration,
    /// Quiet period after the last change before the durable autosave fires.
    pub idle_delay: Duration,
}

impl Default for SaveTiming {
    fn default() -> Self {
        Self {
            stream_window: Duration::from_millis(500),
            idle_delay: Duration::from_secs(10),
        }
    }
}

/// Outcome of one persisted write, reported on the status channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved {
        path: PathBuf,
        updated_at: DateTime<Utc>,
        durability: WriteDurability,
    },
    Failed {
        path: PathBuf,
        error: String,
    },
}

/// Identity of the document a coordinator instance is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHandle {
    pub id: ProjectId,
    pub path: PathBuf,
}

impl ProjectHandle {
    pub fn from_summary(summary: &ProjectSummary) -> Self {
        Self {
            id: summary.id().clone(),
            path: summary.path().to_path_buf(),
        }
    }
}

enum Event {
    Changed,
    Hydrated,
    ManualSave {
        snapshot: SnapshotBlob,
        done: oneshot::Sender<bool>,
    },
    Flush {
        done: oneshot::Sender<()>,
    },
}

/// Per-project save scheduler.
///
/// One coordinator is spawned per active project and owns every write to that
/// project's file: change notifications, timers, manual saves and the final
/// flush all funnel into a single task, so writes are serialized without any
/// locking. Dropping the handle closes the channel and the task exits without
/// a final write, which is exactly what deleting the active project needs.
#[derive(Debug)]
pub struct SaveCoordinator {
    events: mpsc::UnboundedSender<Event>,
}

impl SaveCoordinator {
    pub fn spawn(
        api: Arc<ProjectsApi>,
        engine: Arc<dyn CanvasEngine>,
        project: ProjectHandle,
        timing: SaveTiming,
        stream_tx: mpsc::UnboundedSender<SnapshotBlob>,
        status_tx: mpsc::UnboundedSender<SaveStatus>,
    ) -> Self {
        let (events, inbox) = mpsc::unbounded_channel();
        let task = CoordinatorTask {
            api,
            engine,
            project,
            timing,
            stream_tx,
            status_tx,
            hydrated: false,
            last_stream_emit: None,
            trailing_due: None,
            idle_due: None,
        };
        tokio::spawn(task.run(inbox));
        Self { events }
    }

    /// Signals that the canvas content changed. Cheap and non-blocking;
    /// ignored until [`Self::mark_hydrated`] has been called.
    pub fn notify_change(&self) {
        let _ = self.events.send(Event::Changed);
    }

    /// Marks initial content load as complete, arming the save paths.
    pub fn mark_hydrated(&self) {
        let _ = self.events.send(Event::Hydrated);
    }

    /// Persists the given snapshot durably, bypassing the hydration guard and
    /// both timers. Returns whether the write succeeded.
    pub async fn manual_save(&self, snapshot: SnapshotBlob) -> bool {
        let (done, outcome) = oneshot::channel();
        if self.events.send(Event::ManualSave { snapshot, done }).is_err() {
            return false;
        }
        outcome.await.unwrap_or(false)
    }

    /// Performs a final durable write of the current canvas state (when
    /// hydrated) and stops the coordinator. Resolves once the write is on
    /// disk, so callers can switch projects immediately afterwards.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.events.send(Event::Flush { done }).is_ok() {
            let _ = finished.await;
        }
    }
}

struct CoordinatorTask {
    api: Arc<ProjectsApi>,
    engine: Arc<dyn CanvasEngine>,
    project: ProjectHandle,
    timing: SaveTiming,
    stream_tx: mpsc::UnboundedSender<SnapshotBlob>,
    status_tx: mpsc::UnboundedSender<SaveStatus>,
    hydrated: bool,
    last_stream_emit: Option<Instant>,
    trailing_due: Option<Instant>,
    idle_due: Option<Instant>,
}

impl CoordinatorTask {
    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Event>) {
        loop {
            tokio::select! {
                event = inbox.recv() => match event {
                    Some(Event::Changed) => self.on_changed().await,
                    Some(Event::Hydrated) => self.hydrated = true,
                    Some(Event::ManualSave { snapshot, done }) => {
                        let ok = self.on_manual_save(snapshot).await;
                        let _ = done.send(ok);
                    }
                    Some(Event::Flush { done }) => {
                        self.on_flush().await;
                        let _ = done.send(());
                        return;
                    }
                    // Handle dropped: abandon pending work without writing.
                    None => return,
                },
                _ = sleep_until(self.trailing_due.unwrap_or_else(Instant::now)),
                    if self.trailing_due.is_some() =>
                {
                    self.trailing_due = None;
                    self.emit_stream().await;
                }
                _ = sleep_until(self.idle_due.unwrap_or_else(Instant::now)),
                    if self.idle_due.is_some() =>
                {
                    self.idle_due = None;
                    let snapshot = self.engine.snapshot();
                    self.write_snapshot(snapshot, WriteDurability::Durable).await;
                }
            }
        }
    }

    async fn on_changed(&mut self) {
        // Changes observed before hydration are echoes of loading the
        // document, not edits. Persisting them would clobber the file.
        if !self.hydrated {
            return;
        }

        self.idle_due = Some(Instant::now() + self.timing.idle_delay);

        match self.last_stream_emit {
            Some(last) if last.elapsed() < self.timing.stream_window => {
                if self.trailing_due.is_none() {
                    self.trailing_due = Some(last + self.timing.stream_window);
                }
            }
            _ => self.emit_stream().await,
        }
    }

    async fn on_manual_save(&mut self, snapshot: SnapshotBlob) -> bool {
        self.trailing_due = None;
        self.idle_due = None;
        let _ = self.stream_tx.send(snapshot.clone());
        self.write_snapshot(snapshot, WriteDurability::Durable).await
    }

    async fn on_flush(&mut self) {
        self.trailing_due = None;
        self.idle_due = None;
        if self.hydrated {
            let snapshot = self.engine.snapshot();
            self.write_snapshot(snapshot, WriteDurability::Durable).await;
        }
    }

    /// Captures the live document and pushes it out on the stream channel,
    /// with a best-effort write behind it.
    async fn emit_stream(&mut self) {
        self.last_stream_emit = Some(Instant::now());
        let snapshot = self.engine.snapshot();
        let _ = self.stream_tx.send(snapshot.clone());
        self.write_snapshot(snapshot, WriteDurability::BestEffort).await;
    }

    async fn write_snapshot(&self, snapshot: SnapshotBlob, durability: WriteDurability) -> bool {
        let request = SaveProjectRequest {
            id: self.project.id.as_str().to_owned(),
            path: self.project.path.to_string_lossy().into_owned(),
            content: ContentDto::Raw(snapshot.into_string()),
        };
        let response = self.api.save_project(&request, durability).await;

        if response.success {
            let _ = self.status_tx.send(SaveStatus::Saved {
                path: self.project.path.clone(),
                updated_at: response.updated_at.unwrap_or_else(Utc::now),
                durability,
            });
            true
        } else {
            let error = response.error.unwrap_or_else(|| "unknown error".to_owned());
            log::warn!("save of {:?} failed: {error}", self.project.path);
            let _ = self.status_tx.send(SaveStatus::Failed {
                path: self.project.path.clone(),
                error,
            });
            false
        }
    }
}
