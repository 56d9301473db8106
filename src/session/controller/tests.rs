// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::task::yield_now;
use tokio::time::advance;

use crate::api::ProjectsApi;
use crate::canvas::CanvasEngine;
use crate::model::{ProjectId, ProjectKind, ProjectSummary, SnapshotBlob};
use crate::store::WriteDurability;
use crate::sync::{SaveStatus, SaveTiming};

use super::{SessionController, SessionEvents};

struct FakeCanvas {
    state: Mutex<Value>,
}

impl FakeCanvas {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(Value::Null),
        })
    }

    fn set(&self, value: Value) {
        *self.state.lock().expect("canvas lock") = value;
    }

    fn get(&self) -> Value {
        self.state.lock().expect("canvas lock").clone()
    }
}

impl CanvasEngine for FakeCanvas {
    fn snapshot(&self) -> SnapshotBlob {
        SnapshotBlob::from_value(&self.state.lock().expect("canvas lock"))
    }

    fn load_snapshot(&self, snapshot: &SnapshotBlob) {
        *self.state.lock().expect("canvas lock") = snapshot.probe().unwrap_or(Value::Null);
    }
}

struct SessionCtx {
    _tmp: tempfile::TempDir,
    api: Arc<ProjectsApi>,
    engine: Arc<FakeCanvas>,
    controller: SessionController,
    events: SessionEvents,
}

impl SessionCtx {
    async fn stored_content(&self, path: &str) -> Option<Value> {
        let dto = self.api.get_project_content(path).await?;
        Some(serde_json::to_value(&dto.content).expect("encode content"))
    }

    fn drain_saves(&mut self) -> Vec<SaveStatus> {
        let mut drained = Vec::new();
        while let Ok(status) = self.events.saves.try_recv() {
            drained.push(status);
        }
        drained
    }
}

async fn start() -> SessionCtx {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let api = Arc::new(ProjectsApi::for_space(tmp.path().join("ProjectSpaces")));
    let engine = FakeCanvas::new();
    let (controller, events) =
        SessionController::new(api.clone(), engine.clone(), SaveTiming::default());
    SessionCtx {
        _tmp: tmp,
        api,
        engine,
        controller,
        events,
    }
}

async fn settle() {
    for _ in 0..32 {
        yield_now().await;
    }
}

fn durable_saves(statuses: &[SaveStatus]) -> usize {
    statuses
        .iter()
        .filter(|status| {
            matches!(
                status,
                SaveStatus::Saved {
                    durability: WriteDurability::Durable,
                    ..
                }
            )
        })
        .count()
}

#[tokio::test(start_paused = true)]
async fn create_selects_the_new_project() {
    let mut ctx = start().await;

    let loaded = ctx
        .controller
        .create_project("Fresh Canvas")
        .await
        .expect("create and select");
    assert_eq!(loaded.title, "Fresh Canvas");

    let active = ctx.controller.active_summary().expect("project is active");
    assert_eq!(active.title(), "Fresh Canvas");
    // The placeholder snapshot was handed to the canvas.
    assert_eq!(ctx.engine.get()["store"], json!({}));
}

#[tokio::test(start_paused = true)]
async fn switching_projects_flushes_the_one_being_left() {
    let mut ctx = start().await;

    ctx.controller.create_project("Alpha").await.expect("create alpha");
    let alpha_path = ctx
        .controller
        .active_summary()
        .expect("alpha active")
        .path()
        .to_string_lossy()
        .into_owned();

    let bravo = ctx.api.create_project(".", "Bravo").await.expect("create bravo");
    let bravo_summary = bravo.new_item.to_summary().expect("valid summary");

    ctx.engine.set(json!({"store": {"alpha-edit": 1}}));
    ctx.controller.notify_change();

    // Switch well inside the 10s idle window: the flush must cover it.
    ctx.controller.select_project(bravo_summary).await;
    settle().await;

    assert_eq!(
        ctx.stored_content(&alpha_path).await.expect("alpha on disk"),
        json!({"store": {"alpha-edit": 1}})
    );
    assert!(durable_saves(&ctx.drain_saves()) >= 1);

    // The canvas now holds bravo, and the session points at it.
    assert_eq!(ctx.engine.get()["store"], json!({}));
    assert_eq!(
        ctx.controller.active_summary().expect("bravo active").title(),
        "Bravo"
    );
}

#[tokio::test(start_paused = true)]
async fn go_home_flushes_and_deactivates() {
    let mut ctx = start().await;

    ctx.controller.create_project("Solo").await.expect("create");
    let path = ctx
        .controller
        .active_summary()
        .expect("active")
        .path()
        .to_string_lossy()
        .into_owned();

    ctx.engine.set(json!({"store": {"drawn": true}}));
    ctx.controller.notify_change();
    ctx.controller.go_home().await;

    assert!(ctx.controller.active_summary().is_none());
    assert_eq!(
        ctx.stored_content(&path).await.expect("still on disk"),
        json!({"store": {"drawn": true}})
    );
    assert!(durable_saves(&ctx.drain_saves()) >= 1);
}

#[tokio::test(start_paused = true)]
async fn deleting_the_active_project_does_not_resurrect_it() {
    let mut ctx = start().await;

    ctx.controller.create_project("Doomed").await.expect("create");
    let summary = ctx.controller.active_summary().expect("active").clone();
    let path = summary.path().to_string_lossy().into_owned();

    ctx.engine.set(json!({"store": {"last-words": true}}));
    ctx.controller.notify_change();
    settle().await;

    ctx.controller.delete_project(&summary).await;
    assert!(ctx.controller.active_summary().is_none());
    assert!(ctx.stored_content(&path).await.is_none());

    // Neither the pending idle save nor anything else brings the file back.
    advance(Duration::from_secs(30)).await;
    settle().await;
    assert!(ctx.stored_content(&path).await.is_none());
    assert!(!ctx
        .controller
        .save_active(SnapshotBlob::from_value(&json!({"store": {}})))
        .await);
}

#[tokio::test(start_paused = true)]
async fn deleting_an_inactive_project_leaves_the_session_alone() {
    let mut ctx = start().await;

    ctx.controller.create_project("Keeper").await.expect("create");
    let other = ctx.api.create_project(".", "Extra").await.expect("create extra");
    let other_summary = other.new_item.to_summary().expect("valid summary");

    ctx.controller.delete_project(&other_summary).await;

    assert_eq!(
        ctx.controller.active_summary().expect("still active").title(),
        "Keeper"
    );
    let titles: Vec<_> = ctx
        .controller
        .list_projects()
        .await
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, ["Keeper"]);
}

#[tokio::test(start_paused = true)]
async fn renames_show_in_the_next_catalog() {
    let mut ctx = start().await;

    ctx.controller.create_project("Old Name").await.expect("create");
    let summary = ctx.controller.active_summary().expect("active").clone();

    ctx.controller.update_title(&summary, "New <Name>").await;

    let titles: Vec<_> = ctx
        .controller
        .list_projects()
        .await
        .into_iter()
        .map(|item| item.title)
        .collect();
    assert_eq!(titles, ["New Name"]);
}

#[tokio::test(start_paused = true)]
async fn unloadable_projects_are_selected_as_empty() {
    let mut ctx = start().await;
    ctx.engine.set(json!({"store": {"stale": true}}));

    let ghost = ProjectSummary::new(
        ProjectId::generate(),
        "Ghost".to_owned(),
        ProjectKind::Canvas,
        "ghost.canvas.json".into(),
        None,
        None,
    );

    let loaded = ctx.controller.select_project(ghost).await;
    assert!(loaded.is_none());
    // Selection still succeeds; the canvas keeps whatever it had and the
    // session treats the document as hydrated-but-empty.
    assert_eq!(
        ctx.controller.active_summary().expect("ghost active").title(),
        "Ghost"
    );
}

#[tokio::test(start_paused = true)]
async fn manual_save_persists_the_given_snapshot() {
    let mut ctx = start().await;

    ctx.controller.create_project("Manual").await.expect("create");
    let path = ctx
        .controller
        .active_summary()
        .expect("active")
        .path()
        .to_string_lossy()
        .into_owned();

    let snapshot = SnapshotBlob::from_value(&json!({"store": {"pressed-save": 1}}));
    assert!(ctx.controller.save_active(snapshot).await);
    assert_eq!(
        ctx.stored_content(&path).await.expect("on disk"),
        json!({"store": {"pressed-save": 1}})
    );
    assert_eq!(
        ctx.events
            .snapshots
            .try_recv()
            .expect("snapshot echoed on the stream")
            .probe(),
        Some(json!({"store": {"pressed-save": 1}}))
    );
}
