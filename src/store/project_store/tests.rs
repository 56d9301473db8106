// SPDX-License-Identifier: MIT

use std::fs;
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use serde_json::json;

use crate::model::{DocumentContent, SaveInput};

use super::{ProjectStore, StoreError, WriteDurability, PROJECT_FILE_SUFFIX};

struct StoreCtx {
    tmp: tempfile::TempDir,
    store: ProjectStore,
}

#[fixture]
fn ctx() -> StoreCtx {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let store = ProjectStore::new(tmp.path().join("ProjectSpaces"));
    StoreCtx { tmp, store }
}

#[rstest]
fn create_then_read_round_trips(ctx: StoreCtx) {
    let summary = ctx.store.create_project("Weekly Sketches").expect("create");
    assert_eq!(summary.title(), "Weekly Sketches");
    assert_eq!(
        summary.path(),
        Path::new(&format!("{}{PROJECT_FILE_SUFFIX}", summary.id().as_str()))
    );

    let document = ctx
        .store
        .read_project(summary.path())
        .expect("read")
        .expect("document exists");
    assert_eq!(document.id(), summary.id());
    assert_eq!(document.title(), "Weekly Sketches");
    assert_eq!(document.created_at(), summary.created_at());

    let content = document.content().as_structured().expect("placeholder is json");
    assert!(content["store"].as_object().is_some_and(|s| s.is_empty()));
}

#[rstest]
fn update_replaces_content_and_stamps_updated_at(ctx: StoreCtx) {
    let summary = ctx.store.create_project("Doodles").expect("create");

    let snapshot = json!({"store": {"shape:a": {"x": 1, "y": 2}}});
    let receipt = ctx
        .store
        .update_project(
            summary.path(),
            SaveInput::Structured(snapshot.clone()),
            WriteDurability::Durable,
        )
        .expect("update");
    assert_eq!(receipt.path, summary.path());

    let document = ctx
        .store
        .read_project(summary.path())
        .expect("read")
        .expect("document exists");
    assert_eq!(document.content().as_structured(), Some(&snapshot));
    assert_eq!(document.id(), summary.id());
    assert_eq!(document.title(), "Doodles");
    assert_eq!(document.created_at(), summary.created_at());
    assert!(document.updated_at() >= document.created_at());
}

#[rstest]
fn legacy_plain_text_content_reads_as_raw(ctx: StoreCtx) {
    let summary = ctx.store.create_project("Legacy").expect("create");
    ctx.store
        .update_project(
            summary.path(),
            SaveInput::Raw("scribble v0 payload".to_owned()),
            WriteDurability::BestEffort,
        )
        .expect("update");

    let document = ctx
        .store
        .read_project(summary.path())
        .expect("read")
        .expect("document exists");
    assert_eq!(
        document.content(),
        &DocumentContent::Raw("scribble v0 payload".to_owned())
    );
}

#[rstest]
fn missing_created_at_falls_back_to_the_snapshot_stamp(ctx: StoreCtx) {
    ctx.store.ensure_root().expect("root");
    let name = format!("legacy-doc{PROJECT_FILE_SUFFIX}");
    let envelope = json!({
        "id": "legacy-doc",
        "title": "Old Document",
        "type": "canvas",
        "content": r#"{"store":{},"createdAt":"2021-03-04T05:06:07Z"}"#,
    });
    fs::write(
        ctx.store.root().join(&name),
        serde_json::to_string(&envelope).expect("encode"),
    )
    .expect("seed file");

    let document = ctx
        .store
        .read_project(Path::new(&name))
        .expect("read")
        .expect("document exists");
    let created_at = document.created_at().expect("fallback applied");
    assert_eq!(created_at.to_rfc3339(), "2021-03-04T05:06:07+00:00");
}

#[rstest]
fn unreadable_documents_read_as_none(ctx: StoreCtx) {
    assert!(ctx
        .store
        .read_project(Path::new("missing.canvas.json"))
        .expect("missing is not an error")
        .is_none());

    ctx.store.ensure_root().expect("root");
    fs::write(ctx.store.root().join("broken.canvas.json"), "{not json").expect("seed file");
    assert!(ctx
        .store
        .read_project(Path::new("broken.canvas.json"))
        .expect("corrupt is not an error")
        .is_none());
}

#[rstest]
fn catalog_skips_foreign_hidden_and_corrupt_entries(ctx: StoreCtx) {
    ctx.store.create_project("Alpha").expect("create");
    ctx.store.create_project("Beta").expect("create");

    let root = ctx.store.root().to_path_buf();
    fs::write(root.join("notes.txt"), "not a project").expect("seed");
    fs::write(root.join(".hidden.canvas.json"), "{}").expect("seed");
    fs::write(root.join("corrupt.canvas.json"), "][").expect("seed");
    fs::create_dir(root.join("folder.canvas.json")).expect("seed");

    let summaries = ctx.store.list_projects().expect("list");
    assert_eq!(summaries.len(), 2);
}

#[rstest]
fn catalog_orders_titles_descending_case_insensitively(ctx: StoreCtx) {
    for title in ["Bravo", "alpha", "Charlie"] {
        ctx.store.create_project(title).expect("create");
    }

    let titles: Vec<_> = ctx
        .store
        .list_projects()
        .expect("list")
        .into_iter()
        .map(|summary| summary.title().to_owned())
        .collect();
    assert_eq!(titles, ["Charlie", "Bravo", "alpha"]);
}

#[rstest]
fn listing_creates_a_missing_root(ctx: StoreCtx) {
    assert!(!ctx.store.root().exists());
    let summaries = ctx.store.list_projects().expect("list");
    assert!(summaries.is_empty());
    assert!(ctx.store.root().is_dir());
    assert!(ctx.tmp.path().is_dir());
}

#[rstest]
fn delete_is_idempotent(ctx: StoreCtx) {
    let summary = ctx.store.create_project("Short lived").expect("create");
    ctx.store.delete_project(summary.path()).expect("delete");
    assert!(ctx
        .store
        .read_project(summary.path())
        .expect("read")
        .is_none());
    ctx.store.delete_project(summary.path()).expect("repeat delete");
}

#[rstest]
#[case("Sketch <Plan> v2!", "Sketch Plan v2")]
#[case("   \t ", "Untitled Project")]
fn rename_sanitizes_titles(ctx: StoreCtx, #[case] raw: &str, #[case] expected: &str) {
    let summary = ctx.store.create_project("Original").expect("create");
    ctx.store.rename_project(summary.path(), raw).expect("rename");

    let document = ctx
        .store
        .read_project(summary.path())
        .expect("read")
        .expect("document exists");
    assert_eq!(document.title(), expected);
}

#[rstest]
fn create_falls_back_to_the_default_title(ctx: StoreCtx) {
    let summary = ctx.store.create_project("???").expect("create");
    assert_eq!(summary.title(), "New Project");
}

#[rstest]
#[case("../escape.canvas.json")]
#[case("/etc/passwd")]
#[case("")]
fn traversal_paths_are_rejected(ctx: StoreCtx, #[case] path: &str) {
    let err = ctx
        .store
        .read_project(Path::new(path))
        .expect_err("path must be rejected");
    assert!(matches!(err, StoreError::InvalidRelativePath { .. }), "{err}");

    let err = ctx
        .store
        .delete_project(Path::new(path))
        .expect_err("path must be rejected");
    assert!(matches!(err, StoreError::InvalidRelativePath { .. }), "{err}");
}

#[rstest]
fn update_of_a_missing_document_is_an_error(ctx: StoreCtx) {
    let err = ctx
        .store
        .update_project(
            &PathBuf::from("nope.canvas.json"),
            SaveInput::Raw("{}".to_owned()),
            WriteDurability::BestEffort,
        )
        .expect_err("missing target must surface");
    assert!(matches!(err, StoreError::Io { .. }), "{err}");
}

#[rstest]
fn writes_leave_no_temp_files_behind(ctx: StoreCtx) {
    let summary = ctx.store.create_project("Tidy").expect("create");
    ctx.store
        .update_project(
            summary.path(),
            SaveInput::Raw("{}".to_owned()),
            WriteDurability::Durable,
        )
        .expect("update");

    let leftovers: Vec<_> = fs::read_dir(ctx.store.root())
        .expect("read root")
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(".bulb.tmp."))
        .collect();
    assert!(leftovers.is_empty());
}
