// SPDX-License-Identifier: MIT

//! Bulb — project-space persistence and autosave core.
//!
//! One user-created drawing canvas ("project space") is persisted as one JSON
//! document on local disk. This crate owns the storage directory catalog, the
//! document read/write/create/delete lifecycle, and the dual-trigger
//! (throttled-stream + idle-debounced) save protocol that keeps a live canvas
//! session synchronized with durable storage.
//!
//! The drawing engine itself, the window chrome, and the UI↔storage transport
//! are external collaborators; the engine is reached only through the
//! [`canvas::CanvasEngine`] contract and the presentation layer only through
//! [`api::ProjectsApi`].

pub mod api;
pub mod canvas;
pub mod model;
pub mod session;
pub mod store;
pub mod sync;
