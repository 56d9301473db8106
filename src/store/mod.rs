// SPDX-License-Identifier: MIT

//! Persistence for project spaces on disk.
//!
//! One storage directory holds one `<id>.canvas.json` file per project. The
//! store module owns the document lifecycle (create/read/update/rename/delete),
//! the always-rederived catalog scan, and the reminders sidecar file.

pub mod project_store;
pub mod reminders;

pub use project_store::{
    ProjectStore, SaveReceipt, StoreError, WriteDurability, PROJECT_FILE_SUFFIX,
};
pub use reminders::RemindersStore;
