// SPDX-License-Identifier: MIT

//! Dual-cadence autosave: throttled stream writes while editing plus a
//! debounced durable write once the canvas goes idle.

pub mod save_coordinator;

pub use save_coordinator::{ProjectHandle, SaveCoordinator, SaveStatus, SaveTiming};
