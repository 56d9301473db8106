// SPDX-License-Identifier: MIT

//! Session lifecycle: which project is open, and the flush-then-switch
//! discipline for moving between them.

pub mod controller;

pub use controller::{SessionController, SessionEvents};
