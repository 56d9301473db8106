// SPDX-License-Identifier: MIT

//! Seam between the persistence layer and whatever renders the canvas.

use crate::model::SnapshotBlob;

/// A live canvas document that can be captured and restored.
///
/// Implementations are expected to answer [`CanvasEngine::snapshot`]
/// synchronously and without blocking: the save coordinator calls it at
/// capture points on its event loop, and the returned blob must be a complete
/// serialization of the document at that instant. State mutation happens
/// behind interior mutability, so both methods take `&self`.
pub trait CanvasEngine: Send + Sync {
    /// Serializes the current document state.
    fn snapshot(&self) -> SnapshotBlob;

    /// Replaces the document state with a previously captured snapshot.
    fn load_snapshot(&self, snapshot: &SnapshotBlob);
}
