//! Editor Module
//!
//! Owns the working copy of a media asset's manifest: the store with its
//! clean/dirty state machine, durable local snapshots, and the per-asset
//! editing session that ties the manifest reconciler, captions codec, and
//! transcode monitor together.

mod session;
mod snapshot;
mod store;

pub use session::{EditorContext, EditorSession};
pub use snapshot::{
    persist, restore, FileSnapshotStorage, MemorySnapshotStorage, PersistOutcome, RestoreOutcome,
    SnapshotStorage,
};
pub use store::{EditorEvent, EditorStore, SelectionState};
