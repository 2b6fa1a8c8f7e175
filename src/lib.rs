//! Mediadesk Core Engine
//!
//! Backend engine for an admin media editor: loads a media asset's delivery
//! manifest (HLS multi-variant playlist or single-file MP4), builds an
//! editable track model, supports caption timing/text editing, and drives a
//! remote transcode pipeline.
//!
//! The engine is UI-agnostic; a front-end binds to [`core::editor::EditorSession`]
//! and recomputes its derived views after each mutating operation.

pub mod core;
