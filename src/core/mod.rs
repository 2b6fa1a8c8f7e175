//! Mediadesk Core
//!
//! Core editing engine module.
//! Handles manifest reconciliation, caption codecs, editor state, and
//! transcode job monitoring.

pub mod captions;
pub mod editor;
pub mod manifest;
pub mod media;
pub mod transcode;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
