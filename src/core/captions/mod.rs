//! Caption Module
//!
//! Timed-text model and the SRT/VTT codec used by the caption editor.
//!
//! The codec is deliberately tolerant: operators paste caption files from
//! many sources, so blocks that fail to parse are skipped rather than
//! failing the whole document, and embedded cue indices are never trusted.

mod formats;
mod models;

pub use formats::{parse_captions, serialize_captions, CaptionFormat};
pub use models::{CaptionPatch, CaptionSegment};
