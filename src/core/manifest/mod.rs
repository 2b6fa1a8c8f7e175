//! Manifest Module
//!
//! Track model for a media asset's delivery manifest, the HLS multi-variant
//! playlist parser, and the reconciler that turns a media record into a
//! normalized manifest plus default selections.

mod models;
mod playlist;
mod reconciler;

pub use models::{Manifest, Track, TrackKind};
pub use playlist::parse_playlist;
pub use reconciler::{classify, DeliveryKind, Reconciler};
