//! Mediadesk Core Type Definitions
//!
//! Defines fundamental ID and time types used throughout the engine.

// =============================================================================
// ID Types
// =============================================================================

/// Media asset unique identifier (opaque, assigned by the catalog service)
pub type MediaId = String;

/// Title (parent content record) unique identifier
pub type TitleId = String;

/// Track unique identifier.
///
/// Synthesized positionally by the playlist parser; not stable across
/// re-parses, so never persist a `TrackId` as a long-lived foreign key.
pub type TrackId = String;

/// Caption segment identifier, reassigned sequentially by the codec
pub type SegmentId = String;

/// Transcode job unique identifier (ULID)
pub type JobId = String;

/// Remote workflow execution identifier (final path segment of the
/// execution resource name)
pub type ExecutionId = String;

/// BCP 47-ish language tag; `"und"` when the source track carries none
pub type LangTag = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;
