//! Mediadesk Error Definitions
//!
//! Defines error types used throughout the engine.
//!
//! Propagation policy: playlist/caption parse problems degrade to partial or
//! empty results and never cross the reconciler boundary as errors; snapshot
//! storage failures are converted to outcome values at the snapshot API and
//! never escape; workflow submission errors propagate to the caller while
//! polling-stage errors terminal-fail the job locally.

use thiserror::Error;

use super::MediaId;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Fetch Errors
    // =========================================================================
    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Media not found: {0}")]
    MediaNotFound(MediaId),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Manifest parse failed: {0}")]
    ManifestParse(String),

    // =========================================================================
    // Workflow Errors
    // =========================================================================
    #[error("Workflow error: {0}")]
    Workflow(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Snapshot storage error: {0}")]
    Storage(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;
