//! Caption Data Models

use serde::{Deserialize, Serialize};

use crate::core::{SegmentId, TimeSec};

// =============================================================================
// Caption Segment
// =============================================================================

/// One timed text segment of a caption track.
///
/// Invariant: `start < end`. Segments in a sequence need not be
/// non-overlapping; that is not enforced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionSegment {
    /// Sequential identity within one parsed document, reassigned from `"1"`
    pub id: SegmentId,
    /// Start time in seconds (>= 0)
    pub start: TimeSec,
    /// End time in seconds (> start)
    pub end: TimeSec,
    /// Caption text; may contain embedded line breaks
    pub text: String,
}

impl CaptionSegment {
    /// Creates a new segment
    pub fn new(id: &str, start: TimeSec, end: TimeSec, text: &str) -> Self {
        Self {
            id: id.to_string(),
            start,
            end,
            text: text.to_string(),
        }
    }

    /// Returns the segment duration in seconds
    pub fn duration(&self) -> TimeSec {
        self.end - self.start
    }
}

// =============================================================================
// Caption Patch
// =============================================================================

/// Partial update for a caption segment; absent fields are left unchanged
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<TimeSec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<TimeSec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CaptionPatch {
    /// Applies the patch to a segment in place
    pub fn apply_to(&self, segment: &mut CaptionSegment) {
        if let Some(start) = self.start {
            segment.start = start;
        }
        if let Some(end) = self.end {
            segment.end = end;
        }
        if let Some(text) = &self.text {
            segment.text = text.clone();
        }
    }
}
