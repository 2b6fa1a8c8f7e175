//! Manifest Data Models
//!
//! Defines the track model produced by the playlist parser and edited by the
//! editor store. A manifest holds three ordered track lists, one per kind;
//! ordering carries no meaning beyond parse order except that the first video
//! track is the default "primary" rendition.

use serde::{Deserialize, Serialize};

use crate::core::{LangTag, TrackId};

// =============================================================================
// Track Kind
// =============================================================================

/// Kind of a delivery track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    /// Subtitle/caption tracks; the HLS `SUBTITLES` media type is normalized
    /// to this kind
    Captions,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Video => write!(f, "video"),
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Captions => write!(f, "captions"),
        }
    }
}

// =============================================================================
// Track
// =============================================================================

/// One track of a delivery manifest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Identity, unique within its kind-list for one parse
    pub id: TrackId,
    /// User-visible label (e.g. `"1080p"`, `"English"`)
    pub label: String,
    /// Track kind
    pub kind: TrackKind,
    /// Resolved absolute location; `None` when the content must be fetched
    /// separately (e.g. captions declared without a URI)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Language tag, when declared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<LangTag>,
}

impl Track {
    /// Creates a track with no URL or language
    pub fn new(id: &str, label: &str, kind: TrackKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            url: None,
            lang: None,
        }
    }

    /// Sets the resolved URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the language tag
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// Normalized track manifest: one ordered list per track kind
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub video: Vec<Track>,
    pub audio: Vec<Track>,
    pub captions: Vec<Track>,
}

impl Manifest {
    /// Returns the track list for a kind
    pub fn list(&self, kind: TrackKind) -> &[Track] {
        match kind {
            TrackKind::Video => &self.video,
            TrackKind::Audio => &self.audio,
            TrackKind::Captions => &self.captions,
        }
    }

    /// Returns the mutable track list for a kind
    pub fn list_mut(&mut self, kind: TrackKind) -> &mut Vec<Track> {
        match kind {
            TrackKind::Video => &mut self.video,
            TrackKind::Audio => &mut self.audio,
            TrackKind::Captions => &mut self.captions,
        }
    }

    /// Checks whether no tracks of any kind are present
    pub fn is_empty(&self) -> bool {
        self.video.is_empty() && self.audio.is_empty() && self.captions.is_empty()
    }

    /// Returns the default primary rendition (first video track)
    pub fn primary_video(&self) -> Option<&Track> {
        self.video.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_builder() {
        let track = Track::new("c-0", "English", TrackKind::Captions)
            .with_url("https://cdn.example/en.vtt")
            .with_lang("en");

        assert_eq!(track.id, "c-0");
        assert_eq!(track.kind, TrackKind::Captions);
        assert_eq!(track.url.as_deref(), Some("https://cdn.example/en.vtt"));
        assert_eq!(track.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_manifest_kind_lists() {
        let mut manifest = Manifest::default();
        assert!(manifest.is_empty());

        manifest
            .list_mut(TrackKind::Video)
            .push(Track::new("v-0", "1080p", TrackKind::Video));
        manifest
            .list_mut(TrackKind::Audio)
            .push(Track::new("a-0", "Stereo", TrackKind::Audio));

        assert!(!manifest.is_empty());
        assert_eq!(manifest.list(TrackKind::Video).len(), 1);
        assert_eq!(manifest.primary_video().unwrap().id, "v-0");
    }

    #[test]
    fn test_track_serialization_omits_absent_fields() {
        let track = Track::new("v-0", "Source", TrackKind::Video);
        let json = serde_json::to_string(&track).unwrap();
        assert!(!json.contains("url"));
        assert!(!json.contains("lang"));
        assert!(json.contains("\"kind\":\"video\""));
    }
}
