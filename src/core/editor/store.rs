//! Editor State Store
//!
//! Holds the canonical manifest and the operator's working copy for one
//! asset, plus current per-kind selections and the unsaved-change flag.
//!
//! State machine: `clean` (working copy == canonical) -> `dirty` on any
//! mutation -> `clean` again on commit or a fresh manifest load. Change
//! events are published on a broadcast channel so derived views can
//! recompute on demand instead of relying on implicit dependency tracking.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::core::{
    manifest::{Manifest, Track, TrackKind},
    LangTag, MediaId, TitleId, TrackId,
};

// =============================================================================
// Selection State
// =============================================================================

/// Current per-kind track selections.
///
/// Caption language is keyed on the lang tag rather than the positional
/// track ID, since parser IDs are not stable across re-parses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_video_id: Option<TrackId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_audio_id: Option<TrackId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_caption_id: Option<TrackId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_caption_lang: Option<LangTag>,
}

impl SelectionState {
    /// Seeds each selection from the first track of its kind, only where no
    /// selection is already set. Re-seeding after a reload never clobbers an
    /// existing choice.
    pub fn seed_defaults(&mut self, manifest: &Manifest) {
        if self.selected_video_id.is_none() {
            self.selected_video_id = manifest.video.first().map(|t| t.id.clone());
        }
        if self.selected_audio_id.is_none() {
            self.selected_audio_id = manifest.audio.first().map(|t| t.id.clone());
        }
        if self.selected_caption_id.is_none() {
            self.selected_caption_id = manifest.captions.first().map(|t| t.id.clone());
        }
        if self.selected_caption_lang.is_none() {
            self.selected_caption_lang = manifest
                .captions
                .first()
                .map(|t| t.lang.clone().unwrap_or_else(|| "und".to_string()));
        }
    }
}

// =============================================================================
// Editor Events
// =============================================================================

/// Store change notification
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    /// Canonical manifest replaced (load or restore)
    ManifestReplaced,
    /// Working copy replaced wholesale
    WorkingCopyReplaced,
    /// Track appended to the working copy
    TrackAdded { kind: TrackKind, id: TrackId },
    /// Track removed from the working copy
    TrackRemoved { kind: TrackKind, id: TrackId },
    /// Working copy committed as canonical
    Committed,
    /// A selection changed
    SelectionChanged,
}

// =============================================================================
// Editor Store
// =============================================================================

/// Working-copy store for one (title, media) identity
pub struct EditorStore {
    title_id: TitleId,
    media_id: MediaId,
    /// Last committed/loaded manifest
    manifest: Manifest,
    /// The operator's mutable copy
    working_copy: Manifest,
    selection: SelectionState,
    unsaved: bool,
    events: broadcast::Sender<EditorEvent>,
}

impl EditorStore {
    /// Creates a clean store for an asset identity
    pub fn new(title_id: &str, media_id: &str) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            title_id: title_id.to_string(),
            media_id: media_id.to_string(),
            manifest: Manifest::default(),
            working_copy: Manifest::default(),
            selection: SelectionState::default(),
            unsaved: false,
            events,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    /// Last committed/loaded manifest
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// The operator's working copy
    pub fn working_copy(&self) -> &Manifest {
        &self.working_copy
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Whether the working copy diverges from the canonical manifest
    pub fn has_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Subscribes to store change events
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.events.subscribe()
    }

    /// Deterministic durable-snapshot key for this asset identity
    pub fn snapshot_key(&self) -> String {
        format!("editor:manifest:{}:{}", self.title_id, self.media_id)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Replaces both canonical and working copy, resets to clean, and seeds
    /// default selections where unset
    pub fn set_manifest(&mut self, next: Manifest) {
        self.working_copy = next.clone();
        self.manifest = next;
        self.unsaved = false;
        self.selection.seed_defaults(&self.manifest);
        self.emit(EditorEvent::ManifestReplaced);
    }

    /// Replaces the working copy only and marks the store dirty
    pub fn set_working_copy(&mut self, next: Manifest) {
        self.working_copy = next;
        self.unsaved = true;
        self.emit(EditorEvent::WorkingCopyReplaced);
    }

    /// Appends a track to the working copy's kind-list and marks dirty
    pub fn add_track(&mut self, track: Track) {
        let kind = track.kind;
        let id = track.id.clone();
        self.working_copy.list_mut(kind).push(track);
        self.unsaved = true;
        self.emit(EditorEvent::TrackAdded { kind, id });
    }

    /// Removes a track by identity; returns whether anything was removed.
    /// The store stays clean when the track was not present.
    pub fn remove_track(&mut self, kind: TrackKind, id: &str) -> bool {
        let list = self.working_copy.list_mut(kind);
        let before = list.len();
        list.retain(|t| t.id != id);
        let removed = list.len() < before;
        if removed {
            self.unsaved = true;
            self.emit(EditorEvent::TrackRemoved {
                kind,
                id: id.to_string(),
            });
        }
        removed
    }

    /// Promotes the working copy to canonical and resets to clean
    pub fn commit(&mut self) {
        self.manifest = self.working_copy.clone();
        self.unsaved = false;
        self.emit(EditorEvent::Committed);
    }

    // =========================================================================
    // Selections
    // =========================================================================

    pub fn select_video(&mut self, id: &str) {
        self.selection.selected_video_id = Some(id.to_string());
        self.emit(EditorEvent::SelectionChanged);
    }

    pub fn select_audio(&mut self, id: &str) {
        self.selection.selected_audio_id = Some(id.to_string());
        self.emit(EditorEvent::SelectionChanged);
    }

    pub fn select_caption(&mut self, id: &str) {
        self.selection.selected_caption_id = Some(id.to_string());
        self.emit(EditorEvent::SelectionChanged);
    }

    pub fn set_caption_lang(&mut self, lang: &str) {
        self.selection.selected_caption_lang = Some(lang.to_string());
        self.emit(EditorEvent::SelectionChanged);
    }

    fn emit(&self, event: EditorEvent) {
        // No receivers is fine; views subscribe lazily
        let _ = self.events.send(event);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_manifest() -> Manifest {
        Manifest {
            video: vec![
                Track::new("v-0", "1080p", TrackKind::Video).with_url("https://c/1080p.m3u8"),
                Track::new("v-1", "720p", TrackKind::Video).with_url("https://c/720p.m3u8"),
            ],
            audio: vec![Track::new("a-0", "Stereo", TrackKind::Audio)],
            captions: vec![Track::new("c-0", "English", TrackKind::Captions).with_lang("en")],
        }
    }

    #[test]
    fn test_set_manifest_resets_clean_and_seeds_selections() {
        let mut store = EditorStore::new("t1", "m1");
        store.set_manifest(sample_manifest());

        assert!(!store.has_unsaved());
        assert_eq!(store.selection().selected_video_id.as_deref(), Some("v-0"));
        assert_eq!(store.selection().selected_audio_id.as_deref(), Some("a-0"));
        assert_eq!(
            store.selection().selected_caption_id.as_deref(),
            Some("c-0")
        );
        assert_eq!(
            store.selection().selected_caption_lang.as_deref(),
            Some("en")
        );
    }

    #[test]
    fn test_reload_does_not_clobber_existing_selection() {
        let mut store = EditorStore::new("t1", "m1");
        store.set_manifest(sample_manifest());
        store.select_video("v-1");

        store.set_manifest(sample_manifest());
        assert_eq!(store.selection().selected_video_id.as_deref(), Some("v-1"));
    }

    #[test]
    fn test_caption_lang_defaults_to_und_when_absent() {
        let mut store = EditorStore::new("t1", "m1");
        let mut manifest = Manifest::default();
        manifest
            .captions
            .push(Track::new("c-0", "Unknown", TrackKind::Captions));
        store.set_manifest(manifest);

        assert_eq!(
            store.selection().selected_caption_lang.as_deref(),
            Some("und")
        );
    }

    #[test]
    fn test_mutations_mark_dirty_and_commit_resets() {
        let mut store = EditorStore::new("t1", "m1");
        store.set_manifest(sample_manifest());

        store.add_track(Track::new("c-9", "Deutsch", TrackKind::Captions).with_lang("de"));
        assert!(store.has_unsaved());
        assert_eq!(store.working_copy().captions.len(), 2);
        // Canonical copy untouched until commit
        assert_eq!(store.manifest().captions.len(), 1);

        store.commit();
        assert!(!store.has_unsaved());
        assert_eq!(store.manifest().captions.len(), 2);
    }

    #[test]
    fn test_remove_track_by_identity() {
        let mut store = EditorStore::new("t1", "m1");
        store.set_manifest(sample_manifest());

        assert!(store.remove_track(TrackKind::Video, "v-1"));
        assert_eq!(store.working_copy().video.len(), 1);
        assert!(store.has_unsaved());

        // Removing an unknown id is a no-op and leaves dirty state alone
        store.commit();
        assert!(!store.remove_track(TrackKind::Video, "nope"));
        assert!(!store.has_unsaved());
    }

    #[test]
    fn test_set_working_copy_marks_dirty() {
        let mut store = EditorStore::new("t1", "m1");
        store.set_manifest(sample_manifest());

        store.set_working_copy(Manifest::default());
        assert!(store.has_unsaved());
        assert!(store.working_copy().is_empty());
        assert!(!store.manifest().is_empty());
    }

    #[test]
    fn test_events_published_on_mutation() {
        let mut store = EditorStore::new("t1", "m1");
        let mut rx = store.subscribe();

        store.set_manifest(sample_manifest());
        store.add_track(Track::new("a-9", "Extra", TrackKind::Audio));
        store.commit();

        assert_eq!(rx.try_recv().unwrap(), EditorEvent::ManifestReplaced);
        assert_eq!(
            rx.try_recv().unwrap(),
            EditorEvent::TrackAdded {
                kind: TrackKind::Audio,
                id: "a-9".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), EditorEvent::Committed);
    }

    #[test]
    fn test_snapshot_key_is_composite_identity() {
        let store = EditorStore::new("title-7", "media-42");
        assert_eq!(store.snapshot_key(), "editor:manifest:title-7:media-42");
    }
}
