//! Manifest Reconciler
//!
//! Decides how a media record is delivered (HLS playlist vs. single-file
//! MP4), fetches and parses the playlist when needed, and produces the
//! normalized track manifest the editor works on.

use std::sync::Arc;

use tracing::debug;

use crate::core::{
    manifest::{parse_playlist, Manifest, Track, TrackKind},
    media::{ManifestFetcher, MediaRecord},
    CoreResult,
};

// =============================================================================
// Delivery Classification
// =============================================================================

/// How a media record's content is delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryKind {
    /// HLS multi-variant playlist
    Hls,
    /// Single-file MP4
    Mp4,
    /// Neither recognized; the manifest stays empty
    Unknown,
}

/// Classifies a media record by URL extension first, falling back to
/// MIME/format hints.
///
/// HLS wins when the extension is `m3u8`, or when the URL has no extension
/// and any of the URL, content type, or format mentions the playlist token.
/// MP4 wins when the extension is `mp4`, or when HLS was ruled out and any
/// hint mentions the single-file token.
pub fn classify(record: &MediaRecord) -> DeliveryKind {
    let url = record.effective_url().unwrap_or("");
    let url_lower = url.to_ascii_lowercase();
    let format = record.format.as_deref().unwrap_or("").to_ascii_lowercase();
    let content_type = record
        .content_type
        .as_deref()
        .unwrap_or("")
        .to_ascii_lowercase();
    let ext = extension(url);

    let is_hls = ext == "m3u8"
        || (ext.is_empty()
            && (url_lower.contains("m3u8")
                || content_type.contains("mpegurl")
                || format.contains("m3u8")));

    if is_hls {
        return DeliveryKind::Hls;
    }

    let is_mp4 = ext == "mp4"
        || url_lower.contains("mp4")
        || content_type.contains("mp4")
        || format.contains("mp4");

    if is_mp4 {
        DeliveryKind::Mp4
    } else {
        DeliveryKind::Unknown
    }
}

/// Extracts the lowercased file extension from a URL's final path segment,
/// ignoring any query string. Empty when the segment has no dot.
fn extension(url: &str) -> String {
    let clean = url.split('?').next().unwrap_or("");
    let file = clean.rsplit('/').next().unwrap_or(clean);
    match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Produces a normalized track manifest for a media record.
///
/// Manifests are produced, not retained; the editor store owns the working
/// copy.
pub struct Reconciler {
    fetcher: Arc<dyn ManifestFetcher>,
}

impl Reconciler {
    pub fn new(fetcher: Arc<dyn ManifestFetcher>) -> Self {
        Self { fetcher }
    }

    /// Reconciles a media record into a manifest.
    ///
    /// HLS records delegate to the playlist parser with the delivery URL as
    /// base; MP4 records yield a single synthetic `"Source"` video track;
    /// anything else yields an empty manifest. Fetch failures propagate so
    /// the caller can capture them and reset to empty.
    pub async fn reconcile(&self, record: &MediaRecord) -> CoreResult<Manifest> {
        let kind = classify(record);
        let url = match record.effective_url() {
            Some(u) => u,
            None => {
                debug!("media {} has no delivery URL", record.id);
                return Ok(Manifest::default());
            }
        };

        match kind {
            DeliveryKind::Hls => {
                let text = self.fetcher.fetch_text(url).await?;
                let mut manifest = parse_playlist(&text, url);
                retag_missing_ids(&mut manifest);
                Ok(manifest)
            }
            DeliveryKind::Mp4 => {
                let mut manifest = Manifest::default();
                manifest
                    .video
                    .push(Track::new("v-src", "Source", TrackKind::Video).with_url(url));
                Ok(manifest)
            }
            DeliveryKind::Unknown => Ok(Manifest::default()),
        }
    }
}

/// Re-tags any track with an empty parser ID using a stable per-kind-index
/// fallback (`v-{i}` / `a-{i}` / `c-{i}`)
fn retag_missing_ids(manifest: &mut Manifest) {
    for (kind, prefix) in [
        (TrackKind::Video, "v"),
        (TrackKind::Audio, "a"),
        (TrackKind::Captions, "c"),
    ] {
        for (i, track) in manifest.list_mut(kind).iter_mut().enumerate() {
            if track.id.is_empty() {
                track.id = format!("{}-{}", prefix, i);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
