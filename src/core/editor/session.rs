//! Editor Session
//!
//! One editing session per (title, media) asset. The session drives the
//! load path (media lookup -> delivery classification -> manifest
//! reconciliation -> store), exposes the derived views a front-end binds
//! to, owns per-language caption segments, and triggers the transcode
//! pipeline.
//!
//! All session operations take `&mut self`, so loads and the
//! reload-after-transcode are structurally single-flight: a reconciliation
//! triggered by transcode completion is sequenced strictly after the
//! terminal poll, never concurrently with a user-initiated load.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    persist, restore, EditorStore, PersistOutcome, RestoreOutcome, SnapshotStorage,
};
use crate::core::{
    captions::{parse_captions, CaptionFormat, CaptionPatch, CaptionSegment},
    manifest::{Manifest, Reconciler, Track, TrackKind},
    media::{ManifestFetcher, MediaRecord, MediaService},
    transcode::{MonitorConfig, TranscodeJob, TranscodeMonitor, WorkflowClient},
    CoreResult, JobId, LangTag,
};

// =============================================================================
// Context
// =============================================================================

/// External collaborators for an editing session
#[derive(Clone)]
pub struct EditorContext {
    pub media_service: Arc<dyn MediaService>,
    pub fetcher: Arc<dyn ManifestFetcher>,
    pub workflow: Arc<dyn WorkflowClient>,
    pub snapshot_storage: Arc<dyn SnapshotStorage>,
    pub monitor_config: MonitorConfig,
}

// =============================================================================
// Session
// =============================================================================

/// Editing session for one media asset
pub struct EditorSession {
    store: EditorStore,
    media: Option<MediaRecord>,
    loading: bool,
    error: Option<String>,
    segments_by_lang: HashMap<LangTag, Vec<CaptionSegment>>,

    media_service: Arc<dyn MediaService>,
    fetcher: Arc<dyn ManifestFetcher>,
    reconciler: Reconciler,
    snapshot_storage: Arc<dyn SnapshotStorage>,
    monitor: TranscodeMonitor,
}

impl EditorSession {
    /// Initializes a session for an asset identity
    pub fn new(title_id: &str, media_id: &str, ctx: EditorContext) -> Self {
        Self {
            store: EditorStore::new(title_id, media_id),
            media: None,
            loading: false,
            error: None,
            segments_by_lang: HashMap::new(),
            media_service: ctx.media_service,
            reconciler: Reconciler::new(ctx.fetcher.clone()),
            fetcher: ctx.fetcher,
            snapshot_storage: ctx.snapshot_storage,
            monitor: TranscodeMonitor::new(ctx.workflow, ctx.monitor_config),
        }
    }

    // =========================================================================
    // State Accessors
    // =========================================================================

    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditorStore {
        &mut self.store
    }

    /// The media record from the last successful load
    pub fn media(&self) -> Option<&MediaRecord> {
        self.media.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// User-visible error from the last load, if it failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current_transcode_job(&self) -> Option<TranscodeJob> {
        self.monitor.current_job()
    }

    // =========================================================================
    // Load Path
    // =========================================================================

    /// Loads the media record and reconciles its manifest into the store.
    ///
    /// Any fetch or lookup failure is captured into [`Self::error`] and the
    /// manifest resets to empty; the loading flag settles in every path.
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;

        let result = self.load_inner().await;
        if let Err(e) = result {
            warn!("load failed for media {}: {}", self.store.media_id(), e);
            self.error = Some(e.to_string());
            self.store.set_manifest(Manifest::default());
        }

        self.loading = false;
    }

    async fn load_inner(&mut self) -> CoreResult<()> {
        let record = self
            .media_service
            .get_media(&self.store.media_id().to_string())
            .await?;
        let manifest = self.reconciler.reconcile(&record).await?;
        self.media = Some(record);
        self.store.set_manifest(manifest);
        Ok(())
    }

    // =========================================================================
    // Derived Views
    // =========================================================================

    /// Primary rendition URL (first video track), empty when none
    pub fn source_url(&self) -> String {
        self.store
            .working_copy()
            .primary_video()
            .and_then(|t| t.url.clone())
            .unwrap_or_default()
    }

    pub fn is_hls(&self) -> bool {
        has_extension(&self.source_url(), "m3u8")
    }

    pub fn is_mp4(&self) -> bool {
        has_extension(&self.source_url(), "mp4")
    }

    /// Caption tracks grouped by language; tracks without a lang tag group
    /// under `"und"`
    pub fn captions_by_lang(&self) -> HashMap<LangTag, Vec<&Track>> {
        let mut map: HashMap<LangTag, Vec<&Track>> = HashMap::new();
        for track in &self.store.working_copy().captions {
            let lang = track.lang.clone().unwrap_or_else(|| "und".to_string());
            map.entry(lang).or_default().push(track);
        }
        map
    }

    /// Distinct caption languages in track order
    pub fn caption_langs(&self) -> Vec<LangTag> {
        let mut langs = Vec::new();
        for track in &self.store.working_copy().captions {
            let lang = track.lang.clone().unwrap_or_else(|| "und".to_string());
            if !langs.contains(&lang) {
                langs.push(lang);
            }
        }
        langs
    }

    /// Segments for the selected caption language, falling back to the
    /// first available language
    pub fn current_caption_segments(&self) -> &[CaptionSegment] {
        let lang = self
            .store
            .selection()
            .selected_caption_lang
            .clone()
            .or_else(|| self.caption_langs().first().cloned());

        match lang.and_then(|l| self.segments_by_lang.get(&l)) {
            Some(segments) => segments,
            None => &[],
        }
    }

    // =========================================================================
    // Caption Editing
    // =========================================================================

    /// Fetches and parses the caption file for a track, populating the
    /// per-language segment model.
    ///
    /// Tracks without a URL get an empty segment list (their content needs
    /// separate segment retrieval). Fetch failures surface on
    /// [`Self::error`] and leave the model unchanged.
    pub async fn load_caption_segments(&mut self, track: &Track) {
        let lang = track.lang.clone().unwrap_or_else(|| "und".to_string());

        let Some(url) = track.url.as_deref() else {
            debug!("caption track {} has no URL, nothing to fetch", track.id);
            self.segments_by_lang.insert(lang, Vec::new());
            return;
        };

        match self.fetcher.fetch_text(url).await {
            Ok(text) => {
                let segments = parse_captions(CaptionFormat::from_url(url), &text);
                self.segments_by_lang.insert(lang, segments);
            }
            Err(e) => {
                warn!("caption fetch failed for {}: {}", track.id, e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Applies a partial update to a segment of the selected language
    pub fn update_caption_segment(&mut self, id: &str, patch: &CaptionPatch) {
        let lang = self
            .store
            .selection()
            .selected_caption_lang
            .clone()
            .unwrap_or_else(|| "und".to_string());

        if let Some(segments) = self.segments_by_lang.get_mut(&lang) {
            if let Some(segment) = segments.iter_mut().find(|s| s.id == id) {
                patch.apply_to(segment);
            }
        }
    }

    /// Serializes the selected language's segments to caption text
    pub fn export_captions(&self, format: CaptionFormat) -> String {
        crate::core::captions::serialize_captions(format, self.current_caption_segments())
    }

    // =========================================================================
    // Track Editing
    // =========================================================================

    pub fn add_track(&mut self, track: Track) {
        self.store.add_track(track);
    }

    pub fn remove_track(&mut self, kind: TrackKind, id: &str) -> bool {
        self.store.remove_track(kind, id)
    }

    // =========================================================================
    // Transcode
    // =========================================================================

    /// Submits a transcode of this asset to HLS, waits for the remote
    /// execution to finish, and re-reconciles the manifest on success to
    /// pick up newly published renditions.
    ///
    /// Submission errors propagate; a failed or cancelled remote execution
    /// is reported through the returned job.
    pub async fn transcode_to_hls(&mut self) -> CoreResult<TranscodeJob> {
        let args = serde_json::json!({
            "titleId": self.store.title_id(),
            "mediaId": self.store.media_id(),
            "target": "hls",
        });
        let _job_id: JobId = self.monitor.submit("Transcode to HLS", args).await?;

        let job = self.monitor.run_to_completion().await?;
        if job.status == crate::core::transcode::JobStatus::Completed {
            // Sequenced strictly after the terminal poll
            self.load().await;
        }
        Ok(job)
    }

    // =========================================================================
    // Durable Snapshots
    // =========================================================================

    /// Persists the working copy; failures are swallowed into the outcome
    pub fn persist_local(&self) -> PersistOutcome {
        persist(self.snapshot_storage.as_ref(), &self.store)
    }

    /// Restores the working copy from the durable snapshot, if present
    pub fn restore_local(&mut self) -> RestoreOutcome {
        let storage = self.snapshot_storage.clone();
        restore(storage.as_ref(), &mut self.store)
    }
}

/// Extension test on a URL's path, ignoring any query string
fn has_extension(url: &str, ext: &str) -> bool {
    let clean = url.split('?').next().unwrap_or("");
    clean
        .to_ascii_lowercase()
        .ends_with(&format!(".{}", ext))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::core::editor::MemorySnapshotStorage;
    use crate::core::transcode::{ExecutionState, JobStatus, MockWorkflowClient};
    use crate::core::{CoreError, CoreResult};

    struct FakeMediaService {
        record: Option<MediaRecord>,
    }

    #[async_trait]
    impl MediaService for FakeMediaService {
        async fn get_media(&self, id: &str) -> CoreResult<MediaRecord> {
            self.record
                .clone()
                .ok_or_else(|| CoreError::MediaNotFound(id.to_string()))
        }
    }

    struct FakeFetcher {
        bodies: Mutex<HashMap<String, String>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                bodies: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_body(self, url: &str, body: &str) -> Self {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_string());
            self
        }
    }

    #[async_trait]
    impl ManifestFetcher for FakeFetcher {
        async fn fetch_text(&self, url: &str) -> CoreResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| CoreError::FetchFailed(format!("no response for {}", url)))
        }
    }

    const MASTER_URL: &str = "https://cdn.example/show/master.m3u8";
    const MASTER_PLAYLIST: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:RESOLUTION=1920x1080\n\
        1080p.m3u8\n\
        #EXT-X-MEDIA:TYPE=SUBTITLES,NAME=\"English\",LANGUAGE=\"en\",URI=\"en.vtt\"\n";

    fn hls_record() -> MediaRecord {
        MediaRecord {
            id: "m1".to_string(),
            file_url: Some(MASTER_URL.to_string()),
            url: None,
            format: Some("m3u8".to_string()),
            content_type: Some("application/vnd.apple.mpegurl".to_string()),
        }
    }

    fn context(record: Option<MediaRecord>, fetcher: FakeFetcher) -> EditorContext {
        context_with_workflow(
            record,
            fetcher,
            MockWorkflowClient::with_states(vec![ExecutionState::Succeeded]),
        )
    }

    fn context_with_workflow(
        record: Option<MediaRecord>,
        fetcher: FakeFetcher,
        workflow: MockWorkflowClient,
    ) -> EditorContext {
        EditorContext {
            media_service: Arc::new(FakeMediaService { record }),
            fetcher: Arc::new(fetcher),
            workflow: Arc::new(workflow),
            snapshot_storage: Arc::new(MemorySnapshotStorage::default()),
            monitor_config: MonitorConfig {
                workflow: "media-transcode".to_string(),
                initial_delay: Duration::from_millis(1),
                poll_interval: Duration::from_millis(1),
            },
        }
    }

    #[tokio::test]
    async fn test_load_detects_hls_and_builds_manifest() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let mut session = EditorSession::new("t1", "m1", context(Some(hls_record()), fetcher));

        session.load().await;

        assert!(session.error().is_none());
        assert!(!session.is_loading());
        assert_eq!(session.store().working_copy().video.len(), 1);
        assert!(session.source_url().contains("1080p.m3u8"));
        assert!(session.is_hls());
        assert!(!session.is_mp4());
        assert_eq!(session.caption_langs(), vec!["en".to_string()]);
        assert_eq!(
            session.store().selection().selected_caption_lang.as_deref(),
            Some("en")
        );
    }

    #[tokio::test]
    async fn test_load_failure_resets_manifest_and_sets_error() {
        let mut session = EditorSession::new("t1", "m1", context(None, FakeFetcher::new()));

        session.load().await;

        assert!(session.error().is_some());
        assert!(!session.is_loading());
        assert!(session.store().working_copy().is_empty());
    }

    #[tokio::test]
    async fn test_reload_preserves_user_selection() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let mut session = EditorSession::new("t1", "m1", context(Some(hls_record()), fetcher));

        session.load().await;
        session.store_mut().select_video("video-custom");
        session.load().await;

        assert_eq!(
            session.store().selection().selected_video_id.as_deref(),
            Some("video-custom")
        );
    }

    #[tokio::test]
    async fn test_caption_segments_fetch_and_edit() {
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:02.500\nHello world\n\n\
            00:00:02.500 --> 00:00:05.000\nEdit me inline.\n";
        let fetcher = FakeFetcher::new()
            .with_body(MASTER_URL, MASTER_PLAYLIST)
            .with_body("https://cdn.example/show/en.vtt", vtt);
        let mut session = EditorSession::new("t1", "m1", context(Some(hls_record()), fetcher));

        session.load().await;
        let track = session.store().working_copy().captions[0].clone();
        session.load_caption_segments(&track).await;

        assert_eq!(session.current_caption_segments().len(), 2);

        session.update_caption_segment(
            "2",
            &CaptionPatch {
                text: Some("Edited.".to_string()),
                end: Some(6.0),
                ..Default::default()
            },
        );
        let segments = session.current_caption_segments();
        assert_eq!(segments[1].text, "Edited.");
        assert_eq!(segments[1].end, 6.0);
        assert_eq!(segments[1].start, 2.5);

        let exported = session.export_captions(CaptionFormat::Srt);
        assert!(exported.contains("00:00:02,500 --> 00:00:06,000\nEdited."));
    }

    #[tokio::test]
    async fn test_caption_track_without_url_gets_empty_segments() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let mut session = EditorSession::new("t1", "m1", context(Some(hls_record()), fetcher));
        session.load().await;

        let track = Track::new("c-x", "Unfetched", TrackKind::Captions).with_lang("en");
        session.load_caption_segments(&track).await;

        assert!(session.current_caption_segments().is_empty());
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_persist_and_restore_roundtrip() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let ctx = context(Some(hls_record()), fetcher);
        let storage = ctx.snapshot_storage.clone();

        let mut session = EditorSession::new("t1", "m1", ctx.clone());
        session.load().await;
        session.add_track(Track::new("a-new", "Added", TrackKind::Audio));
        assert_eq!(session.persist_local(), PersistOutcome::Saved);

        // A fresh session for the same identity sees the snapshot
        let mut fresh = EditorSession::new(
            "t1",
            "m1",
            EditorContext {
                snapshot_storage: storage,
                ..ctx
            },
        );
        assert_eq!(fresh.restore_local(), RestoreOutcome::Restored);
        assert_eq!(fresh.store().working_copy().audio.len(), 1);
        assert!(!fresh.store().has_unsaved());
    }

    #[tokio::test]
    async fn test_restore_without_snapshot_reports_not_found() {
        let mut session =
            EditorSession::new("t1", "m1", context(Some(hls_record()), FakeFetcher::new()));
        assert_eq!(session.restore_local(), RestoreOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_transcode_success_reloads_manifest() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let ctx = context_with_workflow(
            Some(hls_record()),
            fetcher,
            MockWorkflowClient::with_states(vec![
                ExecutionState::Active,
                ExecutionState::Succeeded,
            ]),
        );
        let mut session = EditorSession::new("t1", "m1", ctx);
        session.load().await;

        // Divergent working copy gets replaced by the post-transcode reload
        session.store_mut().set_working_copy(Manifest::default());

        let job = session.transcode_to_hls().await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(session.store().working_copy().video.len(), 1);
        assert!(!session.store().has_unsaved());
    }

    #[tokio::test]
    async fn test_transcode_failure_does_not_reload() {
        let fetcher = FakeFetcher::new().with_body(MASTER_URL, MASTER_PLAYLIST);
        let ctx = context_with_workflow(
            Some(hls_record()),
            fetcher,
            MockWorkflowClient::with_states(vec![ExecutionState::Failed]),
        );
        let mut session = EditorSession::new("t1", "m1", ctx);
        session.load().await;
        session.store_mut().set_working_copy(Manifest::default());

        let job = session.transcode_to_hls().await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        // Working copy untouched by any reload
        assert!(session.store().working_copy().is_empty());
        assert!(session.store().has_unsaved());
    }
}
