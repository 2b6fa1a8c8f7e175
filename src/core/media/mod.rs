//! Media Service Module
//!
//! External-facing interfaces consumed by the editor: the media record
//! lookup, the CDN URL rewriter, and the manifest/caption text fetcher.
//! Each seam is a trait with an HTTP implementation so tests can substitute
//! in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::core::{CoreError, CoreResult, MediaId};

// =============================================================================
// Media Record
// =============================================================================

/// A media asset record as returned by the catalog service.
///
/// All delivery fields are optional; the effective URL is `file_url` falling
/// back to `url`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Opaque asset identifier
    pub id: MediaId,
    /// Primary delivery URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Legacy delivery URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Declared container/packaging format (e.g. `"m3u8"`, `"mp4"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Declared MIME content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MediaRecord {
    /// Returns the effective delivery URL (`file_url` wins over `url`)
    pub fn effective_url(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or(self.url.as_deref().filter(|u| !u.is_empty()))
    }
}

// =============================================================================
// Media Service
// =============================================================================

/// Media record lookup
#[async_trait]
pub trait MediaService: Send + Sync {
    /// Fetches the media record for an asset identifier
    async fn get_media(&self, id: &str) -> CoreResult<MediaRecord>;
}

/// HTTP-backed media service talking to the catalog API
pub struct HttpMediaService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMediaService {
    /// Creates a service rooted at the catalog API base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl MediaService for HttpMediaService {
    async fn get_media(&self, id: &str) -> CoreResult<MediaRecord> {
        let url = format!("{}/media/{}", self.base_url.trim_end_matches('/'), id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::FetchFailed(format!("media lookup: {}", e)))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CoreError::MediaNotFound(id.to_string()));
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| CoreError::FetchFailed(format!("media lookup: {}", e)))?;

        resp.json::<MediaRecord>()
            .await
            .map_err(|e| CoreError::FetchFailed(format!("media record body: {}", e)))
    }
}

// =============================================================================
// CDN Resolver
// =============================================================================

/// Rewrites delivery URLs through a CDN before fetching
pub trait CdnResolver: Send + Sync {
    /// Maps an origin URL to the URL that should actually be fetched
    fn resolve(&self, url: &str) -> String;
}

/// Pass-through resolver (no CDN rewriting)
#[derive(Clone, Debug, Default)]
pub struct IdentityCdn;

impl CdnResolver for IdentityCdn {
    fn resolve(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Rewrites URLs under a configured origin prefix onto a CDN host
#[derive(Clone, Debug)]
pub struct PrefixCdn {
    origin_prefix: String,
    cdn_prefix: String,
}

impl PrefixCdn {
    pub fn new(origin_prefix: impl Into<String>, cdn_prefix: impl Into<String>) -> Self {
        Self {
            origin_prefix: origin_prefix.into(),
            cdn_prefix: cdn_prefix.into(),
        }
    }
}

impl CdnResolver for PrefixCdn {
    fn resolve(&self, url: &str) -> String {
        match url.strip_prefix(&self.origin_prefix) {
            Some(rest) => format!("{}{}", self.cdn_prefix, rest),
            None => url.to_string(),
        }
    }
}

// =============================================================================
// Manifest Fetcher
// =============================================================================

/// Raw text fetch for playlist and caption files
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetches the text body at a resolved URL
    async fn fetch_text(&self, url: &str) -> CoreResult<String>;
}

/// HTTP text fetcher routing requests through a [`CdnResolver`]
pub struct HttpManifestFetcher {
    client: reqwest::Client,
    cdn: Arc<dyn CdnResolver>,
}

impl HttpManifestFetcher {
    pub fn new(cdn: Arc<dyn CdnResolver>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cdn,
        }
    }
}

impl Default for HttpManifestFetcher {
    fn default() -> Self {
        Self::new(Arc::new(IdentityCdn))
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch_text(&self, url: &str) -> CoreResult<String> {
        let fetch_url = self.cdn.resolve(url);
        debug!("fetching manifest text from {}", fetch_url);

        let resp = self
            .client
            .get(&fetch_url)
            .send()
            .await
            .map_err(|e| CoreError::FetchFailed(format!("manifest fetch: {}", e)))?
            .error_for_status()
            .map_err(|e| CoreError::FetchFailed(format!("manifest fetch: {}", e)))?;

        resp.text()
            .await
            .map_err(|e| CoreError::FetchFailed(format!("manifest body: {}", e)))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_url_prefers_file_url() {
        let record = MediaRecord {
            id: "m1".to_string(),
            file_url: Some("https://origin.example/a.m3u8".to_string()),
            url: Some("https://origin.example/b.mp4".to_string()),
            ..Default::default()
        };
        assert_eq!(
            record.effective_url(),
            Some("https://origin.example/a.m3u8")
        );
    }

    #[test]
    fn test_effective_url_falls_back_and_skips_empty() {
        let record = MediaRecord {
            id: "m1".to_string(),
            file_url: Some(String::new()),
            url: Some("https://origin.example/b.mp4".to_string()),
            ..Default::default()
        };
        assert_eq!(record.effective_url(), Some("https://origin.example/b.mp4"));

        let empty = MediaRecord {
            id: "m2".to_string(),
            ..Default::default()
        };
        assert_eq!(empty.effective_url(), None);
    }

    #[test]
    fn test_prefix_cdn_rewrites_matching_urls() {
        let cdn = PrefixCdn::new("https://origin.example/", "https://cdn.example/");
        assert_eq!(
            cdn.resolve("https://origin.example/show/master.m3u8"),
            "https://cdn.example/show/master.m3u8"
        );
        // Non-matching URLs pass through
        assert_eq!(
            cdn.resolve("https://elsewhere.example/x.mp4"),
            "https://elsewhere.example/x.mp4"
        );
    }

    #[test]
    fn test_identity_cdn_is_passthrough() {
        assert_eq!(
            IdentityCdn.resolve("https://origin.example/a"),
            "https://origin.example/a"
        );
    }
}
