//! HLS Multi-Variant Playlist Parser
//!
//! Line-oriented parser for multi-variant playlists. Two directive kinds
//! matter here:
//!
//! - `#EXT-X-STREAM-INF` followed by a non-directive line produces a video
//!   rendition track
//! - `#EXT-X-MEDIA` with `TYPE=AUDIO` or `TYPE=SUBTITLES` produces an audio
//!   or captions track
//!
//! The parser is best-effort and never fails: malformed attribute lists
//! degrade to missing values and unresolvable references are passed through
//! verbatim.

use tracing::debug;
use url::Url;

use super::{Manifest, Track, TrackKind};

/// Parses multi-variant playlist text into a classified track manifest.
///
/// Relative references are resolved against `base_url`; track IDs are
/// synthesized from kind and line index and are not stable across re-parses
/// if line positions shift.
pub fn parse_playlist(text: &str, base_url: &str) -> Manifest {
    let mut manifest = Manifest::default();

    let lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("#EXT-X-STREAM-INF") {
            let uri = lines.get(i + 1).copied().unwrap_or("");
            if uri.is_empty() || uri.starts_with('#') {
                // Stream directive with no following URI line
                debug!("stream-inf at line {} has no URI line, skipping", i);
                continue;
            }

            let label = resolution_label(line).unwrap_or_else(|| {
                if manifest.video.is_empty() {
                    "Variant".to_string()
                } else {
                    format!("Variant {}", manifest.video.len() + 1)
                }
            });

            manifest.video.push(
                Track::new(&format!("video-{}", i), &label, TrackKind::Video)
                    .with_url(absolutize(base_url, uri)),
            );
            continue;
        }

        if line.starts_with("#EXT-X-MEDIA") {
            let attrs = parse_attributes(line);
            let media_type = attr_value(&attrs, "TYPE").unwrap_or_default();

            let kind = match media_type.to_ascii_uppercase().as_str() {
                "AUDIO" => TrackKind::Audio,
                "SUBTITLES" => TrackKind::Captions,
                other => {
                    // Unknown media types (e.g. CLOSED-CAPTIONS) are ignored
                    debug!("ignoring media directive with TYPE={}", other);
                    continue;
                }
            };

            let label = attr_quoted(&attrs, "NAME")
                .unwrap_or_else(|| media_type.to_ascii_lowercase());

            let mut track = Track::new(&format!("{}-{}", kind, i), &label, kind);
            if let Some(lang) = attr_quoted(&attrs, "LANGUAGE") {
                track = track.with_lang(lang);
            }
            if let Some(uri) = attr_quoted(&attrs, "URI") {
                track = track.with_url(absolutize(base_url, &uri));
            }

            manifest.list_mut(kind).push(track);
        }
    }

    manifest
}

// =============================================================================
// Attribute Lists
// =============================================================================

/// One attribute value, preserving whether the source was quoted
#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrValue {
    Quoted(String),
    Raw(String),
}

/// Tokenizes the attribute list following the directive's first `:`.
///
/// Quote-aware: commas inside quoted values do not split. An attribute whose
/// closing quote is missing is dropped rather than producing a bogus value.
fn parse_attributes(line: &str) -> Vec<(String, AttrValue)> {
    let list = match line.split_once(':') {
        Some((_, rest)) => rest,
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    let mut chars = list.chars().peekable();

    loop {
        // Key up to '='
        let mut key = String::new();
        for c in chars.by_ref() {
            if c == '=' {
                break;
            }
            key.push(c);
        }
        let key = key.trim().to_string();
        if key.is_empty() {
            break;
        }

        match chars.peek() {
            Some('"') => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    value.push(c);
                }
                if closed {
                    out.push((key, AttrValue::Quoted(value)));
                }
                // Skip the separator after the closing quote
                if chars.peek() == Some(&',') {
                    chars.next();
                }
            }
            _ => {
                let mut value = String::new();
                for c in chars.by_ref() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                }
                out.push((key, AttrValue::Raw(value.trim().to_string())));
            }
        }

        if chars.peek().is_none() {
            break;
        }
    }

    out
}

/// Looks up an attribute regardless of quoting
fn attr_value(attrs: &[(String, AttrValue)], name: &str) -> Option<String> {
    attrs.iter().find(|(k, _)| k == name).map(|(_, v)| match v {
        AttrValue::Quoted(s) | AttrValue::Raw(s) => s.clone(),
    })
}

/// Looks up an attribute that must be quoted in the source
fn attr_quoted(attrs: &[(String, AttrValue)], name: &str) -> Option<String> {
    attrs.iter().find(|(k, _)| k == name).and_then(|(_, v)| match v {
        AttrValue::Quoted(s) => Some(s.clone()),
        AttrValue::Raw(_) => None,
    })
}

/// Derives a rendition label from a `RESOLUTION=WxH` attribute (`"{H}p"`)
fn resolution_label(line: &str) -> Option<String> {
    let attrs = parse_attributes(line);
    let resolution = attr_value(&attrs, "RESOLUTION")?;
    let (_, height) = resolution.split_once('x')?;
    if height.is_empty() {
        return None;
    }
    Some(format!("{}p", height))
}

// =============================================================================
// Reference Resolution
// =============================================================================

/// Joins `uri` against `base` using hierarchical-URL resolution; an absolute
/// `uri` wins. On any resolution failure the reference passes through
/// verbatim.
fn absolutize(base: &str, uri: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(uri)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => uri.to_string(),
    }
}

// =============================================================================
// Tests
// =============================================================================
