//! Caption Format Codec
//!
//! Bidirectional conversion between SRT/WebVTT text and ordered
//! [`CaptionSegment`] sequences.
//!
//! The two formats differ only in header line, timestamp decimal separator
//! (`.` for VTT, `,` for SRT), and block conventions (SRT carries explicit
//! index lines). Parsing is tolerant: blocks without a valid timestamp line
//! are skipped, and segment IDs are reassigned sequentially starting at 1
//! regardless of any index found in the source text.

use tracing::debug;

use super::CaptionSegment;
use crate::core::TimeSec;

// =============================================================================
// Format Selection
// =============================================================================

/// Supported caption text formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptionFormat {
    /// SubRip: comma decimal separator, indexed blocks
    Srt,
    /// WebVTT: dot decimal separator, `WEBVTT` header
    Vtt,
}

impl CaptionFormat {
    /// Guesses the format from a file URL or name; defaults to VTT
    pub fn from_url(url: &str) -> Self {
        let clean = url.split('?').next().unwrap_or("");
        if clean.to_ascii_lowercase().ends_with(".srt") {
            CaptionFormat::Srt
        } else {
            CaptionFormat::Vtt
        }
    }

    fn decimal_separator(&self) -> char {
        match self {
            CaptionFormat::Srt => ',',
            CaptionFormat::Vtt => '.',
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses caption text into an ordered segment sequence.
///
/// Never fails; unparseable blocks are dropped. Blocks whose end time does
/// not exceed their start time are dropped too, preserving the segment
/// invariant.
pub fn parse_captions(format: CaptionFormat, text: &str) -> Vec<CaptionSegment> {
    let mut segments = Vec::new();

    for block in blocks(format, text) {
        let Some((ts_idx, start, end)) = find_timestamp_line(&block) else {
            debug!("caption block without valid timestamp line, skipping");
            continue;
        };
        if end <= start || start < 0.0 {
            debug!("caption block with invalid time range {}~{}, skipping", start, end);
            continue;
        }

        let text = match format {
            CaptionFormat::Srt => block[ts_idx + 1..].join("\n"),
            CaptionFormat::Vtt => block[ts_idx + 1..]
                .iter()
                .map(|l| strip_vtt_tags(l))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        let id = (segments.len() + 1).to_string();
        segments.push(CaptionSegment::new(&id, start, end, &text));
    }

    segments
}

/// Splits the document into blank-line-delimited blocks, dropping any VTT
/// header section
fn blocks(format: CaptionFormat, text: &str) -> Vec<Vec<String>> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r')).peekable();

    if format == CaptionFormat::Vtt {
        // WEBVTT header plus any metadata lines up to the first blank line
        if lines.peek().is_some_and(|l| l.starts_with("WEBVTT")) {
            for line in lines.by_ref() {
                if line.trim().is_empty() {
                    break;
                }
            }
        }
    }

    let mut out = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Finds the first line containing `-->` in a block and parses its pair of
/// timestamps. VTT cue settings after the end timestamp are ignored.
fn find_timestamp_line(block: &[String]) -> Option<(usize, TimeSec, TimeSec)> {
    for (idx, line) in block.iter().enumerate() {
        if !line.contains("-->") {
            continue;
        }
        let (start_str, end_str) = line.split_once("-->")?;
        let start = parse_timestamp(start_str.trim())?;
        let end_str = end_str.trim();
        let end_str = end_str.split_whitespace().next().unwrap_or(end_str);
        let end = parse_timestamp(end_str)?;
        return Some((idx, start, end));
    }
    None
}

/// Parses `HH:MM:SS[.,]mmm` (or the two-component `MM:SS[.,]mmm`) into
/// seconds
fn parse_timestamp(ts: &str) -> Option<TimeSec> {
    let normalized = ts.replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let numbers: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
    match numbers?.as_slice() {
        [minutes, seconds] => Some(minutes * 60.0 + seconds),
        [hours, minutes, seconds] => Some(hours * 3600.0 + minutes * 60.0 + seconds),
        _ => None,
    }
}

/// Strips `<...>` formatting tags from VTT cue text
fn strip_vtt_tags(text: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

// =============================================================================
// Serialization
// =============================================================================

/// Serializes segments back to caption text.
///
/// Round-trip fidelity holds structurally: parsing the output yields the
/// same (start, end, text) triples, though not necessarily byte-identical
/// source text.
pub fn serialize_captions(format: CaptionFormat, segments: &[CaptionSegment]) -> String {
    let mut output = String::new();
    if format == CaptionFormat::Vtt {
        output.push_str("WEBVTT\n\n");
    }

    for (index, segment) in segments.iter().enumerate() {
        if format == CaptionFormat::Srt {
            output.push_str(&format!("{}\n", index + 1));
        }

        let sep = format.decimal_separator();
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(segment.start, sep),
            format_timestamp(segment.end, sep)
        ));

        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output.trim_end().to_string()
}

/// Formats seconds as `HH:MM:SS{sep}mmm` with zero padding.
///
/// Works in total milliseconds so a rounded-up millisecond component carries
/// into the whole-second fields instead of printing `1000`.
fn format_timestamp(seconds: TimeSec, sep: char) -> String {
    let total_ms = (seconds * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, mins, secs, sep, ms)
}

// =============================================================================
// Tests
// =============================================================================
