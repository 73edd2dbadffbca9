//! Tolerant M3U playlist parser.
//!
//! Every `#EXTINF:` line opens an entry. Directive lines that follow it are
//! kept verbatim as auxiliary metadata, and the first non-directive line is
//! the stream URL. Entries that never reach a URL are dropped.

use epgsync_models::ChannelEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

const EXTINF_PREFIX: &str = "#EXTINF:";
const HEADER_PREFIX: &str = "#EXTM3U";

static TVG_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"tvg-id="([^"]+)""#).unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlaylist {
    pub entries: Vec<ChannelEntry>,
    /// `#EXTINF` blocks that ended without a stream URL
    pub incomplete: usize,
    pub header: Option<String>,
}

/// Parse playlist text into channel entries.
pub fn parse_playlist(content: &str) -> Vec<ChannelEntry> {
    parse_playlist_report(content).entries
}

/// Parse playlist text, also reporting dropped entries and the header line.
pub fn parse_playlist_report(content: &str) -> ParsedPlaylist {
    let mut parsed = ParsedPlaylist::default();
    let mut pending: Option<Vec<String>> = None;

    for raw in content.lines() {
        let line = raw.trim();

        if line.starts_with(EXTINF_PREFIX) {
            if let Some(metadata) = pending.take() {
                trace!("Dropping entry without stream URL: {}", metadata[0]);
                parsed.incomplete += 1;
            }
            pending = Some(vec![line.to_string()]);
            continue;
        }

        let Some(metadata) = pending.as_mut() else {
            if parsed.header.is_none() && parsed.entries.is_empty() && line.starts_with(HEADER_PREFIX) {
                parsed.header = Some(line.to_string());
            }
            continue;
        };

        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') {
            metadata.push(line.to_string());
            continue;
        }

        if let Some(metadata_lines) = pending.take() {
            parsed.entries.push(ChannelEntry {
                tvg_id: extract_tvg_id(&metadata_lines[0]),
                metadata_lines,
                stream_url: line.to_string(),
            });
        }
    }

    if pending.is_some() {
        parsed.incomplete += 1;
    }

    debug!(
        "Parsed playlist: {} entries, {} incomplete",
        parsed.entries.len(),
        parsed.incomplete
    );

    parsed
}

/// Value of the `tvg-id` attribute on an `#EXTINF` line.
pub fn extract_tvg_id(info_line: &str) -> Option<String> {
    TVG_ID
        .captures(info_line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
