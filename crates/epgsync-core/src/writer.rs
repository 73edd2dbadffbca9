use epgsync_models::MatchResult;
use epgsync_sources::write_channels_document;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::CoreError;

/// Header line of every extended M3U playlist.
pub const PLAYLIST_HEADER: &str = "#EXTM3U";

/// Filtered playlist: the header, then each matched entry verbatim.
pub fn render_playlist(result: &MatchResult) -> String {
    let mut playlist = String::from(PLAYLIST_HEADER);
    playlist.push('\n');
    for channel in &result.matched_channels {
        playlist.push_str(&channel.full_entry());
        playlist.push('\n');
    }
    playlist
}

/// Catalog subset handed to the guide generator, one node per identifier.
pub fn render_channels_document(result: &MatchResult) -> Result<String, CoreError> {
    let definitions = result.distinct_definitions();
    Ok(write_channels_document(definitions.into_iter().map(|d| &d.node))?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenOutputs {
    pub playlist: PathBuf,
    pub channels: PathBuf,
    pub channel_count: usize,
    pub definition_count: usize,
}

pub struct ReportWriter {
    playlist_path: PathBuf,
    channels_path: PathBuf,
}

impl ReportWriter {
    pub fn new(playlist_path: PathBuf, channels_path: PathBuf) -> Self {
        Self {
            playlist_path,
            channels_path,
        }
    }

    pub fn playlist_path(&self) -> &Path {
        &self.playlist_path
    }

    pub fn channels_path(&self) -> &Path {
        &self.channels_path
    }

    /// Render both outputs first, then write them; a render failure leaves disk untouched.
    pub fn write(&self, result: &MatchResult) -> Result<WrittenOutputs, CoreError> {
        let playlist = render_playlist(result);
        let channels = render_channels_document(result)?;

        write_atomic(&self.playlist_path, playlist.as_bytes())?;
        info!(
            "Saved filtered playlist with {} channels to {:?}",
            result.matched_count(),
            self.playlist_path
        );

        write_atomic(&self.channels_path, channels.as_bytes())?;
        let definition_count = result.distinct_definitions().len();
        info!(
            "Saved {} channel definitions to {:?}",
            definition_count, self.channels_path
        );

        Ok(WrittenOutputs {
            playlist: self.playlist_path.clone(),
            channels: self.channels_path.clone(),
            channel_count: result.matched_count(),
            definition_count,
        })
    }

    /// Delete written outputs; returns the paths actually removed.
    pub fn remove_outputs(&self) -> Result<Vec<PathBuf>, CoreError> {
        let mut removed = Vec::new();
        for path in [&self.playlist_path, &self.channels_path] {
            if path.exists() {
                std::fs::remove_file(path).map_err(|e| CoreError::write(path, e))?;
                removed.push(path.clone());
            }
        }
        Ok(removed)
    }
}

/// Write to a sibling temp file and rename over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::write(parent, e))?;
    }

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    std::fs::write(&temp_path, contents).map_err(|e| CoreError::write(&temp_path, e))?;
    std::fs::rename(&temp_path, path).map_err(|e| CoreError::write(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use epgsync_models::{CatalogNode, ChannelDefinition, ChannelEntry};

    fn entry(id: &str, extra: &[&str]) -> ChannelEntry {
        let mut metadata_lines = vec![format!("#EXTINF:-1 tvg-id=\"{}\" group-title=\"News\",{}", id, id.to_uppercase())];
        metadata_lines.extend(extra.iter().map(|l| l.to_string()));
        ChannelEntry {
            tvg_id: Some(id.to_string()),
            metadata_lines,
            stream_url: format!("http://streams.example.com/{}.m3u8", id),
        }
    }

    fn definition(id: &str) -> ChannelDefinition {
        ChannelDefinition {
            xmltv_id: id.to_string(),
            node: CatalogNode::new("channel")
                .with_attribute("site", "example.com")
                .with_attribute("lang", "en")
                .with_attribute("xmltv_id", id)
                .with_attribute("site_id", "7")
                .with_text(id.to_uppercase()),
            provider: "example.com".to_string(),
            document: PathBuf::from("sites/example.com/example.com.channels.xml"),
        }
    }

    fn abc_only() -> MatchResult {
        let mut result = MatchResult::default();
        result.stats.total = 2;
        result.stats.removed = 1;
        result.push_match(entry("abc", &["#EXTVLCOPT:http-referrer=http://example.com/"]), definition("abc"));
        result
    }

    #[test]
    fn test_render_playlist_keeps_entries_verbatim() {
        let rendered = render_playlist(&abc_only());
        assert_eq!(
            rendered,
            "#EXTM3U\n\
             #EXTINF:-1 tvg-id=\"abc\" group-title=\"News\",ABC\n\
             #EXTVLCOPT:http-referrer=http://example.com/\n\
             http://streams.example.com/abc.m3u8\n"
        );
        assert!(!rendered.contains("xyz"));
    }

    #[test]
    fn test_render_empty_playlist_is_header_only() {
        assert_eq!(render_playlist(&MatchResult::default()), "#EXTM3U\n");
    }

    #[test]
    fn test_channels_document_dedupes_identifiers() {
        let mut result = abc_only();
        result.push_match(entry("abc", &[]), definition("abc"));
        result.push_match(entry("nbc", &[]), definition("nbc"));

        let rendered = render_channels_document(&result).unwrap();
        assert_eq!(rendered.matches("xmltv_id=\"abc\"").count(), 1);
        assert_eq!(rendered.matches("<channel ").count(), 2);
        assert!(rendered.find("abc").unwrap() < rendered.find("nbc").unwrap());
        assert!(rendered.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(rendered.contains(
            "  <channel site=\"example.com\" lang=\"en\" xmltv_id=\"abc\" site_id=\"7\">ABC</channel>"
        ));
    }

    #[test]
    fn test_write_creates_directories_and_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(
            dir.path().join("playlist-filtered.m3u"),
            dir.path().join("epg-workspace").join("epg").join("channels.xml"),
        );

        let outputs = writer.write(&abc_only()).unwrap();
        assert_eq!(outputs.channel_count, 1);
        assert_eq!(outputs.definition_count, 1);

        let first_playlist = std::fs::read(&outputs.playlist).unwrap();
        let first_channels = std::fs::read(&outputs.channels).unwrap();
        writer.write(&abc_only()).unwrap();
        assert_eq!(std::fs::read(&outputs.playlist).unwrap(), first_playlist);
        assert_eq!(std::fs::read(&outputs.channels).unwrap(), first_channels);

        let channels = String::from_utf8(first_channels).unwrap();
        assert!(channels.contains("xmltv_id=\"abc\""));
        assert!(!channels.contains("xyz"));
        assert!(!dir.path().join("playlist-filtered.m3u.tmp").exists());
    }

    #[test]
    fn test_remove_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("out.m3u"), dir.path().join("channels.xml"));
        assert!(writer.remove_outputs().unwrap().is_empty());

        writer.write(&abc_only()).unwrap();
        assert_eq!(writer.remove_outputs().unwrap().len(), 2);
        assert!(!writer.playlist_path().exists());
        assert!(!writer.channels_path().exists());
    }
}
