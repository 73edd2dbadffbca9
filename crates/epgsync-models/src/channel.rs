use serde::{Deserialize, Serialize};

/// One playlist channel as it appeared in the source M3U.
///
/// `metadata_lines` holds the `#EXTINF` line first, followed by any auxiliary
/// directives (`#EXTVLCOPT`, `#KODIPROP`, ...) exactly as read, trimmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelEntry {
    pub tvg_id: Option<String>,
    pub metadata_lines: Vec<String>,
    pub stream_url: String,
}

impl ChannelEntry {
    /// Primary `#EXTINF` line.
    pub fn info_line(&self) -> &str {
        self.metadata_lines.first().map(String::as_str).unwrap_or_default()
    }

    /// Text after the last comma of the info line, used for log output.
    pub fn display_name(&self) -> Option<&str> {
        let info = self.info_line();
        let (_, name) = info.rsplit_once(',')?;
        let name = name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// The entry exactly as it appeared, one line per element.
    pub fn full_entry(&self) -> String {
        let mut entry = self.metadata_lines.join("\n");
        entry.push('\n');
        entry.push_str(&self.stream_url);
        entry
    }

    /// Label for diagnostics: the tvg-id, otherwise the display name.
    pub fn label(&self) -> &str {
        self.tvg_id
            .as_deref()
            .or_else(|| self.display_name())
            .unwrap_or(&self.stream_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lines: &[&str], url: &str) -> ChannelEntry {
        ChannelEntry {
            tvg_id: Some("abc.us".to_string()),
            metadata_lines: lines.iter().map(|l| l.to_string()).collect(),
            stream_url: url.to_string(),
        }
    }

    #[test]
    fn test_full_entry_joins_lines() {
        let channel = entry(
            &[
                "#EXTINF:-1 tvg-id=\"abc.us\",ABC",
                "#EXTVLCOPT:http-user-agent=Mozilla",
            ],
            "http://example.com/abc.m3u8",
        );
        assert_eq!(
            channel.full_entry(),
            "#EXTINF:-1 tvg-id=\"abc.us\",ABC\n#EXTVLCOPT:http-user-agent=Mozilla\nhttp://example.com/abc.m3u8"
        );
    }

    #[test]
    fn test_display_name() {
        let channel = entry(&["#EXTINF:-1 tvg-id=\"abc.us\" group-title=\"News, Local\",ABC East"], "http://x");
        assert_eq!(channel.display_name(), Some("ABC East"));

        let unnamed = entry(&["#EXTINF:-1 tvg-id=\"abc.us\","], "http://x");
        assert_eq!(unnamed.display_name(), None);
        assert_eq!(unnamed.label(), "abc.us");
    }
}
