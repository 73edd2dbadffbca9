use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use crate::error::SourceError;

/// Where the input playlist comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistSource {
    File(PathBuf),
    Url(String),
}

impl PlaylistSource {
    pub fn parse(source: &str) -> Result<Self, SourceError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SourceError::InvalidSource("playlist source is empty".to_string()));
        }
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Ok(PlaylistSource::Url(source.to_string()))
        } else if let Some(path) = source.strip_prefix("file://") {
            Ok(PlaylistSource::File(PathBuf::from(path)))
        } else if lower.contains("://") {
            Err(SourceError::InvalidSource(format!("unsupported scheme in {}", source)))
        } else {
            Ok(PlaylistSource::File(PathBuf::from(source)))
        }
    }
}

impl fmt::Display for PlaylistSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistSource::File(path) => write!(f, "{}", path.display()),
            PlaylistSource::Url(url) => write!(f, "{}", url),
        }
    }
}

#[async_trait]
pub trait PlaylistLoader: Send + Sync {
    /// Stable description of the source, used as part of the match cache key
    fn describe(&self) -> String;

    async fn load(&self) -> Result<String, SourceError>;
}

pub struct FilePlaylistLoader {
    path: PathBuf,
}

impl FilePlaylistLoader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PlaylistLoader for FilePlaylistLoader {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<String, SourceError> {
        debug!("Reading playlist from {:?}", self.path);
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

pub struct HttpPlaylistLoader {
    url: String,
    timeout: Duration,
}

impl HttpPlaylistLoader {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

#[async_trait]
impl PlaylistLoader for HttpPlaylistLoader {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<String, SourceError> {
        let http_error = |source| SourceError::Http {
            url: self.url.clone(),
            source,
        };

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http_error)?;

        info!("Downloading playlist from {}", self.url);
        let response = client.get(&self.url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(http_error)?;
        debug!("Downloaded {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}

/// Loader matching the kind of source.
pub fn loader_for(source: &PlaylistSource, timeout: Duration) -> Box<dyn PlaylistLoader> {
    match source {
        PlaylistSource::File(path) => Box::new(FilePlaylistLoader::new(path.clone())),
        PlaylistSource::Url(url) => Box::new(HttpPlaylistLoader::new(url.clone(), timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            PlaylistSource::parse("https://iptv-org.github.io/iptv/countries/us.m3u").unwrap(),
            PlaylistSource::Url("https://iptv-org.github.io/iptv/countries/us.m3u".to_string())
        );
        assert_eq!(
            PlaylistSource::parse("./lists/us.m3u").unwrap(),
            PlaylistSource::File(PathBuf::from("./lists/us.m3u"))
        );
        assert_eq!(
            PlaylistSource::parse("file:///srv/us.m3u").unwrap(),
            PlaylistSource::File(PathBuf::from("/srv/us.m3u"))
        );
        assert!(PlaylistSource::parse("ftp://example.com/us.m3u").is_err());
        assert!(PlaylistSource::parse("   ").is_err());
    }

    #[tokio::test]
    async fn test_file_loader_reads_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("us.m3u");
        std::fs::write(&path, "#EXTM3U\n").unwrap();

        let loader = loader_for(&PlaylistSource::File(path.clone()), Duration::from_secs(5));
        assert_eq!(loader.load().await.unwrap(), "#EXTM3U\n");
        assert_eq!(loader.describe(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_file_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FilePlaylistLoader::new(dir.path().join("missing.m3u"));
        assert!(matches!(loader.load().await, Err(SourceError::Io { .. })));
    }
}
