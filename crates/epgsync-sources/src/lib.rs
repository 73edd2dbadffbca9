pub mod error;
pub mod playlist;
pub mod document;
pub mod catalog;
pub mod loader;

pub use error::{DocumentError, SourceError};
pub use playlist::{parse_playlist, parse_playlist_report, ParsedPlaylist};
pub use document::{channel_definitions, load_document, parse_document, write_channels_document};
pub use catalog::{discover_definition_files, CatalogReport, DuplicateDefinition, IndexedCatalog, ScanningCatalog, SkippedDocument, SourceCatalog};
pub use loader::{loader_for, FilePlaylistLoader, HttpPlaylistLoader, PlaylistLoader, PlaylistSource};
