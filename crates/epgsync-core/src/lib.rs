pub mod error;
pub mod matching;
pub mod cache;
pub mod freshness;
pub mod writer;
pub mod pipeline;

pub use error::CoreError;
pub use matching::{match_against_root, match_channels, open_catalog};
pub use cache::{format_age, MatchCache};
pub use freshness::{modified_at, Freshness, GuideFreshness};
pub use writer::{render_channels_document, render_playlist, ReportWriter, WrittenOutputs, PLAYLIST_HEADER};
pub use pipeline::{GenerationOutcome, GenerationRequest, GuideGenerator, GuideSyncOrchestrator, NoopObserver, RunObserver, RunOptions, RunReport, RunStage};
