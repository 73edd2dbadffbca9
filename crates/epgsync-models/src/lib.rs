pub mod channel;
pub mod catalog_node;
pub mod definition;
pub mod match_result;
pub mod cache_record;

pub use channel::ChannelEntry;
pub use catalog_node::CatalogNode;
pub use definition::{ChannelDefinition, CHANNEL_TAG, XMLTV_ID_ATTRIBUTE};
pub use match_result::{MatchResult, MatchStats};
pub use cache_record::{CacheKey, CacheRecord, CACHE_FORMAT_VERSION};
