use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::catalog_node::CatalogNode;

/// Attribute carrying the identifier a playlist `tvg-id` is matched against.
pub const XMLTV_ID_ATTRIBUTE: &str = "xmltv_id";

/// Tag of a channel definition inside a provider document.
pub const CHANNEL_TAG: &str = "channel";

/// A `<channel>` node from a provider document plus where it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDefinition {
    pub xmltv_id: String,
    pub node: CatalogNode,
    /// Provider directory name (e.g. `tvguide.com`)
    pub provider: String,
    pub document: PathBuf,
}

impl ChannelDefinition {
    /// Build a definition from a node, if it is a channel with a non-empty id.
    pub fn from_node(node: &CatalogNode, provider: &str, document: PathBuf) -> Option<Self> {
        if node.tag != CHANNEL_TAG {
            return None;
        }
        let xmltv_id = node.attribute(XMLTV_ID_ATTRIBUTE)?;
        if xmltv_id.is_empty() {
            return None;
        }
        Some(Self {
            xmltv_id: xmltv_id.to_string(),
            node: node.clone(),
            provider: provider.to_string(),
            document,
        })
    }

    pub fn site(&self) -> Option<&str> {
        self.node.attribute("site")
    }
}
