use serde::{Deserialize, Serialize};
use crate::channel::ChannelEntry;
use crate::definition::ChannelDefinition;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchStats {
    pub total: usize,
    pub matched: usize,
    /// Channels without a tvg-id
    pub skipped: usize,
    /// Channels whose tvg-id has no catalog definition
    pub removed: usize,
}

/// Outcome of reconciling a playlist against the catalog.
///
/// `matched_definitions[i]` is the definition for `matched_channels[i]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchResult {
    pub matched_channels: Vec<ChannelEntry>,
    pub matched_definitions: Vec<ChannelDefinition>,
    pub stats: MatchStats,
}

impl MatchResult {
    pub fn push_match(&mut self, channel: ChannelEntry, definition: ChannelDefinition) {
        self.matched_channels.push(channel);
        self.matched_definitions.push(definition);
        self.stats.matched += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.matched_channels.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.matched_channels.len()
    }

    pub fn definition_for(&self, xmltv_id: &str) -> Option<&ChannelDefinition> {
        self.matched_definitions.iter().find(|d| d.xmltv_id == xmltv_id)
    }

    /// Pairs line up and identifiers agree.
    pub fn is_consistent(&self) -> bool {
        self.matched_channels.len() == self.matched_definitions.len()
            && self
                .matched_channels
                .iter()
                .zip(&self.matched_definitions)
                .all(|(c, d)| c.tvg_id.as_deref() == Some(d.xmltv_id.as_str()))
    }

    /// Definitions with each identifier kept once, first occurrence wins.
    pub fn distinct_definitions(&self) -> Vec<&ChannelDefinition> {
        let mut seen = std::collections::HashSet::new();
        self.matched_definitions
            .iter()
            .filter(|d| seen.insert(d.xmltv_id.as_str()))
            .collect()
    }
}
