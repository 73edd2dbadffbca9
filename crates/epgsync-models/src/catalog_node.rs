use serde::{Deserialize, Serialize};

/// Element of a catalog document.
///
/// Attributes keep document order so a node written back out is byte-stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CatalogNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CatalogNode>,
}

impl CatalogNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: CatalogNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Depth-first, document-order walk over every descendant (not `self`).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a CatalogNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a CatalogNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descendants_document_order() {
        let root = CatalogNode::new("site")
            .with_child(
                CatalogNode::new("channels")
                    .with_child(CatalogNode::new("channel").with_attribute("xmltv_id", "a"))
                    .with_child(CatalogNode::new("channel").with_attribute("xmltv_id", "b")),
            )
            .with_child(CatalogNode::new("channel").with_attribute("xmltv_id", "c"));

        let tags: Vec<(&str, Option<&str>)> = root
            .descendants()
            .map(|n| (n.tag.as_str(), n.attribute("xmltv_id")))
            .collect();
        assert_eq!(
            tags,
            vec![
                ("channels", None),
                ("channel", Some("a")),
                ("channel", Some("b")),
                ("channel", Some("c")),
            ]
        );
    }

    #[test]
    fn test_tree_survives_json() {
        let node = CatalogNode::new("channel")
            .with_attribute("site", "tvguide.com")
            .with_attribute("lang", "en")
            .with_attribute("xmltv_id", "abc.us")
            .with_text("ABC & Friends");

        let json = serde_json::to_string(&node).unwrap();
        let restored: CatalogNode = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, node);
        assert_eq!(restored.attributes[0].0, "site");
    }
}
