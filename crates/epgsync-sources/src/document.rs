//! Catalog document reading and the `channels.xml` writer.
//!
//! Documents are read into [`CatalogNode`] trees with quick-xml. Only the
//! shape needed to find `<channel xmltv_id="...">` nodes is checked.

use epgsync_models::{CatalogNode, ChannelDefinition};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::{Path, PathBuf};
use crate::error::DocumentError;

/// Root element of the manifest handed to the guide generator.
pub const CHANNELS_ROOT_TAG: &str = "channels";

pub fn load_document(path: &Path) -> Result<CatalogNode, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

/// Parse XML text into its root node.
pub fn parse_document(content: &str) -> Result<CatalogNode, DocumentError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<CatalogNode> = Vec::new();
    let mut root: Option<CatalogNode> = None;

    loop {
        let position = reader.buffer_position() as u64;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(node_from_start(e, position)?);
            }
            Ok(Event::Empty(ref e)) => {
                let node = node_from_start(e, position)?;
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    attach(&mut stack, &mut root, node);
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| DocumentError::Xml {
                    position,
                    message: err.to_string(),
                })?;
                append_text(&mut stack, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(&mut stack, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DocumentError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            }
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(DocumentError::Unclosed(open.tag));
    }

    root.ok_or(DocumentError::Empty)
}

fn node_from_start(element: &BytesStart, position: u64) -> Result<CatalogNode, DocumentError> {
    let mut node = CatalogNode::new(String::from_utf8_lossy(element.name().as_ref()).into_owned());

    for attr in element.attributes() {
        let attr = attr.map_err(|err| DocumentError::Xml {
            position,
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| DocumentError::Xml {
            position,
            message: err.to_string(),
        })?;
        node.attributes.push((key, value.into_owned()));
    }

    Ok(node)
}

fn attach(stack: &mut [CatalogNode], root: &mut Option<CatalogNode>, node: CatalogNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        // Only the first top-level element counts as the document root
        None if root.is_none() => *root = Some(node),
        None => {}
    }
}

fn append_text(stack: &mut [CatalogNode], text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(node) = stack.last_mut() {
        match node.text.as_mut() {
            Some(existing) => existing.push_str(text),
            None => node.text = Some(text.to_string()),
        }
    }
}

/// Every `<channel>` below `root` that carries an `xmltv_id`, in document order.
pub fn channel_definitions(root: &CatalogNode, provider: &str, document: &Path) -> Vec<ChannelDefinition> {
    root.descendants()
        .filter_map(|node| ChannelDefinition::from_node(node, provider, PathBuf::from(document)))
        .collect()
}

/// Render the `<channels>` manifest: XML declaration, two-space indentation.
pub fn write_channels_document<'a, I>(nodes: I) -> Result<String, DocumentError>
where
    I: IntoIterator<Item = &'a CatalogNode>,
{
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    emit(&mut writer, Event::Start(BytesStart::new(CHANNELS_ROOT_TAG)))?;
    for node in nodes {
        write_node(&mut writer, node)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new(CHANNELS_ROOT_TAG)))?;

    let mut document = String::from_utf8(writer.into_inner())
        .map_err(|err| DocumentError::Write(err.to_string()))?;
    document.push('\n');
    Ok(document)
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &CatalogNode) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(node.tag.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_none() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    if let Some(text) = &node.text {
        emit(writer, Event::Text(BytesText::new(text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    emit(writer, Event::End(BytesEnd::new(node.tag.as_str())))
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), DocumentError> {
    writer
        .write_event(event)
        .map_err(|err| DocumentError::Write(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDER_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<channels>
  <!-- generated -->
  <channel site="tvguide.com" lang="en" xmltv_id="ABC.us" site_id="9233011364">ABC</channel>
  <channel site="tvguide.com" lang="en" xmltv_id="" site_id="1">Unmapped</channel>
  <channel site="tvguide.com" lang="en" xmltv_id="AT&amp;T.us" site_id="2">AT&amp;T SportsNet</channel>
  <channel site="tvguide.com" lang="en" site_id="3">No Id</channel>
</channels>
"#;

    #[test]
    fn test_parse_document_tree() {
        let root = parse_document(PROVIDER_DOC).unwrap();
        assert_eq!(root.tag, "channels");
        assert_eq!(root.children.len(), 4);

        let abc = &root.children[0];
        assert_eq!(abc.attribute("xmltv_id"), Some("ABC.us"));
        assert_eq!(abc.attribute("site_id"), Some("9233011364"));
        assert_eq!(abc.text.as_deref(), Some("ABC"));
        assert_eq!(abc.attributes[0], ("site".to_string(), "tvguide.com".to_string()));

        assert_eq!(root.children[2].attribute("xmltv_id"), Some("AT&T.us"));
        assert_eq!(root.children[2].text.as_deref(), Some("AT&T SportsNet"));
    }

    #[test]
    fn test_channel_definitions_skip_missing_ids() {
        let root = parse_document(PROVIDER_DOC).unwrap();
        let path = Path::new("sites/tvguide.com/tvguide.com.channels.xml");
        let defs = channel_definitions(&root, "tvguide.com", path);

        let ids: Vec<&str> = defs.iter().map(|d| d.xmltv_id.as_str()).collect();
        assert_eq!(ids, vec!["ABC.us", "AT&T.us"]);
        assert_eq!(defs[0].provider, "tvguide.com");
        assert_eq!(defs[0].document, path);
    }

    #[test]
    fn test_nested_channels_are_found() {
        let doc = r#"<site site="example.com"><channels><channel xmltv_id="Nested.us">N</channel></channels></site>"#;
        let root = parse_document(doc).unwrap();
        let defs = channel_definitions(&root, "example.com", Path::new("x.channels.xml"));
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].xmltv_id, "Nested.us");
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            parse_document("<channels><channel xmltv_id=\"a\"></channels>"),
            Err(DocumentError::Xml { .. })
        ));
        assert!(matches!(
            parse_document("<channels><channel xmltv_id=\"a\">A</channel>"),
            Err(DocumentError::Unclosed(tag)) if tag == "channels"
        ));
        assert!(matches!(parse_document(""), Err(DocumentError::Empty)));
        assert!(matches!(parse_document("<?xml version=\"1.0\"?>\n"), Err(DocumentError::Empty)));
    }

    #[test]
    fn test_write_channels_document() {
        let root = parse_document(PROVIDER_DOC).unwrap();
        let nodes = vec![&root.children[0], &root.children[2]];
        let rendered = write_channels_document(nodes.iter().copied()).unwrap();

        assert!(rendered.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(rendered.contains(
            "  <channel site=\"tvguide.com\" lang=\"en\" xmltv_id=\"ABC.us\" site_id=\"9233011364\">ABC</channel>"
        ));
        assert!(rendered.contains("xmltv_id=\"AT&amp;T.us\""));
        assert!(rendered.ends_with("</channels>\n"));

        let reparsed = parse_document(&rendered).unwrap();
        assert_eq!(reparsed.tag, CHANNELS_ROOT_TAG);
        assert_eq!(reparsed.children, vec![root.children[0].clone(), root.children[2].clone()]);

        let again = write_channels_document(nodes.iter().copied()).unwrap();
        assert_eq!(rendered, again);
    }

    #[test]
    fn test_write_empty_node_self_closes() {
        let node = CatalogNode::new("channel").with_attribute("xmltv_id", "a");
        let rendered = write_channels_document([&node]).unwrap();
        assert!(rendered.contains("<channel xmltv_id=\"a\"/>"));
    }
}
