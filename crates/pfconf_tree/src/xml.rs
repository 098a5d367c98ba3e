//! XML codec for configuration documents.
//!
//! The document model is small: elements, their attributes, their text
//! and their ordered children. Leaf text is kept verbatim, including
//! surrounding whitespace. Whitespace between child elements is layout
//! and is dropped. Comments, processing instructions and non-whitespace
//! text mixed with child elements are dropped with a warning. CDATA
//! sections are read as plain text and written back escaped.

use crate::error::{TreeError, TreeResult};
use crate::node::Node;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;
use tracing::warn;

/// Parses an XML document into its root node.
///
/// # Errors
///
/// Returns `TreeError::Xml` on syntax errors and `TreeError::Malformed`
/// when the document has no root or unbalanced elements.
pub fn parse(xml: &str) -> TreeResult<Node> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let node = element(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Text(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = e.unescape().map_err(TreeError::xml)?;
                    append_text(top, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = stack.last_mut() {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(TreeError::xml)?;
                    append_text(top, &text);
                }
            }
            Ok(Event::End(_)) => {
                let mut node = stack
                    .pop()
                    .ok_or_else(|| TreeError::malformed("unexpected closing tag"))?;
                settle_text(&mut node);
                attach(&mut stack, &mut root, node)?;
            }
            Ok(Event::Comment(_)) => {
                let parent = stack.last().map(Node::tag).unwrap_or("");
                warn!(parent, "dropping XML comment");
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TreeError::xml(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(TreeError::malformed(format!(
            "unclosed element <{}>",
            open.tag()
        )));
    }

    root.ok_or_else(|| TreeError::malformed("document has no root element"))
}

fn decode_tag(raw: &[u8]) -> TreeResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(TreeError::xml)
}

fn element(start: &BytesStart<'_>) -> TreeResult<Node> {
    let mut node = Node::new(decode_tag(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(TreeError::xml)?;
        let value = attribute.unescape_value().map_err(TreeError::xml)?;
        node.push_attribute(decode_tag(attribute.key.as_ref())?, value);
    }
    Ok(node)
}

/// Drops text collected by an element that turned out to have children.
fn settle_text(node: &mut Node) {
    if node.is_leaf() {
        return;
    }
    if let Some(text) = node.text() {
        if !text.trim().is_empty() {
            warn!(tag = node.tag(), "dropping text mixed with child elements");
        }
        node.set_text(None);
    }
}

fn append_text(node: &mut Node, text: &str) {
    let joined = match node.text() {
        Some(existing) => format!("{existing}{text}"),
        None => text.to_string(),
    };
    node.set_text(Some(joined));
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> TreeResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(node);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(node);
            Ok(())
        }
        None => Err(TreeError::malformed(format!(
            "second root element <{}>",
            node.tag()
        ))),
    }
}

/// Serialises a tree rooted at `root` as an indented XML document.
///
/// # Errors
///
/// Returns `TreeError::Xml` if the writer fails.
pub fn to_string(root: &Node) -> TreeResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(TreeError::xml)?;
    write_node(&mut writer, root)?;

    let mut out = String::from_utf8(writer.into_inner()).map_err(TreeError::xml)?;
    out.push('\n');
    Ok(out)
}

fn start_of(node: &Node) -> BytesStart<'_> {
    BytesStart::new(node.tag()).with_attributes(
        node.attributes()
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
    )
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> TreeResult<()> {
    let tag = node.tag();
    if node.is_leaf() {
        match node.text() {
            Some(text) if !text.is_empty() => {
                writer
                    .write_event(Event::Start(start_of(node)))
                    .map_err(TreeError::xml)?;
                writer
                    .write_event(Event::Text(BytesText::new(text)))
                    .map_err(TreeError::xml)?;
                writer
                    .write_event(Event::End(BytesEnd::new(tag)))
                    .map_err(TreeError::xml)?;
            }
            _ => {
                writer
                    .write_event(Event::Empty(start_of(node)))
                    .map_err(TreeError::xml)?;
            }
        }
        return Ok(());
    }

    writer
        .write_event(Event::Start(start_of(node)))
        .map_err(TreeError::xml)?;
    for child in node.children() {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(TreeError::xml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<pfsense>
	<version>21.7</version>
	<system>
		<hostname>fw</hostname>
		<authserver>
			<name>AD</name>
			<type>ldap</type>
			<ldap_extended_enabled/>
			<ldap_extended_query><![CDATA[memberOf=cn=vpn&x]]></ldap_extended_query>
		</authserver>
		<domain>example.com</domain>
	</system>
</pfsense>
"#;

    #[test]
    fn parse_preserves_order_and_text() {
        let root = parse(DOC).unwrap();
        assert_eq!(root.tag(), "pfsense");
        let system = root.child("system").unwrap();
        let tags: Vec<&str> = system.children().iter().map(Node::tag).collect();
        assert_eq!(tags, vec!["hostname", "authserver", "domain"]);

        let server = system.child("authserver").unwrap();
        assert_eq!(server.child_text("name"), Some("AD"));
        assert_eq!(server.child_text("ldap_extended_enabled"), None);
        assert_eq!(
            server.child_text("ldap_extended_query"),
            Some("memberOf=cn=vpn&x")
        );
    }

    #[test]
    fn unescapes_entities() {
        let root = parse("<a><b>x &amp; y</b></a>").unwrap();
        assert_eq!(root.child_text("b"), Some("x & y"));
    }

    #[test]
    fn written_document_parses_back_to_same_tree() {
        let root = parse(DOC).unwrap();
        let written = to_string(&root).unwrap();
        assert!(written.starts_with("<?xml"));
        assert!(written.contains("<name>AD</name>"));
        assert!(written.contains("memberOf=cn=vpn&amp;x"));
        assert_eq!(parse(&written).unwrap(), root);
    }

    #[test]
    fn rejects_unclosed_element() {
        let err = parse("<pfsense><system>").unwrap_err();
        assert!(matches!(err, TreeError::Malformed(_) | TreeError::Xml(_)));
    }

    #[test]
    fn rejects_mismatched_end_tag() {
        assert!(matches!(
            parse("<a><b></c></a>"),
            Err(TreeError::Xml(_))
        ));
    }

    #[test]
    fn rejects_empty_document() {
        assert!(matches!(parse(""), Err(TreeError::Malformed(_))));
    }

    #[test]
    fn leaf_text_keeps_surrounding_whitespace() {
        let root = parse("<a>\n\t<pw> s3cret </pw>\n\t<q>\tx &lt; y </q>\n</a>").unwrap();
        assert_eq!(root.child_text("pw"), Some(" s3cret "));
        assert_eq!(root.child_text("q"), Some("\tx < y "));
        assert_eq!(root.text(), None);

        let reparsed = parse(&to_string(&root).unwrap()).unwrap();
        assert_eq!(reparsed, root);
    }

    #[test]
    fn layout_whitespace_between_children_is_dropped() {
        let root = parse(DOC).unwrap();
        let system = root.child("system").unwrap();
        assert_eq!(system.text(), None);
        assert_eq!(system.child("authserver").unwrap().text(), None);
    }

    #[test]
    fn attributes_survive_a_rewrite() {
        let root = parse(r#"<pfsense><ca id="x &amp; y"><refid>1</refid></ca><flag on="yes"/></pfsense>"#)
            .unwrap();
        let ca = root.child("ca").unwrap();
        assert_eq!(ca.attributes(), &[("id".to_string(), "x & y".to_string())]);

        let written = to_string(&root).unwrap();
        assert!(written.contains(r#"<ca id="x &amp; y">"#));
        assert!(written.contains(r#"<flag on="yes"/>"#));
        assert_eq!(parse(&written).unwrap(), root);
    }

    #[test]
    fn comments_and_mixed_text_are_dropped() {
        let root = parse("<a><!-- note -->stray<b>1</b></a>").unwrap();
        assert_eq!(root.text(), None);
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.child_text("b"), Some("1"));
    }
}
