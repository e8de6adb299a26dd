//! Markup bridge: XHTML fragments in, markup out

use super::{Dom, NodeId, NodeKind};
use crate::error::{DomError, MarkupError};

const VOID_ELEMENTS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "wbr"];

/// Parse a well-formed fragment into a fresh tree
pub fn parse(markup: &str) -> Result<Dom, MarkupError> {
    let mut dom = Dom::new();
    let root = dom.root();
    parse_into(&mut dom, root, markup)?;
    Ok(dom)
}

/// Parse a well-formed fragment and append its root element to `parent`
pub fn parse_into(dom: &mut Dom, parent: NodeId, markup: &str) -> Result<NodeId, MarkupError> {
    let doc = roxmltree::Document::parse(markup)?;
    let source = doc.root_element();
    if !source.is_element() {
        return Err(MarkupError::MissingRoot);
    }
    let element = build(dom, source)?;
    dom.append_child(parent, element)?;
    Ok(element)
}

fn build(dom: &mut Dom, source: roxmltree::Node) -> Result<NodeId, DomError> {
    let element = dom.create_element(source.tag_name().name());
    for attribute in source.attributes() {
        dom.set_attr(element, attribute.name(), attribute.value())?;
    }
    for child in source.children() {
        let node = if child.is_element() {
            build(dom, child)?
        } else if child.is_text() {
            dom.create_text(child.text().unwrap_or_default())
        } else {
            continue;
        };
        dom.append_child(element, node)?;
    }
    Ok(element)
}

/// Serialize `id` and its subtree
pub fn to_markup(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

/// Serialize only the children of `id`
pub fn inner_markup(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    for &child in dom.children(id) {
        write_node(dom, child, &mut out);
    }
    out
}

fn write_node(dom: &Dom, id: NodeId, out: &mut String) {
    match dom.kind(id) {
        NodeKind::Document => {
            for &child in dom.children(id) {
                write_node(dom, child, out);
            }
        }
        NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
        NodeKind::Element(data) => {
            out.push('<');
            out.push_str(&data.tag);
            for (name, value) in &data.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            if VOID_ELEMENTS.contains(&data.tag.as_str()) && dom.children(id).is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in dom.children(id) {
                write_node(dom, child, out);
            }
            out.push_str("</");
            out.push_str(&data.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_tree() {
        let dom = parse(r#"<div class="page"><p>alpha <b>beta</b></p></div>"#).unwrap();
        let div = dom.children(dom.root())[0];

        assert_eq!(dom.tag(div), Some("div"));
        assert!(dom.has_class(div, "page"));
        assert_eq!(dom.text_content(div), "alpha beta");
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let dom = parse(r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#).unwrap();

        assert_eq!(
            to_markup(&dom, dom.root()),
            r#"<p title="a &quot;b&quot;">1 &lt; 2 &amp; 3</p>"#
        );
    }

    #[test]
    fn test_void_elements_self_close() {
        let dom = parse("<p>a<br/>b</p>").unwrap();
        assert_eq!(to_markup(&dom, dom.root()), "<p>a<br/>b</p>");
    }

    #[test]
    fn test_rejects_malformed_markup() {
        assert!(parse("<p>unclosed").is_err());
    }
}
