//! Rendering the tree back to HTML.

use crate::entities::{escape, escape_text};
use crate::nodes::{Element, Node};
use crate::parser::is_void;

/// Convert nodes to HTML.
#[must_use]
pub fn nodes_to_html(nodes: &[Node]) -> String {
    nodes.iter().map(node_to_html).collect()
}

/// Convert a single node to HTML.
#[must_use]
pub fn node_to_html(node: &Node) -> String {
    match node {
        Node::Text(text) => escape_text(text),
        Node::Element(element) => element_to_html(element),
    }
}

/// Convert an element, including its own tag, to HTML.
#[must_use]
pub fn element_to_html(element: &Element) -> String {
    let mut out = String::with_capacity(32);
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in element.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    if is_void(&element.tag) {
        out.push_str(" />");
        return out;
    }
    out.push('>');
    out.push_str(&nodes_to_html(&element.children));
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
    out
}

/// Convert nodes to plain text.
#[must_use]
pub fn nodes_to_plain_text(nodes: &[Node]) -> String {
    nodes.iter().map(node_to_plain_text).collect()
}

fn node_to_plain_text(node: &Node) -> String {
    match node {
        Node::Text(text) => text.clone(),
        Node::Element(element) if element.tag == "br" => "\n".to_string(),
        Node::Element(element) => nodes_to_plain_text(&element.children),
    }
}
