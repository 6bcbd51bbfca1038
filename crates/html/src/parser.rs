//! Lenient HTML fragment parser.
//!
//! Backend responses are small, server-generated fragments, so this is a
//! tag-soup tokenizer rather than a full HTML5 parser: unknown
//! closing tags are dropped, unclosed elements are closed at the end of input,
//! and `li`/`p`/`option` close a preceding sibling of the same type.

use regex::Regex;

use crate::entities::unescape;
use crate::nodes::{Element, Node};

/// Elements that never have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const SELF_CLOSING_SIBLINGS: &[&str] = &["li", "p", "option"];

#[allow(clippy::unwrap_used)]
static TAG_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!(?:[^>])*>|<(/)?([A-Za-z][A-Za-z0-9-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/)?\s*>"#,
    )
    .unwrap()
});

#[allow(clippy::unwrap_used)]
static ATTR_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#).unwrap()
});

/// Whether `tag` is a void element.
#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Parse an HTML fragment into a list of nodes.
#[must_use]
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let mut builder = TreeBuilder::default();
    let mut pos = 0;

    for cap in TAG_RE.captures_iter(html) {
        let Some(whole) = cap.get(0) else {
            continue;
        };
        if whole.start() > pos {
            builder.text(&html[pos..whole.start()]);
        }
        pos = whole.end();

        // Comments and doctypes carry no tag name.
        let Some(name) = cap.get(2) else {
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();

        if cap.get(1).is_some() {
            builder.close(&tag);
            continue;
        }

        let mut element = Element::new(&tag);
        if let Some(attrs) = cap.get(3) {
            for attr in ATTR_RE.captures_iter(attrs.as_str()) {
                let key = &attr[1];
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .or_else(|| attr.get(4))
                    .map_or(String::new(), |m| unescape(m.as_str()));
                element.set_attr(key, value);
            }
        }

        let self_closed = cap.get(4).is_some();
        builder.open(element, self_closed || is_void(&tag));
    }

    if pos < html.len() {
        builder.text(&html[pos..]);
    }
    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn text(&mut self, raw: &str) {
        if !raw.is_empty() {
            self.push(Node::Text(unescape(raw)));
        }
    }

    fn open(&mut self, element: Element, leaf: bool) {
        if SELF_CLOSING_SIBLINGS.contains(&element.tag.as_str())
            && self.stack.last().is_some_and(|top| top.tag == element.tag)
        {
            self.pop();
        }
        if leaf {
            self.push(Node::Element(element));
        } else {
            self.stack.push(element);
        }
    }

    fn close(&mut self, tag: &str) {
        if !self.stack.iter().any(|e| e.tag == tag) {
            return;
        }
        while let Some(top) = self.stack.last() {
            let done = top.tag == tag;
            self.pop();
            if done {
                break;
            }
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.stack.pop() {
            self.push(Node::Element(element));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.pop();
        }
        self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[Node]) -> &Element {
        nodes.iter().find_map(Node::as_element).expect("element")
    }

    #[test]
    fn test_plain_text() {
        let nodes = parse_fragment("Thanks for responding!");
        assert_eq!(nodes, vec![Node::text("Thanks for responding!")]);
    }

    #[test]
    fn test_nested_elements_and_attributes() {
        let nodes = parse_fragment(r#"<div id="x" class='a b'><p>Hi <b>there</b></p></div>"#);
        let div = first_element(&nodes);
        assert_eq!(div.id(), Some("x"));
        assert!(div.has_class("b"));
        assert_eq!(div.text(), "Hi there");
    }

    #[test]
    fn test_void_and_self_closing() {
        let nodes = parse_fragment(r#"<input type="hidden" value="a&amp;b"><br/><span />tail"#);
        assert_eq!(nodes.len(), 4);
        let input = first_element(&nodes);
        assert_eq!(input.attr("value"), Some("a&b"));
        assert!(input.children.is_empty());
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let nodes = parse_fragment("<ul><li>one<li>two</ul></em>after");
        let ul = first_element(&nodes);
        assert_eq!(ul.child_elements().count(), 2);
        assert_eq!(nodes.last(), Some(&Node::text("after")));

        let nodes = parse_fragment("<div><p>never closed");
        assert_eq!(first_element(&nodes).text(), "never closed");
    }

    #[test]
    fn test_comments_are_skipped() {
        let nodes = parse_fragment("<!-- note --><p>x</p><!DOCTYPE html>");
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_boolean_and_unquoted_attributes() {
        let nodes = parse_fragment("<input type=radio checked name=q1>");
        let input = first_element(&nodes);
        assert_eq!(input.attr("type"), Some("radio"));
        assert!(input.has_attr("checked"));
        assert_eq!(input.attr("name"), Some("q1"));
    }

    #[test]
    fn test_entities_in_text() {
        let nodes = parse_fragment("Salt &amp; Pepper");
        assert_eq!(nodes, vec![Node::text("Salt & Pepper")]);
    }
}
