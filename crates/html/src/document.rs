//! A whole page's element tree.

use crate::nodes::{Element, Node};
use crate::parser::parse_fragment;

/// An owned HTML document rooted at `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: Element::new("body"),
        }
    }

    /// Create a document whose body holds the parsed `html`.
    #[must_use]
    pub fn from_html(html: &str) -> Self {
        let mut body = Element::new("body");
        body.children = parse_fragment(html);
        Self { body }
    }

    /// The `<body>` element.
    #[must_use]
    pub const fn body(&self) -> &Element {
        &self.body
    }

    /// The `<body>` element, mutably.
    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    /// Element with `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.body.find_by_id(id)
    }

    /// Element with `id`, mutably.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.body.find_by_id_mut(id)
    }

    /// Whether an element with `id` is attached.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Elements matching `selector` anywhere in the body.
    #[must_use]
    pub fn select(&self, selector: &str) -> Vec<&Element> {
        self.body.select(selector)
    }

    /// First element matching `selector`, in document order.
    #[must_use]
    pub fn select_first(&self, selector: &str) -> Option<&Element> {
        self.body.select_first(selector)
    }

    /// Append a node to the end of the body.
    pub fn append(&mut self, node: impl Into<Node>) {
        self.body.append(node);
    }

    /// Detach the element with `id`.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.body.remove_by_id(id)
    }

    /// Serialize the body's content.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.body.inner_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lookup() {
        let mut doc = Document::from_html(r#"<div id="survey"></div><div id="map"></div>"#);
        assert!(doc.contains("survey"));
        doc.get_mut("survey").unwrap().set_text("hello");
        assert_eq!(doc.get("survey").map(Element::text).as_deref(), Some("hello"));

        let removed = doc.remove("map").unwrap();
        assert_eq!(removed.tag, "div");
        assert!(!doc.contains("map"));
        assert_eq!(doc.to_html(), "<div id=\"survey\">hello</div>");
    }

    #[test]
    fn test_append() {
        let mut doc = Document::new();
        doc.append(Element::new("div").with_id("enlarge_bg"));
        assert_eq!(doc.select("div").len(), 1);
    }

    #[test]
    fn test_select_first() {
        let doc = Document::from_html(r#"<p class="a">one</p><p class="a">two</p>"#);
        assert_eq!(doc.select_first("p.a").map(Element::text).as_deref(), Some("one"));
        assert!(doc.select_first("span").is_none());
    }
}
