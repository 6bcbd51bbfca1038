//! HTML tree nodes.

use crate::selector::Selector;

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Decoded character data.
    Text(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The element inside this node, if any.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }

    /// The element inside this node, mutably.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(e) => Some(e),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An HTML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    attrs: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    // ==================== Builders ====================

    /// Set an attribute, builder style.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set the `id` attribute, builder style.
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attr("id", id)
    }

    /// Add a class, builder style.
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Replace the children with a text node, builder style.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Replace the children with parsed markup, builder style.
    #[must_use]
    pub fn with_html(mut self, html: &str) -> Self {
        self.set_inner_html(html);
        self
    }

    /// Append a child, builder style.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Set a style property, builder style.
    #[must_use]
    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.set_style(property, value);
        self
    }

    /// Mark hidden, builder style.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hide();
        self
    }

    // ==================== Attributes ====================

    /// Attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(slot) = self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            slot.1 = value;
        } else {
            self.attrs.push((name.to_ascii_lowercase(), value));
        }
    }

    /// Remove an attribute, returning its old value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self
            .attrs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.attrs.remove(pos).1)
    }

    /// All attributes in insertion order.
    #[must_use]
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// The `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Set or clear a boolean attribute such as `disabled` or `checked`.
    pub fn set_flag(&mut self, name: &str, on: bool) {
        if on {
            self.set_attr(name, name);
        } else {
            self.remove_attr(name);
        }
    }

    // ==================== Classes ====================

    /// Classes from the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class if missing.
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    /// Remove a class if present.
    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", joined);
        }
    }

    /// Add or remove a class.
    pub fn set_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    // ==================== Style ====================

    /// A property from the inline `style` attribute.
    #[must_use]
    pub fn style(&self, property: &str) -> Option<String> {
        parse_style(self.attr("style").unwrap_or(""))
            .into_iter()
            .find(|(k, _)| k == property)
            .map(|(_, v)| v)
    }

    /// Set a property in the inline `style` attribute. An empty value
    /// removes the property.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut props = parse_style(self.attr("style").unwrap_or(""));
        props.retain(|(k, _)| k != property);
        if !value.is_empty() {
            props.push((property.to_string(), value.to_string()));
        }
        if props.is_empty() {
            self.remove_attr("style");
        } else {
            let style = props
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; ");
            self.set_attr("style", style);
        }
    }

    /// Whether the element is hidden via `hidden` or `display: none`.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.has_attr("hidden") || self.style("display").as_deref() == Some("none")
    }

    /// Hide the element.
    pub fn hide(&mut self) {
        self.set_attr("hidden", "");
    }

    /// Show the element.
    pub fn show(&mut self) {
        self.remove_attr("hidden");
        if self.style("display").as_deref() == Some("none") {
            self.set_style("display", "");
        }
    }

    // ==================== Content ====================

    /// Concatenated text of all descendants.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Replace all children with parsed markup.
    pub fn set_inner_html(&mut self, html: &str) {
        self.children = crate::parse_fragment(html);
    }

    /// Serialized children.
    #[must_use]
    pub fn inner_html(&self) -> String {
        crate::render::nodes_to_html(&self.children)
    }

    /// Serialized element including its own tag.
    #[must_use]
    pub fn outer_html(&self) -> String {
        crate::render::element_to_html(self)
    }

    /// Remove all children.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Append a child node.
    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Append an element and return a handle to it.
    pub fn append_element(&mut self, child: Element) -> &mut Self {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("an element was just pushed"),
        }
    }

    /// Element children only.
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(Node::as_element)
    }

    // ==================== Queries ====================

    /// Descendant elements in document order (self excluded).
    #[must_use]
    pub fn descendants(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        for child in self.child_elements() {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// Descendants matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, selector: &str) -> Vec<&Self> {
        let Some(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut ancestors = vec![self];
        select_into(self, &selector, &mut ancestors, &mut out);
        out
    }

    /// First descendant matching `selector`.
    #[must_use]
    pub fn select_first(&self, selector: &str) -> Option<&Self> {
        self.select(selector).into_iter().next()
    }

    /// Apply `f` to every descendant matching `selector`. Returns the
    /// number of elements visited.
    pub fn select_each_mut(&mut self, selector: &str, mut f: impl FnMut(&mut Self)) -> usize {
        let Some(selector) = Selector::parse(selector) else {
            return 0;
        };
        let mut path = Vec::new();
        collect_paths(self, &selector, &mut vec![&*self], &mut Vec::new(), &mut path);
        let count = path.len();
        for indices in path {
            if let Some(el) = self.at_path_mut(&indices) {
                f(el);
            }
        }
        count
    }

    /// Find a descendant (or self) by id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Self> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_id(id))
    }

    /// Find a descendant (or self) by id, mutably.
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Self> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|c| c.find_by_id_mut(id))
    }

    /// The parent of the element with `id`.
    #[must_use]
    pub fn parent_of(&self, id: &str) -> Option<&Self> {
        if self.child_elements().any(|c| c.id() == Some(id)) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.parent_of(id))
    }

    /// The parent of the element with `id`, mutably.
    pub fn parent_of_mut(&mut self, id: &str) -> Option<&mut Self> {
        if self.child_elements().any(|c| c.id() == Some(id)) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .filter_map(Node::as_element_mut)
            .find_map(|c| c.parent_of_mut(id))
    }

    /// Detach the descendant with `id` and return it.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Self> {
        let parent = self.parent_of_mut(id)?;
        let pos = parent.position_of(id)?;
        match parent.children.remove(pos) {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Replace the descendant with `id` by `node`, returning the old element.
    pub fn replace_by_id(&mut self, id: &str, node: impl Into<Node>) -> Option<Self> {
        let parent = self.parent_of_mut(id)?;
        let pos = parent.position_of(id)?;
        match std::mem::replace(&mut parent.children[pos], node.into()) {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Insert `node` right before the descendant with `id`.
    pub fn insert_before_id(&mut self, id: &str, node: impl Into<Node>) -> bool {
        let Some(parent) = self.parent_of_mut(id) else {
            return false;
        };
        let Some(pos) = parent.position_of(id) else {
            return false;
        };
        parent.children.insert(pos, node.into());
        true
    }

    /// Wrap the descendant with `id` inside `wrapper` (appended as its last
    /// child).
    pub fn wrap_by_id(&mut self, id: &str, mut wrapper: Self) -> bool {
        let Some(parent) = self.parent_of_mut(id) else {
            return false;
        };
        let Some(pos) = parent.position_of(id) else {
            return false;
        };
        let target = std::mem::replace(&mut parent.children[pos], Node::Text(String::new()));
        wrapper.children.push(target);
        parent.children[pos] = Node::Element(wrapper);
        true
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.id() == Some(id)))
    }

    fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Self> {
        let mut current = self;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
        }
    }
}

fn select_into<'a>(
    element: &'a Element,
    selector: &Selector,
    ancestors: &mut Vec<&'a Element>,
    out: &mut Vec<&'a Element>,
) {
    for child in element.child_elements() {
        if selector.matches(child, ancestors) {
            out.push(child);
        }
        ancestors.push(child);
        select_into(child, selector, ancestors, out);
        ancestors.pop();
    }
}

fn collect_paths<'a>(
    element: &'a Element,
    selector: &Selector,
    ancestors: &mut Vec<&'a Element>,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    for (index, node) in element.children.iter().enumerate() {
        let Node::Element(child) = node else {
            continue;
        };
        current.push(index);
        if selector.matches(child, ancestors) {
            out.push(current.clone());
        }
        ancestors.push(child);
        collect_paths(child, selector, ancestors, current, out);
        ancestors.pop();
        current.pop();
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (k, v) = decl.split_once(':')?;
            let k = k.trim().to_ascii_lowercase();
            let v = v.trim().to_string();
            (!k.is_empty()).then_some((k, v))
        })
        .collect()
}
