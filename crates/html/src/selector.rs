//! A small CSS selector subset.
//!
//! Supports type (`input`), class (`.error`), id (`#inner_poll`), attribute
//! presence (`[checked]`) and equality (`[type=hidden]`) tests, combined into
//! compound selectors and chained with the descendant combinator
//! (`ul.errorlist li`).

use crate::nodes::Element;

/// One attribute test inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

/// A compound selector such as `input.enlargeable[type=hidden]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag
            && !element.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id() != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match &test.value {
            Some(value) => element.attr(&test.name) == Some(value.as_str()),
            None => element.has_attr(&test.name),
        })
    }
}

/// A parsed selector: compounds joined by descendant combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a selector. Returns `None` for empty or malformed input.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let parts = input
            .split_whitespace()
            .map(parse_compound)
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self { parts })
    }

    /// Whether `element` matches the last compound of this selector, with
    /// the earlier compounds matched by `ancestors` (outermost first).
    #[must_use]
    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        let Some((last, rest)) = self.parts.split_last() else {
            return false;
        };
        if !last.matches(element) {
            return false;
        }
        // Greedy right-to-left walk over the ancestor chain.
        let mut remaining = rest.iter().rev().peekable();
        for ancestor in ancestors.iter().rev() {
            match remaining.peek() {
                Some(part) if part.matches(ancestor) => {
                    remaining.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        remaining.peek().is_none()
    }
}

fn parse_compound(input: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut chars = input.char_indices().peekable();
    let bytes = input;

    let read_ident = |start: usize| -> usize {
        bytes[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .map_or(bytes.len(), |off| start + off)
    };

    while let Some(&(i, c)) = chars.peek() {
        match c {
            '.' | '#' => {
                let end = read_ident(i + 1);
                if end == i + 1 {
                    return None;
                }
                let name = bytes[i + 1..end].to_string();
                if c == '.' {
                    compound.classes.push(name);
                } else {
                    compound.id = Some(name);
                }
                while chars.peek().is_some_and(|&(j, _)| j < end) {
                    chars.next();
                }
            }
            '[' => {
                let close = bytes[i..].find(']')? + i;
                let inner = &bytes[i + 1..close];
                let test = match inner.split_once('=') {
                    Some((name, value)) => AttrTest {
                        name: name.trim().to_string(),
                        value: Some(value.trim().trim_matches(['"', '\'']).to_string()),
                    },
                    None => AttrTest {
                        name: inner.trim().to_string(),
                        value: None,
                    },
                };
                if test.name.is_empty() {
                    return None;
                }
                compound.attrs.push(test);
                while chars.peek().is_some_and(|&(j, _)| j <= close) {
                    chars.next();
                }
            }
            '*' if i == 0 => {
                chars.next();
            }
            _ if i == 0 && c.is_ascii_alphabetic() => {
                let end = read_ident(i);
                compound.tag = Some(bytes[i..end].to_ascii_lowercase());
                while chars.peek().is_some_and(|&(j, _)| j < end) {
                    chars.next();
                }
            }
            _ => return None,
        }
    }

    Some(compound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: &str) -> Element {
        Element::new("input")
            .with_attr("type", kind)
            .with_class("enlargeable")
            .with_id("img_3_full_url")
    }

    #[test]
    fn test_compound_match() {
        let el = input("hidden");
        let sel = Selector::parse("input.enlargeable[type=hidden]").unwrap();
        assert!(sel.matches(&el, &[]));
        let sel = Selector::parse("input[type='text']").unwrap();
        assert!(!sel.matches(&el, &[]));
        let sel = Selector::parse("#img_3_full_url").unwrap();
        assert!(sel.matches(&el, &[]));
        let sel = Selector::parse("[type]").unwrap();
        assert!(sel.matches(&el, &[]));
    }

    #[test]
    fn test_descendant_match() {
        let ul = Element::new("ul").with_class("errorlist");
        let div = Element::new("div");
        let li = Element::new("li");
        let sel = Selector::parse("ul.errorlist li").unwrap();
        assert!(sel.matches(&li, &[&ul, &div]));
        assert!(!sel.matches(&li, &[&div]));
    }

    #[test]
    fn test_malformed() {
        assert!(Selector::parse("").is_none());
        assert!(Selector::parse("div.").is_none());
        assert!(Selector::parse("div[").is_none());
        assert!(Selector::parse("a>b").is_none());
    }
}
