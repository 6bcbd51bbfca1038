//! Minimal HTML document model.
//!
//! This crate provides the in-memory tree the widgets render into and the
//! parser used for fragments returned by the backend.
//!
//! # Features
//!
//! - **Tree**: [`Element`] and [`Node`] with attribute, class and style helpers
//! - **Documents**: [`Document`] with id lookup and structural edits
//! - **Parsing**: Lenient fragment parsing via [`parse_fragment`]
//! - **Selectors**: A CSS subset via [`Element::select`]
//! - **Rendering**: Serialization via [`Element::outer_html`] and [`to_html`]
//! - **Entities**: [`escape`] and [`unescape`]
//!
//! # Example
//!
//! ```
//! use crowdsource_html::{Element, parse_fragment, to_html};
//!
//! let form = Element::new("form")
//!     .with_attr("method", "POST")
//!     .with_child(Element::new("input").with_attr("type", "submit"));
//! assert!(form.outer_html().starts_with("<form method=\"POST\">"));
//!
//! let nodes = parse_fragment("<ul class=\"errorlist\"><li>Required</li></ul>");
//! assert_eq!(to_html(&nodes), "<ul class=\"errorlist\"><li>Required</li></ul>");
//! ```

#![allow(clippy::missing_const_for_fn)]

mod document;
mod entities;
mod nodes;
mod parser;
mod render;
mod selector;

pub use document::Document;
pub use entities::{escape, escape_text, unescape};
pub use nodes::{Element, Node};
pub use parser::{VOID_ELEMENTS, is_void, parse_fragment};
pub use render::{nodes_to_html as to_html, nodes_to_plain_text as to_plain_text};
pub use selector::Selector;
