//! The page the widgets live on.
//!
//! A [`Page`] owns the document tree, the page URL, the viewport geometry and
//! the small amount of state shared between widgets on one page.

use std::collections::HashMap;

use crowdsource_common::{AppError, AppResult, QueryParams, query_from_url};
use crowdsource_html::Document;
use tracing::debug;
use url::Url;

/// Browser viewport geometry, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Visible width.
    pub width: u32,
    /// Visible height.
    pub height: u32,
    /// Vertical scroll offset.
    pub scroll_top: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            scroll_top: 0,
        }
    }
}

/// An image wired for enlargement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enlargeable {
    /// Id of the thumbnail `<img>`.
    pub img_id: String,
    /// Full-size image URL.
    pub full_url: String,
}

/// State shared by every widget on a page.
#[derive(Debug, Default)]
struct PageRegistry {
    lightbox_active: bool,
    comment_toggles: HashMap<String, bool>,
    enlargeables: Vec<Enlargeable>,
}

/// A loaded page.
#[derive(Debug)]
pub struct Page {
    /// The element tree.
    pub document: Document,
    /// Current location.
    pub location: Url,
    /// Viewport geometry.
    pub viewport: Viewport,
    registry: PageRegistry,
}

impl Page {
    /// Create a page from markup and its URL.
    pub fn new(html: &str, location: &str) -> AppResult<Self> {
        Ok(Self {
            document: Document::from_html(html),
            location: Url::parse(location)?,
            viewport: Viewport::default(),
            registry: PageRegistry::default(),
        })
    }

    /// Filter parameters from the page URL, forwarded to report and map
    /// endpoints.
    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        query_from_url(&self.location)
    }

    // ==================== Lightbox ====================

    /// Whether a lightbox is currently open.
    #[must_use]
    pub const fn lightbox_active(&self) -> bool {
        self.registry.lightbox_active
    }

    pub(crate) fn set_lightbox_active(&mut self, active: bool) {
        self.registry.lightbox_active = active;
    }

    // ==================== Enlargeable images ====================

    /// Images wired for enlargement, in discovery order.
    #[must_use]
    pub fn enlargeables(&self) -> &[Enlargeable] {
        &self.registry.enlargeables
    }

    /// Full-size URL registered for `img_id`.
    #[must_use]
    pub fn enlargeable_url(&self, img_id: &str) -> Option<&str> {
        self.registry
            .enlargeables
            .iter()
            .find(|e| e.img_id == img_id)
            .map(|e| e.full_url.as_str())
    }

    pub(crate) fn register_enlargeable(&mut self, enlargeable: Enlargeable) {
        self.registry.enlargeables.push(enlargeable);
    }

    // ==================== Comments ====================

    /// Show or hide the comment block `#id`, alternating on each call.
    ///
    /// Returns `true` when the block is now visible.
    pub fn toggle_comments(&mut self, id: &str) -> AppResult<bool> {
        let shown = self.registry.comment_toggles.get(id).copied().unwrap_or(false);
        let div = self
            .document
            .get_mut(id)
            .ok_or_else(|| AppError::MissingElement(id.to_string()))?;
        if shown {
            div.hide();
        } else {
            div.show();
        }
        self.registry.comment_toggles.insert(id.to_string(), !shown);
        debug!(id, visible = !shown, "Toggled comments");
        Ok(!shown)
    }
}
