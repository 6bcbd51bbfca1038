//! Modal image viewer.
//!
//! Opening a lightbox appends a dimmed background (`#enlarge_bg`) and a panel
//! (`#enlarge`) to the page body. The full-size image is placed off-screen
//! until the [`ImageLoader`] reports its natural size, then the panel is
//! re-centered and the caption revealed.

use std::sync::Arc;

use async_trait::async_trait;
use crowdsource_common::{AppError, AppResult, LightboxConfig};
use crowdsource_html::Element;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

use crate::page::Page;

const BACKGROUND_ID: &str = "enlarge_bg";
const PANEL_ID: &str = "enlarge";

/// Natural size of a loaded image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// How image completion is reported.
pub enum LoadSignal {
    /// A single notification fired once the image is decoded.
    Notify(oneshot::Receiver<ImageSize>),
    /// A probe returning the size once the image is complete.
    Poll(Box<dyn FnMut() -> Option<ImageSize> + Send>),
}

impl std::fmt::Debug for LoadSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notify(_) => f.write_str("LoadSignal::Notify"),
            Self::Poll(_) => f.write_str("LoadSignal::Poll"),
        }
    }
}

/// Starts loading full-size images.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Begin loading `url`.
    async fn load(&self, url: &str) -> AppResult<LoadSignal>;
}

/// Lightbox lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightboxState {
    /// Nothing shown.
    Closed,
    /// Overlay shown, image still loading.
    Loading,
    /// Image shown at its natural size.
    Loaded(ImageSize),
    /// The image never reported completion.
    Failed,
}

/// Photo credit shown under the caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credits {
    /// Credit text.
    pub text: String,
    /// Optional link for the credit.
    pub url: Option<String>,
}

/// Drives the page's lightbox.
pub struct LightboxController {
    config: LightboxConfig,
    loader: Arc<dyn ImageLoader>,
    state: LightboxState,
}

impl std::fmt::Debug for LightboxController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightboxController")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LightboxController {
    /// Create a closed lightbox.
    pub fn new(config: LightboxConfig, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            config,
            loader,
            state: LightboxState::Closed,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LightboxState {
        self.state
    }

    /// Open the lightbox for thumbnail `#img_id` and wait for `url` to load.
    pub async fn show(
        &mut self,
        page: &mut Page,
        img_id: &str,
        url: &str,
        credits: Option<&Credits>,
    ) -> AppResult<LightboxState> {
        self.open(page, img_id, url, credits);
        self.wait(page, url).await
    }

    /// Open the lightbox for a thumbnail wired by
    /// [`init_enlargeable`](crate::enlarge::init_enlargeable).
    pub async fn show_enlargeable(&mut self, page: &mut Page, img_id: &str) -> AppResult<LightboxState> {
        let url = page
            .enlargeable_url(img_id)
            .ok_or_else(|| AppError::MissingElement(format!("{img_id}_full_url")))?
            .to_string();
        self.show(page, img_id, &url, None).await
    }

    /// Build the overlay. The image is attached off-screen.
    pub fn open(
        &mut self,
        page: &mut Page,
        img_id: &str,
        url: &str,
        credits: Option<&Credits>,
    ) {
        if page.lightbox_active() {
            warn!(img_id, "Opening a lightbox while another is active");
        }
        let (caption, alt) = page
            .document
            .get(img_id)
            .map(|img| {
                (
                    img.attr("title").unwrap_or_default().to_string(),
                    img.attr("alt").unwrap_or_default().to_string(),
                )
            })
            .unwrap_or_default();

        let background = Element::new("div")
            .with_id(BACKGROUND_ID)
            .with_style("opacity", "0.5");

        let top = page.viewport.scroll_top + self.config.top_offset;
        let panel = Element::new("div")
            .with_id(PANEL_ID)
            .with_style("top", &format!("{top}px"))
            .with_style("left", &format!("{}px", centered_left(page.viewport.width, 0)))
            .with_style("transition", &format!("left {}ms", self.config.animate_ms))
            .with_child(
                Element::new("div")
                    .with_class("close")
                    .with_child(Element::new("a").with_text("Close")),
            )
            .with_child(
                Element::new("img")
                    .with_attr("src", url)
                    .with_attr("title", caption.as_str())
                    .with_attr("alt", alt)
                    .with_style("position", "absolute")
                    .with_style("top", "0")
                    .with_style("left", "-9999px"),
            )
            .with_child(Element::new("div").with_class("loading").with_text("Loading..."))
            .with_child(
                Element::new("div")
                    .with_class("caption")
                    .with_text(caption)
                    .hidden(),
            )
            .with_child(credit_line(page, credits));

        page.document.append(background);
        page.document.append(panel);
        page.document
            .body_mut()
            .select_each_mut("embed", |embed| embed.set_style("visibility", "hidden"));
        page.set_lightbox_active(true);
        self.state = LightboxState::Loading;
        debug!(img_id, url, "Lightbox opened");
    }

    /// Wait for the image to finish loading, then reveal it.
    ///
    /// A probe-based signal is checked right away and then every
    /// `poll_interval_ms`, at most `max_polls` times.
    pub async fn wait(&mut self, page: &mut Page, url: &str) -> AppResult<LightboxState> {
        if self.state != LightboxState::Loading {
            return Err(AppError::InvalidState(format!(
                "lightbox is {:?}, not loading",
                self.state
            )));
        }
        let size = match self.loader.load(url).await? {
            LoadSignal::Notify(rx) => rx.await.ok(),
            LoadSignal::Poll(mut probe) => {
                let mut size = None;
                for attempt in 0..self.config.max_polls {
                    if attempt > 0 {
                        tokio::time::sleep(self.config.poll_interval()).await;
                    }
                    size = probe();
                    if size.is_some() {
                        break;
                    }
                }
                size
            }
        };

        if !page.document.contains(PANEL_ID) {
            info!(url, "Lightbox closed before the image loaded");
            self.state = LightboxState::Closed;
            return Ok(self.state);
        }
        match size {
            Some(size) => self.reveal(page, size),
            None => {
                warn!(url, max_polls = self.config.max_polls, "Image never finished loading");
                self.state = LightboxState::Failed;
            }
        }
        Ok(self.state)
    }

    fn reveal(&mut self, page: &mut Page, size: ImageSize) {
        let left = centered_left(page.viewport.width, size.width);
        if let Some(panel) = page.document.get_mut(PANEL_ID) {
            panel.set_style("left", &format!("{left}px"));
            panel.select_each_mut("div.caption", Element::show);
            panel.select_each_mut("div.loading", |loading| {
                loading.set_style("width", &format!("{}px", size.width));
                loading.set_style("height", &format!("{}px", size.height));
                loading.hide();
            });
            panel.select_each_mut("img", |img| img.set_style("position", "static"));
        }
        self.state = LightboxState::Loaded(size);
        debug!(width = size.width, height = size.height, "Lightbox image loaded");
    }

    /// Remove the overlay and restore hidden embeds.
    pub fn close(&mut self, page: &mut Page) {
        while page.document.remove(BACKGROUND_ID).is_some() {}
        while page.document.remove(PANEL_ID).is_some() {}
        page.document
            .body_mut()
            .select_each_mut("embed", |embed| embed.set_style("visibility", "visible"));
        page.set_lightbox_active(false);
        self.state = LightboxState::Closed;
        debug!("Lightbox closed");
    }
}

/// Left offset that centers a panel of `panel_width` in the viewport.
#[must_use]
pub fn centered_left(viewport_width: u32, panel_width: u32) -> i64 {
    (i64::from(viewport_width) - i64::from(panel_width)) / 2
}

fn credit_line(page: &Page, credits: Option<&Credits>) -> Element {
    let mut line = Element::new("div").with_class("credit");
    let Some(credits) = credits.filter(|c| !c.text.is_empty()) else {
        return line.hidden();
    };
    match credits.url.as_deref().filter(|u| !u.is_empty()) {
        Some(href) => {
            let mut a = Element::new("a")
                .with_attr("href", href)
                .with_text(credits.text.as_str());
            if is_external(page, href) {
                a.set_attr("target", "_blank");
            }
            line.append(a);
        }
        None => line.set_text(credits.text.as_str()),
    }
    line
}

fn is_external(page: &Page, href: &str) -> bool {
    Url::parse(href).is_ok_and(|url| url.host_str() != page.location.host_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Viewport;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct NotifyLoader {
        size: ImageSize,
    }

    #[async_trait]
    impl ImageLoader for NotifyLoader {
        async fn load(&self, _url: &str) -> AppResult<LoadSignal> {
            let (tx, rx) = oneshot::channel();
            let _ = tx.send(self.size);
            Ok(LoadSignal::Notify(rx))
        }
    }

    struct ProbeLoader {
        ready_after: Option<u32>,
        probes: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ImageLoader for ProbeLoader {
        async fn load(&self, _url: &str) -> AppResult<LoadSignal> {
            let probes = Arc::clone(&self.probes);
            let ready_after = self.ready_after;
            Ok(LoadSignal::Poll(Box::new(move || {
                let n = probes.fetch_add(1, Ordering::SeqCst) + 1;
                ready_after
                    .is_some_and(|after| n >= after)
                    .then_some(ImageSize { width: 300, height: 200 })
            })))
        }
    }

    struct DroppedLoader;

    #[async_trait]
    impl ImageLoader for DroppedLoader {
        async fn load(&self, _url: &str) -> AppResult<LoadSignal> {
            let (tx, rx) = oneshot::channel();
            // Losing the sender means the image never reports back.
            drop(tx);
            Ok(LoadSignal::Notify(rx))
        }
    }

    fn page() -> Page {
        let mut page = Page::new(
            r#"<img id="img_1" title="The lake" alt="lake"><embed id="player">"#,
            "https://example.com/",
        )
        .unwrap();
        page.viewport = Viewport {
            width: 1000,
            height: 700,
            scroll_top: 40,
        };
        page
    }

    fn config(max_polls: u32) -> LightboxConfig {
        LightboxConfig {
            max_polls,
            ..LightboxConfig::default()
        }
    }

    #[test]
    fn test_open_builds_overlay() {
        let mut page = page();
        let size = ImageSize { width: 400, height: 300 };
        let mut lightbox = LightboxController::new(config(5), Arc::new(NotifyLoader { size }));
        let credits = Credits {
            text: "Photo: Ana".to_string(),
            url: Some("https://photos.example.org/ana".to_string()),
        };
        lightbox.open(&mut page, "img_1", "/full/1.jpg", Some(&credits));

        assert_eq!(lightbox.state(), LightboxState::Loading);
        assert!(page.lightbox_active());
        let bg = page.document.get("enlarge_bg").unwrap();
        assert_eq!(bg.style("opacity").as_deref(), Some("0.5"));
        let panel = page.document.get("enlarge").unwrap();
        assert_eq!(panel.style("top").as_deref(), Some("50px"));
        assert_eq!(panel.select_first("div.loading").unwrap().text(), "Loading...");
        let caption = panel.select_first("div.caption").unwrap();
        assert_eq!(caption.text(), "The lake");
        assert!(caption.is_hidden());
        let link = panel.select_first("div.credit a").unwrap();
        assert_eq!(link.attr("target"), Some("_blank"));
        assert_eq!(
            page.document.get("player").unwrap().style("visibility").as_deref(),
            Some("hidden")
        );
    }

    #[tokio::test]
    async fn test_notify_reveals_and_centers() {
        let mut page = page();
        let size = ImageSize { width: 400, height: 300 };
        let mut lightbox = LightboxController::new(config(5), Arc::new(NotifyLoader { size }));
        let state = lightbox.show(&mut page, "img_1", "/full/1.jpg", None).await.unwrap();

        assert_eq!(state, LightboxState::Loaded(size));
        let panel = page.document.get("enlarge").unwrap();
        assert_eq!(panel.style("left").as_deref(), Some("300px"));
        assert!(!panel.select_first("div.caption").unwrap().is_hidden());
        let loading = panel.select_first("div.loading").unwrap();
        assert!(loading.is_hidden());
        assert_eq!(loading.style("width").as_deref(), Some("400px"));
        assert!(panel.select_first("div.credit").unwrap().is_hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_until_ready() {
        let mut page = page();
        let probes = Arc::new(AtomicU32::new(0));
        let loader = ProbeLoader {
            ready_after: Some(3),
            probes: Arc::clone(&probes),
        };
        let mut lightbox = LightboxController::new(config(10), Arc::new(loader));
        let state = lightbox.show(&mut page, "img_1", "/full/1.jpg", None).await.unwrap();
        assert!(matches!(state, LightboxState::Loaded(_)));
        assert_eq!(probes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_gives_up_after_max_polls() {
        let mut page = page();
        let probes = Arc::new(AtomicU32::new(0));
        let loader = ProbeLoader {
            ready_after: None,
            probes: Arc::clone(&probes),
        };
        let mut lightbox = LightboxController::new(config(4), Arc::new(loader));
        let state = lightbox.show(&mut page, "img_1", "/full/1.jpg", None).await.unwrap();
        assert_eq!(state, LightboxState::Failed);
        assert_eq!(probes.load(Ordering::SeqCst), 4);
        assert!(page.document.contains("enlarge"));
    }

    #[tokio::test]
    async fn test_dropped_notification_fails() {
        let mut page = page();
        let mut lightbox =
            LightboxController::new(config(4), Arc::new(DroppedLoader));
        let state = lightbox.show(&mut page, "img_1", "/full/1.jpg", None).await.unwrap();
        assert_eq!(state, LightboxState::Failed);
    }

    #[tokio::test]
    async fn test_close_restores_page() {
        let mut page = page();
        let size = ImageSize { width: 10, height: 10 };
        let mut lightbox = LightboxController::new(config(5), Arc::new(NotifyLoader { size }));
        lightbox.show(&mut page, "img_1", "/full/1.jpg", None).await.unwrap();
        lightbox.close(&mut page);

        assert_eq!(lightbox.state(), LightboxState::Closed);
        assert!(!page.lightbox_active());
        assert!(!page.document.contains("enlarge"));
        assert!(!page.document.contains("enlarge_bg"));
        assert_eq!(
            page.document.get("player").unwrap().style("visibility").as_deref(),
            Some("visible")
        );
    }

    #[tokio::test]
    async fn test_wait_requires_open() {
        let mut page = page();
        let size = ImageSize { width: 10, height: 10 };
        let mut lightbox = LightboxController::new(config(5), Arc::new(NotifyLoader { size }));
        assert!(matches!(
            lightbox.wait(&mut page, "/full/1.jpg").await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn test_centered_left() {
        assert_eq!(centered_left(1000, 400), 300);
        assert_eq!(centered_left(300, 500), -100);
    }
}
