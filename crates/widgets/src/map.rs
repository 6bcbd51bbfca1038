//! Map of crowdsourced submissions.
//!
//! The map SDK itself is behind [`MapProvider`]; this module decides what the
//! map shows (markers, center, zoom) and drives the submission details panel.

use std::f64::consts::PI;
use std::sync::Arc;

use async_trait::async_trait;
use crowdsource_common::{AppError, AppResult, MapConfig, QueryParams, Transport};
use crowdsource_html::{Element, parse_fragment};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::enlarge::init_enlargeable;
use crate::loader::LoadGate;
use crate::page::Page;

const UNSUPPORTED: &str = "Sorry! Your browser doesn't support Google Maps.";
const NO_LOCATIONS: &str = "There aren't any locations to show on this map, but as soon as we get some we'll put a map here.";

/// Largest latitude Web Mercator can project.
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;
const TILE_SIZE: f64 = 256.0;

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// One submission from the map results endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Details fragment for the submission.
    pub url: String,
    /// Custom marker image.
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MapResults {
    #[serde(default)]
    entries: Vec<MapEntry>,
}

/// Smallest box containing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Southern edge.
    pub min_lat: f64,
    /// Western edge.
    pub min_lng: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Eastern edge.
    pub max_lng: f64,
}

impl BoundingBox {
    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.min_lat + self.max_lat) / 2.0,
            lng: (self.min_lng + self.max_lng) / 2.0,
        }
    }
}

/// Bounding box of `entries`, or `None` when there are none.
#[must_use]
pub fn bounding_box(entries: &[MapEntry]) -> Option<BoundingBox> {
    let first = entries.first()?;
    let start = BoundingBox {
        min_lat: first.lat,
        min_lng: first.lng,
        max_lat: first.lat,
        max_lng: first.lng,
    };
    Some(entries[1..].iter().fold(start, |b, e| BoundingBox {
        min_lat: b.min_lat.min(e.lat),
        min_lng: b.min_lng.min(e.lng),
        max_lat: b.max_lat.max(e.lat),
        max_lng: b.max_lng.max(e.lng),
    }))
}

/// Highest zoom at which `bounds` fits a `width` x `height` viewport under
/// Web Mercator, capped at `max_zoom`. A zero-size box yields `max_zoom`; a
/// viewport with no pixels on a spanned axis yields 0.
#[must_use]
pub fn bounds_zoom_level(bounds: &BoundingBox, width: u32, height: u32, max_zoom: u8) -> u8 {
    let lng_fraction = (bounds.max_lng - bounds.min_lng).abs() / 360.0;
    let lat_fraction = (mercator_y(bounds.max_lat) - mercator_y(bounds.min_lat)).abs() / (2.0 * PI);
    if lng_fraction <= 0.0 && lat_fraction <= 0.0 {
        return max_zoom;
    }

    let fit = |pixels: u32, fraction: f64| {
        if fraction <= 0.0 {
            f64::INFINITY
        } else if pixels == 0 {
            0.0
        } else {
            (f64::from(pixels) / TILE_SIZE / fraction).log2()
        }
    };
    clamp_zoom(fit(width, lng_fraction).min(fit(height, lat_fraction)), max_zoom)
}

fn clamp_zoom(zoom: f64, max_zoom: u8) -> u8 {
    zoom.floor().clamp(0.0, f64::from(max_zoom)) as u8
}

fn mercator_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    (PI / 4.0 + lat / 2.0).tan().ln()
}

/// The map SDK.
#[async_trait]
pub trait MapProvider: Send + Sync {
    /// Load the SDK. Runs at most once per [`LoadGate`].
    async fn load(&self) -> AppResult<()>;

    /// Whether maps can be shown in this environment.
    fn is_compatible(&self) -> bool;
}

/// Marker image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerIcon {
    /// The provider's default pin.
    Default,
    /// An image URL.
    Custom(String),
}

/// A marker placed for one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Position.
    pub position: LatLng,
    /// Image.
    pub icon: MarkerIcon,
    /// Details fragment URL.
    pub url: String,
}

/// What a rendered map shows.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Map center.
    pub center: LatLng,
    /// Zoom level.
    pub zoom: u8,
    /// One marker per entry, in response order.
    pub markers: Vec<Marker>,
}

/// Parameters of one map widget.
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    /// Map container id.
    pub div_id: String,
    /// Details panel id.
    pub details_id: String,
    /// Results endpoint.
    pub results_url: String,
    /// Fixed center; derived from the entries when `None`.
    pub center: Option<LatLng>,
    /// Fixed zoom; fitted to the entries when `None`.
    pub zoom: Option<u8>,
}

/// How [`MapController::setup`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum MapStatus {
    /// Markers are shown.
    Rendered,
    /// The endpoint returned no entries.
    Empty,
    /// The endpoint failed with the given status.
    Failed(String),
    /// The provider cannot show maps here.
    Unsupported,
}

/// Drives one map widget.
pub struct MapController {
    transport: Arc<dyn Transport>,
    provider: Arc<dyn MapProvider>,
    gate: Arc<LoadGate<()>>,
    config: MapConfig,
    request: Option<MapRequest>,
    view: Option<MapView>,
}

impl std::fmt::Debug for MapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapController")
            .field("config", &self.config)
            .field("request", &self.request)
            .field("view", &self.view)
            .finish_non_exhaustive()
    }
}

impl MapController {
    /// Create a controller. Maps on one page share `gate`.
    pub fn new(
        transport: Arc<dyn Transport>,
        provider: Arc<dyn MapProvider>,
        gate: Arc<LoadGate<()>>,
        config: MapConfig,
    ) -> Self {
        Self {
            transport,
            provider,
            gate,
            config,
            request: None,
            view: None,
        }
    }

    /// The rendered view, once set up.
    #[must_use]
    pub const fn view(&self) -> Option<&MapView> {
        self.view.as_ref()
    }

    /// Load the provider, fetch entries and render the map.
    pub async fn setup(&mut self, page: &mut Page, request: MapRequest) -> AppResult<MapStatus> {
        let provider = Arc::clone(&self.provider);
        self.gate.wait(|| async move { provider.load().await }).await?;

        if !self.provider.is_compatible() {
            set_message(page, &request.div_id, UNSUPPORTED)?;
            return Ok(MapStatus::Unsupported);
        }

        let query = page.query_params();
        debug!(url = %request.results_url, "Fetching map entries");
        let result = self.fetch_entries(&request.results_url, &query).await;
        if !page.document.contains(&request.div_id) {
            info!(div_id = %request.div_id, "Map target left the page, not rendering");
            return Err(AppError::MissingElement(request.div_id));
        }

        let entries = match result {
            Ok(entries) => entries,
            Err(err) => {
                let status = match &err {
                    AppError::Status { status, .. } => status.to_string(),
                    other => other.status_text(),
                };
                warn!(url = %request.results_url, status = %status, "Map results failed");
                set_message(
                    page,
                    &request.div_id,
                    &format!("The crowdsourcing API is experiencing problems. It returned status {status}."),
                )?;
                return Ok(MapStatus::Failed(status));
            }
        };

        let Some(bounds) = bounding_box(&entries) else {
            set_message(page, &request.div_id, NO_LOCATIONS)?;
            return Ok(MapStatus::Empty);
        };

        let view = MapView {
            center: request.center.unwrap_or_else(|| bounds.center()),
            zoom: request.zoom.unwrap_or_else(|| {
                bounds_zoom_level(
                    &bounds,
                    self.config.viewport_width,
                    self.config.viewport_height,
                    self.config.max_zoom,
                )
            }),
            markers: entries
                .into_iter()
                .map(|e| Marker {
                    position: LatLng { lat: e.lat, lng: e.lng },
                    icon: e.icon.filter(|i| !i.is_empty()).map_or(MarkerIcon::Default, MarkerIcon::Custom),
                    url: e.url,
                })
                .collect(),
        };
        render_view(page, &request.div_id, &view)?;
        info!(
            div_id = %request.div_id,
            markers = view.markers.len(),
            zoom = view.zoom,
            "Map rendered"
        );
        self.view = Some(view);
        self.request = Some(request);
        Ok(MapStatus::Rendered)
    }

    async fn fetch_entries(&self, url: &str, query: &QueryParams) -> AppResult<Vec<MapEntry>> {
        let response = self.transport.get(url, query).await?.error_for_status()?;
        Ok(response.json::<MapResults>()?.entries)
    }

    /// Show the details of marker `index` in the details panel.
    pub async fn select_marker(&self, page: &mut Page, index: usize) -> AppResult<()> {
        let (Some(request), Some(view)) = (&self.request, &self.view) else {
            return Err(AppError::InvalidState("map is not set up".to_string()));
        };
        let marker = view
            .markers
            .get(index)
            .ok_or_else(|| AppError::InvalidState(format!("map has no marker {index}")))?;
        let details_id = request.details_id.clone();
        let url = marker.url.clone();

        let details = page
            .document
            .get_mut(&details_id)
            .ok_or_else(|| AppError::MissingElement(details_id.clone()))?;
        details.clear();
        details.append(
            Element::new("img")
                .with_class("loading")
                .with_attr("src", self.config.loading_image.as_str())
                .with_attr("alt", "loading"),
        );
        details.show();

        debug!(url = %url, "Fetching submission details");
        let result = self
            .transport
            .get(&url, &QueryParams::new())
            .await
            .and_then(|r| r.error_for_status());
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Submission details failed");
                return Err(err);
            }
        };

        let details = page
            .document
            .get_mut(&details_id)
            .ok_or_else(|| AppError::MissingElement(details_id.clone()))?;
        details.clear();
        details.append(close_control("top_close"));
        for node in parse_fragment(&response.body) {
            details.append(node);
        }
        details.append(close_control("bottom_close"));
        init_enlargeable(page, Some(&details_id))?;
        Ok(())
    }

    /// Hide the details panel.
    pub fn close_details(&self, page: &mut Page) -> AppResult<()> {
        let request = self
            .request
            .as_ref()
            .ok_or_else(|| AppError::InvalidState("map is not set up".to_string()))?;
        let details = page
            .document
            .get_mut(&request.details_id)
            .ok_or_else(|| AppError::MissingElement(request.details_id.clone()))?;
        details.hide();
        Ok(())
    }
}

/// Show or hide the embed-code `fieldset` inside the map wrapper
/// `#wrapper_id`. Both the embed link and the fieldset's close button call
/// this.
///
/// Returns `true` when the fieldset is now visible.
pub fn toggle_map_embed(page: &mut Page, wrapper_id: &str) -> AppResult<bool> {
    let wrapper = page
        .document
        .get_mut(wrapper_id)
        .ok_or_else(|| AppError::MissingElement(wrapper_id.to_string()))?;
    let mut visible = false;
    let toggled = wrapper.select_each_mut("fieldset", |fieldset| {
        if fieldset.is_hidden() {
            fieldset.show();
        } else {
            fieldset.hide();
        }
        visible = !fieldset.is_hidden();
    });
    if toggled == 0 {
        return Err(AppError::MissingElement(format!("{wrapper_id} fieldset")));
    }
    debug!(wrapper_id, visible, "Toggled map embed code");
    Ok(visible)
}

fn set_message(page: &mut Page, div_id: &str, message: &str) -> AppResult<()> {
    let div = page
        .document
        .get_mut(div_id)
        .ok_or_else(|| AppError::MissingElement(div_id.to_string()))?;
    div.set_text(message);
    Ok(())
}

fn render_view(page: &mut Page, div_id: &str, view: &MapView) -> AppResult<()> {
    let div = page
        .document
        .get_mut(div_id)
        .ok_or_else(|| AppError::MissingElement(div_id.to_string()))?;
    div.clear();
    div.set_attr("data-center-lat", view.center.lat.to_string());
    div.set_attr("data-center-lng", view.center.lng.to_string());
    div.set_attr("data-zoom", view.zoom.to_string());
    for (i, marker) in view.markers.iter().enumerate() {
        let mut el = Element::new("div")
            .with_class("marker")
            .with_attr("data-index", i.to_string())
            .with_attr("data-lat", marker.position.lat.to_string())
            .with_attr("data-lng", marker.position.lng.to_string());
        if let MarkerIcon::Custom(icon) = &marker.icon {
            el.set_attr("data-icon", icon.as_str());
        }
        div.append(el);
    }
    Ok(())
}

fn close_control(class: &str) -> Element {
    Element::new("div")
        .with_class(class)
        .with_child(Element::new("a").with_attr("href", "#").with_text("Close"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lat: f64, lng: f64) -> MapEntry {
        MapEntry {
            lat,
            lng,
            url: "/s/1/".to_string(),
            icon: None,
        }
    }

    #[test]
    fn test_bounding_box() {
        let b = bounding_box(&[entry(10.0, 20.0), entry(30.0, 5.0)]).unwrap();
        assert_eq!(
            (b.min_lat, b.min_lng, b.max_lat, b.max_lng),
            (10.0, 5.0, 30.0, 20.0)
        );
        assert_eq!(b.center(), LatLng { lat: 20.0, lng: 12.5 });
    }

    #[test]
    fn test_single_entry_box() {
        let b = bounding_box(&[entry(1.0, 1.0)]).unwrap();
        assert_eq!((b.min_lat, b.min_lng, b.max_lat, b.max_lng), (1.0, 1.0, 1.0, 1.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_zoom_levels() {
        let point = bounding_box(&[entry(1.0, 1.0)]).unwrap();
        assert_eq!(bounds_zoom_level(&point, 500, 320, 19), 19);

        let city = BoundingBox {
            min_lat: 40.70,
            min_lng: -74.02,
            max_lat: 40.80,
            max_lng: -73.93,
        };
        assert_eq!(bounds_zoom_level(&city, 500, 320, 19), 11);
        assert_eq!(bounds_zoom_level(&city, 500, 320, 9), 9);

        let region = bounding_box(&[entry(10.0, 20.0), entry(30.0, 5.0)]).unwrap();
        assert_eq!(bounds_zoom_level(&region, 500, 320, 19), 4);

        let world = BoundingBox {
            min_lat: -89.0,
            min_lng: -180.0,
            max_lat: 89.0,
            max_lng: 180.0,
        };
        assert_eq!(bounds_zoom_level(&world, 100, 100, 19), 0);
    }

    #[test]
    fn test_zoom_with_one_flat_axis() {
        let row = BoundingBox {
            min_lat: 5.0,
            min_lng: 0.0,
            max_lat: 5.0,
            max_lng: 1.0,
        };
        let zoom = bounds_zoom_level(&row, 500, 320, 19);
        assert!(zoom < 19);
    }

    #[test]
    fn test_zoom_for_empty_viewport() {
        let region = bounding_box(&[entry(10.0, 20.0), entry(30.0, 5.0)]).unwrap();
        assert_eq!(bounds_zoom_level(&region, 0, 320, 19), 0);
        assert_eq!(bounds_zoom_level(&region, 500, 0, 19), 0);

        let point = bounding_box(&[entry(1.0, 1.0)]).unwrap();
        assert_eq!(bounds_zoom_level(&point, 0, 0, 19), 19);
    }

    #[test]
    fn test_toggle_map_embed() {
        let html = concat!(
            r#"<div id="map_wrap" class="google_map_wrapper">"#,
            r##"<ul class="map_tools"><li><a href="#" class="map_embed_link">embed</a></li></ul>"##,
            r#"<fieldset class="map_embed" style="display: none;"><textarea readonly="">embed</textarea>"#,
            r##"<a class="close-map-button" href="#">Close</a></fieldset></div>"##,
        );
        let mut page = Page::new(html, "https://example.com/map/").unwrap();

        assert!(toggle_map_embed(&mut page, "map_wrap").unwrap());
        assert!(!page.document.select_first("fieldset").unwrap().is_hidden());
        assert!(!toggle_map_embed(&mut page, "map_wrap").unwrap());
        assert!(page.document.select_first("fieldset").unwrap().is_hidden());

        assert!(toggle_map_embed(&mut page, "nowhere").is_err());
    }

    #[test]
    fn test_entry_icon_deserializes_optional() {
        let e: MapEntry =
            serde_json::from_str(r#"{"lat": 1.5, "lng": 2.5, "url": "/s/9/"}"#).unwrap();
        assert!(e.icon.is_none());
    }
}
