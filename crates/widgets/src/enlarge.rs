//! Wiring thumbnails for the lightbox.
//!
//! The backend marks an enlargeable image `#img_{n}` by emitting a hidden
//! input `#img_{n}_full_url` of class `enlargeable` whose value is the
//! full-size URL.

use crowdsource_common::{AppError, AppResult};
use crowdsource_html::Element;
use tracing::debug;

use crate::page::{Enlargeable, Page};

const MARKER: &str = "input.enlargeable[type=hidden]";

/// Wrap every not yet wired enlargeable image under `#parent_id` (or the
/// whole body when `None`) with its enlarge links.
///
/// Returns the number of images wired by this call.
pub fn init_enlargeable(page: &mut Page, parent_id: Option<&str>) -> AppResult<usize> {
    let parent = match parent_id {
        Some(id) => page
            .document
            .get_mut(id)
            .ok_or_else(|| AppError::MissingElement(id.to_string()))?,
        None => page.document.body_mut(),
    };

    let mut found = Vec::new();
    parent.select_each_mut(MARKER, |input| {
        if input.attr("data-initted") == Some("true") {
            return;
        }
        input.set_attr("data-initted", "true");
        let Some(img_id) = input.id().and_then(image_id) else {
            return;
        };
        let full_url = input.attr("value").unwrap_or_default().to_string();
        found.push(Enlargeable { img_id, full_url });
    });

    let mut wired = 0;
    for enlargeable in found {
        let Some(img) = page.document.get(&enlargeable.img_id).cloned() else {
            debug!(img_id = %enlargeable.img_id, "Enlargeable image missing");
            continue;
        };
        let div = enlarge_div(img);
        page.document
            .body_mut()
            .replace_by_id(&enlargeable.img_id, div);
        debug!(img_id = %enlargeable.img_id, url = %enlargeable.full_url, "Wired enlargeable image");
        page.register_enlargeable(enlargeable);
        wired += 1;
    }
    Ok(wired)
}

/// `img_12_full_url` -> `img_12`.
fn image_id(input_id: &str) -> Option<String> {
    let img_id = input_id.strip_suffix("_full_url")?;
    let digits = img_id.strip_prefix("img_")?;
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then(|| img_id.to_string())
}

fn enlarge_div(img: Element) -> Element {
    let mut div = Element::new("div").with_class("enlarge_div");
    if let (Some(width), Some(height)) = (img.attr("width"), img.attr("height"))
        && !width.is_empty()
        && !height.is_empty()
    {
        div.set_style("height", &px(height));
        div.set_style("width", &px(width));
    }
    div.with_child(Element::new("a").with_attr("href", "#").with_child(img))
        .with_child(
            Element::new("a")
                .with_attr("href", "#")
                .with_class("enlarge_link")
                .with_text("Enlarge"),
        )
}

fn px(value: &str) -> String {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{value}px")
    } else {
        value.to_string()
    }
}
