//! Widget container setup.

use crowdsource_common::{AppError, AppResult};
use crowdsource_html::{Document, Element};

/// Clear the container `#element_id`, tag it as a survey wrapper and wrap it
/// in `<div class="{wrapper_class}">`.
///
/// Returns the container id, which stays the handle for later lookups.
pub fn initialize_wrapper(
    document: &mut Document,
    element_id: &str,
    wrapper_class: &str,
) -> AppResult<String> {
    let container = document
        .get_mut(element_id)
        .ok_or_else(|| AppError::MissingElement(element_id.to_string()))?;
    container.clear();
    container.add_class("clearfix");
    container.add_class("survey_wrapper");

    let wrapper = Element::new("div").with_class(wrapper_class);
    if !document.body_mut().wrap_by_id(element_id, wrapper) {
        return Err(AppError::MissingElement(element_id.to_string()));
    }
    Ok(element_id.to_string())
}
