//! Aggregate results pages.

use crowdsource_common::{AppError, AppResult, BackendConfig, Transport};
use crowdsource_html::{Element, Node};
use tracing::{info, warn};

use crate::enlarge::init_enlargeable;
use crate::page::Page;

const REPORT_BROKEN: &str = "The reports appear to be broken. Sorry about that! ";

/// Report endpoint for `survey_slug`, optionally narrowed to one report.
#[must_use]
pub fn report_path(config: &BackendConfig, survey_slug: &str, report_slug: Option<&str>) -> String {
    let mut path = config.api_path(survey_slug, "report");
    if let Some(report) = report_slug.filter(|r| !r.is_empty()) {
        path.push_str(report);
        path.push('/');
    }
    path
}

/// Fetch the rendered report and place it in `#element_id`.
///
/// The page's query parameters are forwarded as report filters. On a failed
/// fetch the container shows an apology with the status in a hidden input.
/// Returns whether the report was loaded.
pub async fn load_survey_results(
    page: &mut Page,
    transport: &dyn Transport,
    config: &BackendConfig,
    survey_slug: &str,
    report_slug: Option<&str>,
    element_id: &str,
) -> AppResult<bool> {
    let url = report_path(config, survey_slug, report_slug);
    let query = page.query_params();
    let result = transport.get(&url, &query).await.and_then(|r| r.error_for_status());

    let container = page
        .document
        .get_mut(element_id)
        .ok_or_else(|| AppError::MissingElement(element_id.to_string()))?;
    match result {
        Ok(response) => {
            container.set_inner_html(&response.body);
            info!(slug = survey_slug, element_id, "Loaded survey report");
            init_enlargeable(page, Some(element_id))?;
            Ok(true)
        }
        Err(err) => {
            warn!(slug = survey_slug, error = %err, "Failed to load survey report");
            container.clear();
            container.append(Node::text(REPORT_BROKEN));
            container.append(
                Element::new("input")
                    .with_attr("type", "hidden")
                    .with_attr("value", err.status_text()),
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path() {
        let config = BackendConfig::default();
        assert_eq!(
            report_path(&config, "pizza", None),
            "/crowdsourcing/pizza/api/report/"
        );
        assert_eq!(
            report_path(&config, "pizza", Some("by-zip")),
            "/crowdsourcing/pizza/api/report/by-zip/"
        );
        assert_eq!(
            report_path(&config, "pizza", Some("")),
            "/crowdsourcing/pizza/api/report/"
        );
    }
}
