//! Query-string handling.
//!
//! Widgets forward the current page's filter parameters to the report and
//! map endpoints. Only keys carrying a non-empty value survive parsing.

use std::collections::BTreeMap;
use url::{Url, form_urlencoded};

/// Ordered key/value lookup built from a query string.
pub type QueryParams = BTreeMap<String, String>;

/// Parse a query string such as `?a=1&b=2&c=` into a lookup.
///
/// A leading `?` is ignored, pairs without `=` or with an empty value are
/// dropped, and a repeated key keeps its last value.
#[must_use]
pub fn parse_query(query: &str) -> QueryParams {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = QueryParams::new();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let key = decode_component(key);
        let value = decode_component(value);
        params.insert(key, value);
    }

    params
}

/// Parse the query portion of a full URL.
#[must_use]
pub fn query_from_url(url: &Url) -> QueryParams {
    url.query().map(parse_query).unwrap_or_default()
}

/// Serialize a lookup back into `a=1&b=2` form.
#[must_use]
pub fn to_query_string(params: &QueryParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

fn decode_component(raw: &str) -> String {
    form_urlencoded::parse(format!("{raw}=").as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_else(|| raw.to_string())
}
