//! HTML entity encoding and decoding.

use regex::{Captures, Regex};

#[allow(clippy::unwrap_used)]
static ENTITY_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap()
});

/// Escape HTML special characters.
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Escape text content. Quotes are left alone.
#[must_use]
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Decode named and numeric character references.
///
/// Unknown named references are kept verbatim.
#[must_use]
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    ENTITY_RE
        .replace_all(s, |caps: &Captures| {
            let whole = &caps[0];
            let body = &caps[1];
            decode_reference(body).map_or_else(|| whole.to_string(), String::from)
        })
        .into_owned()
}

fn decode_reference(body: &str) -> Option<char> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "copy" => Some('\u{a9}'),
        "hellip" => Some('\u{2026}'),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<script>"), "&lt;script&gt;");
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("\"x\" 'y'"), "&quot;x&quot; &#x27;y&#x27;");
    }

    #[test]
    fn test_escape_text_keeps_quotes() {
        assert_eq!(escape_text("Say \"hi\" & <go>"), "Say \"hi\" &amp; &lt;go&gt;");
    }

    #[test]
    fn test_unescape_named_and_numeric() {
        assert_eq!(unescape("hello &amp; world &quot;quotes&quot;"), "hello & world \"quotes\"");
        assert_eq!(unescape("&#39;a&#x27;"), "'a'");
        assert_eq!(unescape("&#8230;"), "\u{2026}");
    }

    #[test]
    fn test_unescape_unknown_is_verbatim() {
        assert_eq!(unescape("AT&T &bogus; &"), "AT&T &bogus; &");
    }

    #[test]
    fn test_unescape_is_single_pass() {
        assert_eq!(unescape("&amp;amp;"), "&amp;");
    }
}
