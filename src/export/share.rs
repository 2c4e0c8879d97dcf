//! Shareable links
//!
//! A share link is the page URL (origin and path only) with two query
//! parameters: `theme=<id>` and `share=<payload>`, where the payload is
//! standard base64 of a small JSON object.

use base64::Engine;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{form_urlencoded, Url};

/// Payload format version written into new links.
pub const SHARE_VERSION: &str = "1.0";

/// Source tag written into new links.
pub const SHARE_SOURCE: &str = "phantom-thief-resume";

/// Links older than this still parse, with a warning.
pub const MAX_SHARE_AGE_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Decoded `share` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    pub theme: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ShareData {
    pub fn new(theme: &str, now_ms: i64) -> Self {
        Self {
            theme: theme.to_string(),
            timestamp: now_ms,
            version: SHARE_VERSION.to_string(),
            source: Some(SHARE_SOURCE.to_string()),
        }
    }

    /// Base64 of the JSON form.
    pub fn encode(&self) -> String {
        // Serializing a struct of strings and an integer cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) > MAX_SHARE_AGE_MS
    }
}

/// Origin plus path of a URL: query and fragment dropped.
///
/// Input that is not an absolute URL is only cut at the first `?` or `#`.
pub fn base_url(page_url: &str) -> String {
    match Url::parse(page_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.into()
        }
        Err(_) => {
            let end = page_url.find(['?', '#']).unwrap_or(page_url.len());
            page_url[..end].to_string()
        }
    }
}

/// Build `<origin+path>?theme=<id>&share=<base64(json)>` with both values
/// form-encoded.
pub fn build_share_link(page_url: &str, theme: &str, now_ms: i64) -> String {
    let payload = ShareData::new(theme, now_ms).encode();
    match Url::parse(page_url) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.query_pairs_mut()
                .append_pair("theme", theme)
                .append_pair("share", &payload);
            url.into()
        }
        Err(e) => {
            warn!("Page URL \"{}\" is not absolute ({}), linking relative", page_url, e);
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("theme", theme)
                .append_pair("share", &payload)
                .finish();
            format!("{}?{}", base_url(page_url), query)
        }
    }
}

/// Decode a `share` parameter value.
///
/// Invalid base64 or JSON, a missing/empty theme, or a missing or
/// non-numeric timestamp yield `None`. Data older than 30 days is returned
/// with a warning.
pub fn parse_shared_data(encoded: &str, now_ms: i64) -> Option<ShareData> {
    match decode_share_data(encoded) {
        Ok(data) => {
            if data.is_stale(now_ms) {
                warn!("Shared data is older than 30 days");
            }
            Some(data)
        }
        Err(e) => {
            error!("Failed to parse shared data: {}", e);
            None
        }
    }
}

fn decode_share_data(encoded: &str) -> Result<ShareData, String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("invalid base64: {}", e))?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "Invalid share data structure".to_string())?;

    let theme = object
        .get("theme")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Invalid share data structure".to_string())?;
    let timestamp = object
        .get("timestamp")
        .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(|f| f as i64)))
        .filter(|t| *t != 0)
        .ok_or_else(|| "Invalid share data structure".to_string())?;

    Ok(ShareData {
        theme: theme.to_string(),
        timestamp,
        version: object
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source: object
            .get("source")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// What a visited share link carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SharedLink {
    pub theme: Option<String>,
    pub data: Option<ShareData>,
}

/// Pull `theme` and `share` out of a full URL. Missing or broken parameters
/// come back as `None`.
pub fn parse_share_url(url: &str, now_ms: i64) -> SharedLink {
    let mut link = SharedLink::default();
    let url = match Url::parse(url) {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot parse share URL: {}", e);
            return link;
        }
    };

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "theme" if !value.is_empty() => link.theme = Some(value.into_owned()),
            // A raw `+` in the payload decodes as a space.
            "share" => link.data = parse_shared_data(&value.replace(' ', "+"), now_ms),
            _ => {}
        }
    }
    link
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn encode_json(json: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    #[test]
    fn test_link_round_trip() {
        let link = build_share_link("https://kaito.dev/resume?old=1#top", "ninja", NOW);
        assert!(link.starts_with("https://kaito.dev/resume?theme=ninja&share="));

        let parsed = parse_share_url(&link, NOW);
        assert_eq!(parsed.theme.as_deref(), Some("ninja"));
        let data = parsed.data.unwrap();
        assert_eq!(data, ShareData::new("ninja", NOW));
        assert_eq!(data.version, "1.0");
        assert_eq!(data.source.as_deref(), Some("phantom-thief-resume"));
    }

    #[test]
    fn test_invalid_payloads_are_rejected() {
        assert_eq!(parse_shared_data("%%%not-base64", NOW), None);
        assert_eq!(parse_shared_data(&encode_json("not json"), NOW), None);
        assert_eq!(parse_shared_data(&encode_json("[1, 2]"), NOW), None);
        assert_eq!(
            parse_shared_data(&encode_json(r#"{"theme": "", "timestamp": 5}"#), NOW),
            None
        );
        assert_eq!(
            parse_shared_data(&encode_json(r#"{"theme": "mech"}"#), NOW),
            None
        );
        assert_eq!(
            parse_shared_data(&encode_json(r#"{"theme": "mech", "timestamp": "yesterday"}"#), NOW),
            None
        );
    }

    #[test]
    fn test_stale_data_still_returned() {
        let old = ShareData::new("pirate", NOW - 31 * DAY_MS);
        assert!(old.is_stale(NOW));
        assert_eq!(parse_shared_data(&old.encode(), NOW), Some(old));

        let fresh = ShareData::new("pirate", NOW - 29 * DAY_MS);
        assert!(!fresh.is_stale(NOW));
    }

    #[test]
    fn test_minimal_payload_parses() {
        let data = parse_shared_data(&encode_json(r#"{"theme":"mech","timestamp":42}"#), NOW).unwrap();
        assert_eq!(data.theme, "mech");
        assert_eq!(data.version, "");
        assert_eq!(data.source, None);
    }

    #[test]
    fn test_share_url_tolerates_encoding_and_missing_params() {
        let encoded = ShareData::new("persona", NOW).encode();
        let escaped = encoded.replace('+', "%2B").replace('/', "%2F").replace('=', "%3D");
        let url = format!("https://x.dev/?share={}&theme=persona#frag", escaped);
        let parsed = parse_share_url(&url, NOW);
        assert_eq!(parsed.theme.as_deref(), Some("persona"));
        assert!(parsed.data.is_some());

        assert_eq!(parse_share_url("https://x.dev/", NOW), SharedLink::default());
        assert_eq!(parse_share_url("https://x.dev/?theme=&share=@@", NOW), SharedLink::default());
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("https://a.dev/p?q=1"), "https://a.dev/p");
        assert_eq!(base_url("https://a.dev/p#x"), "https://a.dev/p");
        assert_eq!(base_url("https://a.dev/"), "https://a.dev/");
        assert_eq!(base_url("resume.html?x=1"), "resume.html");
    }

    #[test]
    fn test_reserved_characters_in_theme_survive() {
        let link = build_share_link("https://x.dev/", "dark mode&x=1", NOW);
        assert!(link.starts_with("https://x.dev/?theme=dark+mode%26x%3D1&share="));

        let parsed = parse_share_url(&link, NOW);
        assert_eq!(parsed.theme.as_deref(), Some("dark mode&x=1"));
        assert_eq!(parsed.data.unwrap().theme, "dark mode&x=1");
    }

    #[test]
    fn test_percent_escapes_are_decoded() {
        let parsed = parse_share_url("https://x.dev/?theme=n%69nja", NOW);
        assert_eq!(parsed.theme.as_deref(), Some("ninja"));
        assert_eq!(parsed.data, None);
    }

    #[test]
    fn test_relative_page_url_still_links() {
        let link = build_share_link("resume.html#top", "mech", NOW);
        assert!(link.starts_with("resume.html?theme=mech&share="));
        assert_eq!(parse_share_url("resume.html?theme=mech", NOW), SharedLink::default());
    }
}
