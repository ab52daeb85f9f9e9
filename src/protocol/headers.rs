//! Handshake response headers as text.
//!
//! The host's `on_open` entry point receives the upgrade response headers
//! as one string, one `Name: value` pair per line. [`ResponseHeaders`]
//! renders that text from the transport's header map and parses it back
//! for hosts that need individual values.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tokio_tungstenite::tungstenite::http::HeaderMap;

// ============================================================================
// Constants
// ============================================================================

/// Header carrying the negotiated subprotocol.
pub const SEC_WEBSOCKET_PROTOCOL: &str = "Sec-WebSocket-Protocol";

/// Header carrying the negotiated extensions.
pub const SEC_WEBSOCKET_EXTENSIONS: &str = "Sec-WebSocket-Extensions";

/// Separator between a header name and its value.
const NAME_VALUE_SEPARATOR: &str = ": ";

// ============================================================================
// ResponseHeaders
// ============================================================================

/// Ordered list of response header pairs.
///
/// Duplicate names are kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    /// Creates an empty header list.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the list from an HTTP header map.
    ///
    /// The map stores names lowercase; they are rendered in canonical case
    /// (`Sec-WebSocket-Accept`, `Content-Type`). Values that are not
    /// visible ASCII are decoded lossily.
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let entries = map
            .iter()
            .map(|(name, value)| {
                (
                    canonical_name(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self { entries }
    }

    /// Parses `Name: value` lines.
    ///
    /// Lines without a separator are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.split_once(NAME_VALUE_SEPARATOR))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .filter(|(name, _)| !name.is_empty())
            .collect();

        Self { entries }
    }

    /// Appends a header pair.
    #[inline]
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the first value for `name` (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the negotiated subprotocol, if any.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        self.get(SEC_WEBSOCKET_PROTOCOL)
    }

    /// Returns the negotiated extensions, if any.
    #[inline]
    #[must_use]
    pub fn extensions(&self) -> Option<&str> {
        self.get(SEC_WEBSOCKET_EXTENSIONS)
    }

    /// Returns the number of header pairs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over header pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Collapses the list into a map keyed by lowercase name.
    ///
    /// The first value seen for a name wins.
    #[must_use]
    pub fn to_map(&self) -> FxHashMap<String, String> {
        let mut map = FxHashMap::default();
        for (name, value) in &self.entries {
            map.entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.clone());
        }
        map
    }

    /// Renders the `Name: value\n` text handed to the host.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (name, value) in &self.entries {
            text.push_str(name);
            text.push_str(NAME_VALUE_SEPARATOR);
            text.push_str(value);
            text.push('\n');
        }
        text
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Upper-cases the first letter of each `-` separated word, spelling
/// `websocket` as `WebSocket`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            if word.eq_ignore_ascii_case("websocket") {
                return "WebSocket".to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_tungstenite::tungstenite::http::HeaderValue;
    use tokio_tungstenite::tungstenite::http::header;

    #[test]
    fn test_text_round_trip_keeps_duplicates() {
        let mut headers = ResponseHeaders::new();
        headers.push("Upgrade", "websocket");
        headers.push("Set-Cookie", "a=1");
        headers.push("Set-Cookie", "b=2");

        let text = headers.to_text();
        assert_eq!(text, "Upgrade: websocket\nSet-Cookie: a=1\nSet-Cookie: b=2\n");
        assert_eq!(ResponseHeaders::parse(&text), headers);
    }

    #[test]
    fn test_get_is_case_insensitive() {
        let headers = ResponseHeaders::parse(
            "sec-websocket-extensions: permessage-deflate\nsec-websocket-protocol: chat\n",
        );
        assert_eq!(headers.extensions(), Some("permessage-deflate"));
        assert_eq!(headers.protocol(), Some("chat"));
        assert_eq!(headers.get("Missing"), None);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let headers = ResponseHeaders::parse("garbage\nA: 1\n: orphan\n\n");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("a"), Some("1"));
    }

    #[test]
    fn test_to_map_first_value_wins() {
        let headers = ResponseHeaders::parse("X-Id: first\nx-id: second\n");
        let map = headers.to_map();
        assert_eq!(map.get("x-id").map(String::as_str), Some("first"));
    }

    #[test]
    fn test_from_header_map() {
        let mut map = HeaderMap::new();
        map.append("upgrade", HeaderValue::from_static("websocket"));
        map.append("x-trace", HeaderValue::from_static("1"));
        map.append("x-trace", HeaderValue::from_static("2"));

        let headers = ResponseHeaders::from_header_map(&map);
        assert_eq!(headers.len(), 3);
        let traces: Vec<_> = headers
            .iter()
            .filter(|(name, _)| *name == "X-Trace")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(traces, vec!["1", "2"]);
    }

    #[test]
    fn test_from_header_map_canonical_names() {
        let mut map = HeaderMap::new();
        map.append(header::UPGRADE, HeaderValue::from_static("websocket"));
        map.append(header::SEC_WEBSOCKET_EXTENSIONS, HeaderValue::from_static("permessage-deflate"));
        map.append(header::SEC_WEBSOCKET_ACCEPT, HeaderValue::from_static("s3pPLMBiTxaQ9kYGzzhZRbK+xOo="));

        let text = ResponseHeaders::from_header_map(&map).to_text();
        assert!(text.contains("Upgrade: websocket\n"), "{text}");
        assert!(text.contains("Sec-WebSocket-Extensions: permessage-deflate\n"), "{text}");
        assert!(text.contains("Sec-WebSocket-Accept: "), "{text}");
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("sec-websocket-protocol"), "Sec-WebSocket-Protocol");
        assert_eq!(canonical_name("x-trace"), "X-Trace");
        assert_eq!(canonical_name("etag"), "Etag");
    }
}
