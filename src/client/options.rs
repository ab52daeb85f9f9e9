//! Client construction options and the per-connect snapshot.
//!
//! [`ClientOptions`] carries the constructor-time settings the host
//! passes when it creates a client. [`ConnectionConfig`] freezes those
//! settings together with the `connect` arguments.
//!
//! # Example
//!
//! ```
//! use websocket_bridge::ClientOptions;
//!
//! let options = ClientOptions::new()
//!     .with_header("Authorization", "Bearer abc")
//!     .with_tcp_no_delay()
//!     .with_timeout_ms(30_000);
//!
//! assert!(options.validate().is_ok());
//! ```
//!
//! # JSON Form
//!
//! Headers travel as one flat `[name, value, name, value, ...]` array:
//!
//! ```json
//! { "extraHeaders": ["X-Id", "7"], "tcpNoDelay": true, "perMessageDeflate": false, "timeoutMillis": 0 }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default handshake and write timeout (one hour).
pub const DEFAULT_TIMEOUT_MS: u64 = 3_600_000;

/// Separator between subprotocols in `Sec-WebSocket-Protocol`.
pub const PROTOCOL_SEPARATOR: &str = ", ";

// ============================================================================
// ClientOptions
// ============================================================================

/// Constructor-time client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// Extra upgrade request headers, in order. Duplicates are kept.
    #[serde(with = "flat_pairs")]
    pub extra_headers: Vec<(String, String)>,

    /// Disable Nagle's algorithm on the TCP socket.
    pub tcp_no_delay: bool,

    /// Offer `permessage-deflate` when the transport supports it.
    #[serde(rename = "perMessageDeflate")]
    pub permessage_deflate: bool,

    /// Handshake and write timeout in milliseconds; 0 disables it.
    ///
    /// An open connection with no traffic is never timed out.
    #[serde(rename = "timeoutMillis")]
    pub timeout_ms: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options with the default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extra_headers: Vec::new(),
            tcp_no_delay: false,
            permessage_deflate: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Parses options from their JSON form.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the text is not valid options JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Appends one extra header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Appends headers from a flat `[name, value, ...]` list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the list has an odd length.
    pub fn with_flat_headers<S: Into<String>>(
        mut self,
        flat: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let flat: Vec<String> = flat.into_iter().map(Into::into).collect();
        self.extra_headers.extend(pairs_from_flat(flat)?);
        Ok(self)
    }

    /// Disables Nagle's algorithm.
    #[inline]
    #[must_use]
    pub fn with_tcp_no_delay(mut self) -> Self {
        self.tcp_no_delay = true;
        self
    }

    /// Enables or disables the compression offer.
    #[inline]
    #[must_use]
    pub fn with_permessage_deflate(mut self, enabled: bool) -> Self {
        self.permessage_deflate = enabled;
        self
    }

    /// Sets the timeout in milliseconds (0 disables it).
    #[inline]
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ClientOptions {
    /// Returns the timeout, or `None` when disabled.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    /// Returns the headers as a flat `[name, value, ...]` list.
    #[must_use]
    pub fn flat_headers(&self) -> Vec<String> {
        self.extra_headers
            .iter()
            .flat_map(|(name, value)| [name.clone(), value.clone()])
            .collect()
    }

    /// Checks every extra header is a legal HTTP header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] naming the first bad header.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.extra_headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::invalid_header(format!("invalid header name: {name:?}")))?;
            HeaderValue::from_str(value).map_err(|_| {
                Error::invalid_header(format!("invalid value for header {name}"))
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Immutable snapshot taken when `connect` is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// URL as given by the host (not yet parsed).
    pub url: String,

    /// `Sec-WebSocket-Protocol` value; empty means none.
    pub subprotocol: String,

    /// Extra headers, in order.
    pub extra_headers: Vec<(String, String)>,

    /// Disable Nagle's algorithm.
    pub tcp_no_delay: bool,

    /// Offer `permessage-deflate`.
    pub permessage_deflate: bool,

    /// Timeout in milliseconds; 0 disables it.
    pub timeout_ms: u64,

    /// CA bundle path, if the host supplied one.
    pub ca_bundle_path: Option<String>,
}

impl ConnectionConfig {
    /// Freezes `options` together with the `connect` arguments.
    ///
    /// An empty CA path is treated as absent.
    #[must_use]
    pub fn new(
        options: &ClientOptions,
        url: impl Into<String>,
        subprotocol: impl Into<String>,
        ca_bundle_path: Option<&str>,
    ) -> Self {
        Self {
            url: url.into(),
            subprotocol: subprotocol.into(),
            extra_headers: options.extra_headers.clone(),
            tcp_no_delay: options.tcp_no_delay,
            permessage_deflate: options.permessage_deflate,
            timeout_ms: options.timeout_ms,
            ca_bundle_path: ca_bundle_path
                .filter(|path| !path.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// Returns the timeout, or `None` when disabled.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Joins several subprotocols into one `Sec-WebSocket-Protocol` value.
///
/// Blank entries are skipped.
#[must_use]
pub fn join_protocols<S: AsRef<str>>(protocols: &[S]) -> String {
    protocols
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PROTOCOL_SEPARATOR)
}

fn pairs_from_flat(flat: Vec<String>) -> Result<Vec<(String, String)>> {
    if flat.len() % 2 != 0 {
        return Err(Error::config(format!(
            "header list must hold name/value pairs, got {} entries",
            flat.len()
        )));
    }

    let mut iter = flat.into_iter();
    let mut pairs = Vec::new();
    while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
        pairs.push((name, value));
    }
    Ok(pairs)
}

/// Serde adapter for the flat header list.
mod flat_pairs {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(pairs.iter().flat_map(|(name, value)| [name, value]))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        let flat = Vec::<String>::deserialize(deserializer)?;
        super::pairs_from_flat(flat).map_err(D::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::new();
        assert!(options.extra_headers.is_empty());
        assert!(!options.tcp_no_delay);
        assert!(options.permessage_deflate);
        assert_eq!(options.timeout_ms, 3_600_000);
        assert_eq!(options, ClientOptions::default());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_header("X-A", "1")
            .with_header("X-A", "2")
            .with_tcp_no_delay()
            .with_permessage_deflate(false)
            .with_timeout_ms(0);

        assert_eq!(
            options.extra_headers,
            vec![("X-A".into(), "1".into()), ("X-A".into(), "2".into())]
        );
        assert!(options.tcp_no_delay);
        assert!(!options.permessage_deflate);
        assert_eq!(options.timeout(), None);
    }

    #[test]
    fn test_flat_headers() {
        let options = ClientOptions::new()
            .with_flat_headers(["A", "1", "B", "2"])
            .expect("pairs");
        assert_eq!(options.flat_headers(), vec!["A", "1", "B", "2"]);

        let err = ClientOptions::new().with_flat_headers(["A"]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_json_form() {
        let options = ClientOptions::from_json(
            r#"{"extraHeaders":["X-Id","7"],"tcpNoDelay":true,"timeoutMillis":500}"#,
        )
        .expect("parse");

        assert_eq!(options.extra_headers, vec![("X-Id".into(), "7".into())]);
        assert!(options.tcp_no_delay);
        assert!(options.permessage_deflate);
        assert_eq!(options.timeout(), Some(Duration::from_millis(500)));

        let json = serde_json::to_value(&options).expect("serialize");
        assert_eq!(json["extraHeaders"], serde_json::json!(["X-Id", "7"]));
        assert_eq!(json["perMessageDeflate"], serde_json::json!(true));
    }

    #[test]
    fn test_json_rejects_odd_header_list() {
        let err = ClientOptions::from_json(r#"{"extraHeaders":["X-Id"]}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_validate_headers() {
        assert!(ClientOptions::new().with_header("X-Ok", "v").validate().is_ok());

        let err = ClientOptions::new()
            .with_header("bad name", "v")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));

        let err = ClientOptions::new()
            .with_header("X-Bad", "line\nbreak")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHeader { .. }));
    }

    #[test]
    fn test_connection_config_snapshot() {
        let options = ClientOptions::new().with_header("A", "1").with_timeout_ms(10);
        let config = ConnectionConfig::new(&options, "wss://h/", "chat", Some(""));
        assert_eq!(config.ca_bundle_path, None);
        assert_eq!(config.extra_headers.len(), 1);
        assert_eq!(config.timeout(), Some(Duration::from_millis(10)));

        let config = ConnectionConfig::new(&options, "wss://h/", "", Some("assets/ca.pem"));
        assert_eq!(config.ca_bundle_path.as_deref(), Some("assets/ca.pem"));
    }

    #[test]
    fn test_join_protocols() {
        assert_eq!(join_protocols(&["chat", " superchat "]), "chat, superchat");
        assert_eq!(join_protocols(&["", "v1"]), "v1");
        assert_eq!(join_protocols::<&str>(&[]), "");
    }
}
