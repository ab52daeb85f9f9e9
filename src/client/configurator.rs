//! Turns a [`ConnectionConfig`] into a running transport session.
//!
//! # Steps
//!
//! 1. Parse and normalize the URL (`http` → `ws`, `https` → `wss`)
//! 2. Derive `Origin`
//! 3. Append extra headers and `Sec-WebSocket-Protocol`
//! 4. For `wss`, build the certificate validator (custom CA or platform)
//! 5. Apply socket tuning (`TCP_NODELAY`)
//! 6. Offer `permessage-deflate` if requested and supported
//! 7. Set timeouts
//! 8. Open the transport with the dispatcher as listener
//!
//! A failure at any step is reported to the host once through the
//! dispatcher and returned to the caller; no session is created.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{
    ORIGIN, SEC_WEBSOCKET_EXTENSIONS, SEC_WEBSOCKET_PROTOCOL,
};
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::host::EventDispatcher;
use crate::tls::{self, AssetResolver, TrustManager};
use crate::transport::{Transport, TransportListener, TransportRequest, TransportSession};

use super::options::ConnectionConfig;

// ============================================================================
// Constants
// ============================================================================

/// Compression offer sent when `permessage-deflate` is enabled.
pub const PERMESSAGE_DEFLATE_OFFER: &str = "permessage-deflate; client_max_window_bits";

/// Headers tungstenite writes itself; extra headers may not repeat them.
const HANDSHAKE_HEADERS: [&str; 5] = [
    "host",
    "connection",
    "upgrade",
    "sec-websocket-version",
    "sec-websocket-key",
];

// ============================================================================
// ConnectionConfigurator
// ============================================================================

/// Builds and issues one connect request.
#[derive(Clone, Copy)]
pub struct ConnectionConfigurator<'a> {
    transport: &'a dyn Transport,
    assets: &'a dyn AssetResolver,
    trust: &'a TrustManager,
}

impl<'a> ConnectionConfigurator<'a> {
    /// Creates a configurator over the given collaborators.
    #[inline]
    #[must_use]
    pub fn new(
        transport: &'a dyn Transport,
        assets: &'a dyn AssetResolver,
        trust: &'a TrustManager,
    ) -> Self {
        Self {
            transport,
            assets,
            trust,
        }
    }

    /// Configures and opens a connection.
    ///
    /// # Errors
    ///
    /// Returns the configuration or transport-start error after it has
    /// been scheduled for the host's `on_error`.
    pub fn connect(
        &self,
        config: &ConnectionConfig,
        dispatcher: &EventDispatcher,
    ) -> Result<Arc<dyn TransportSession>> {
        let opened = self.prepare(config).and_then(|request| {
            let listener: Arc<dyn TransportListener> = Arc::new(dispatcher.clone());
            self.transport.open(request, listener)
        });

        opened.inspect_err(|e| dispatcher.report_error(e))
    }

    /// Runs steps 1 through 7 without opening anything.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] for a malformed URL or unsupported scheme
    /// - [`Error::InvalidHeader`] for an illegal or reserved extra header
    /// - [`Error::TlsConfig`] if the CA bundle or validator cannot be built
    pub fn prepare(&self, config: &ConnectionConfig) -> Result<TransportRequest> {
        debug!(
            url = %config.url,
            protocols = %config.subprotocol,
            ca = ?config.ca_bundle_path,
            "Configuring connection"
        );

        let url = normalize_url(&config.url)?;
        let origin = origin_of(&url);

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|_| Error::invalid_url(&config.url))?;

        let headers = request.headers_mut();
        headers.append(ORIGIN, header_value("Origin", &origin)?);

        for (name, value) in &config.extra_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::invalid_header(format!("invalid header name: {name:?}")))?;
            if HANDSHAKE_HEADERS.contains(&header_name.as_str()) {
                return Err(Error::invalid_header(format!(
                    "header {name} is set by the WebSocket handshake"
                )));
            }
            headers.append(header_name, header_value(name, value)?);
        }

        if !config.subprotocol.is_empty() {
            headers.append(
                SEC_WEBSOCKET_PROTOCOL,
                header_value("Sec-WebSocket-Protocol", &config.subprotocol)?,
            );
        }

        let tls = if url.scheme() == "wss" {
            let validator = match config.ca_bundle_path.as_deref() {
                Some(path) => tls::load_validator(path, self.assets, self.trust)?,
                None => self.trust.build(None)?,
            };
            Some(validator.client_config())
        } else {
            if config.ca_bundle_path.is_some() {
                debug!("CA bundle ignored for plain ws:// connection");
            }
            None
        };

        if config.permessage_deflate {
            if self.transport.supports_compression() {
                headers.append(
                    SEC_WEBSOCKET_EXTENSIONS,
                    HeaderValue::from_static(PERMESSAGE_DEFLATE_OFFER),
                );
            } else {
                debug!("permessage-deflate requested but transport cannot inflate, not offered");
            }
        }

        Ok(TransportRequest {
            request,
            tls,
            tcp_no_delay: config.tcp_no_delay,
            timeout: config.timeout(),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a connection URL, mapping `http(s)` to `ws(s)`.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the URL does not parse, has no host,
/// or uses another scheme.
pub fn normalize_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).map_err(|_| Error::invalid_url(raw))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "ws",
        "wss" | "https" => "wss",
        _ => return Err(Error::invalid_url(raw)),
    };

    if url.scheme() != scheme {
        url.set_scheme(scheme).map_err(|()| Error::invalid_url(raw))?;
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::invalid_url(raw));
    }

    Ok(url)
}

/// Derives the `Origin` header for a normalized URL.
///
/// Only a port spelled out in the URL (and not the scheme default) is
/// included.
#[must_use]
pub fn origin_of(url: &Url) -> String {
    let scheme = if url.scheme() == "wss" { "https" } else { "http" };
    let host = url.host_str().unwrap_or_default();

    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| Error::invalid_header(format!("invalid value for header {name}")))
}

// ============================================================================
// Tests
// ============================================================================
