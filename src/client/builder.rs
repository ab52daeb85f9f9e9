//! Builder pattern for client configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use websocket_bridge::host::{HostListener, host_queue};
//! use websocket_bridge::{ClientOptions, ConnectionHandle, WebSocketClient};
//!
//! # fn example(listener: Arc<dyn HostListener>) -> websocket_bridge::Result<()> {
//! let (queue, _host_loop) = host_queue();
//!
//! let client = WebSocketClient::builder()
//!     .handle(1, 0x7f00_1000)
//!     .listener(listener)
//!     .executor(Arc::new(queue))
//!     .options(ClientOptions::new().with_tcp_no_delay())
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::host::{HostExecutor, HostListener};
use crate::identifiers::ConnectionHandle;
use crate::tls::{AssetResolver, DirectoryAssets, TrustManager};
use crate::transport::{Transport, TungsteniteTransport};

use super::core::{ClientParts, WebSocketClient};
use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for a [`WebSocketClient`].
///
/// Use [`WebSocketClient::builder()`] to create one.
#[derive(Default)]
pub struct ClientBuilder {
    /// Raw host identifier and callback token.
    handle: Option<(u64, u64)>,
    /// Host notification target.
    listener: Option<Arc<dyn HostListener>>,
    /// Host serial context.
    executor: Option<Arc<dyn HostExecutor>>,
    /// Constructor-time options.
    options: ClientOptions,
    /// Transport override.
    transport: Option<Arc<dyn Transport>>,
    /// Packaged asset resolver override.
    assets: Option<Arc<dyn AssetResolver>>,
    /// Crypto provider override.
    trust: Option<TrustManager>,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host identifier and callback token.
    ///
    /// Both must be non-zero; this is checked by [`build`](Self::build).
    #[inline]
    #[must_use]
    pub fn handle(mut self, identifier: u64, callback_token: u64) -> Self {
        self.handle = Some((identifier, callback_token));
        self
    }

    /// Sets the handle from its typed form.
    #[inline]
    #[must_use]
    pub fn connection_handle(self, handle: ConnectionHandle) -> Self {
        let (identifier, callback_token) = handle.to_raw();
        self.handle(identifier, callback_token)
    }

    /// Sets the host notification target.
    #[inline]
    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn HostListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the host serial context.
    #[inline]
    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn HostExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets constructor-time options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the default tokio-tungstenite transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resolves `assets/...` CA paths under `root`.
    #[inline]
    #[must_use]
    pub fn asset_root(self, root: impl Into<PathBuf>) -> Self {
        self.asset_resolver(Arc::new(DirectoryAssets::new(root)))
    }

    /// Sets a custom packaged-asset resolver.
    #[inline]
    #[must_use]
    pub fn asset_resolver(mut self, assets: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Sets the trust manager (and so the crypto provider).
    #[inline]
    #[must_use]
    pub fn trust_manager(mut self, trust: TrustManager) -> Self {
        self.trust = Some(trust);
        self
    }

    /// Builds the client with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the handle, listener or executor is missing,
    ///   or the handle is zero
    /// - [`Error::InvalidHeader`] if an extra header is not legal HTTP
    pub fn build(self) -> Result<WebSocketClient> {
        let handle = self.validate_handle()?;
        let listener = self.validate_listener()?;
        let executor = self.validate_executor()?;
        self.options.validate()?;

        Ok(WebSocketClient::new(ClientParts {
            handle,
            listener,
            executor,
            options: self.options,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(TungsteniteTransport::new())),
            assets: self
                .assets
                .unwrap_or_else(|| Arc::new(DirectoryAssets::default())),
            trust: self.trust.unwrap_or_default(),
        }))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ClientBuilder {
    fn validate_handle(&self) -> Result<ConnectionHandle> {
        let (identifier, callback_token) = self.handle.ok_or_else(|| {
            Error::config(
                "Connection handle is required. Use .handle(identifier, callback_token) to set it.",
            )
        })?;

        ConnectionHandle::from_raw(identifier, callback_token).ok_or_else(|| {
            Error::config(format!(
                "Connection handle must be non-zero, got ({identifier}, {callback_token:#x})"
            ))
        })
    }

    fn validate_listener(&self) -> Result<Arc<dyn HostListener>> {
        self.listener.clone().ok_or_else(|| {
            Error::config("Host listener is required. Use .listener() to set it.")
        })
    }

    fn validate_executor(&self) -> Result<Arc<dyn HostExecutor>> {
        self.executor.clone().ok_or_else(|| {
            Error::config(
                "Host executor is required. Use .executor() to set it.\n\
                 Example: let (queue, host_loop) = host_queue(); builder.executor(Arc::new(queue))",
            )
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("handle", &self.handle)
            .field("listener", &self.listener.is_some())
            .field("executor", &self.executor.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
