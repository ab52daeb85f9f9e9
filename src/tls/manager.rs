//! Certificate validation for `wss://` connections.
//!
//! [`TrustManager`] turns an optional [`TrustAnchorSet`] into a
//! [`Validator`]: a ready-to-use rustls client configuration.
//!
//! # Trust Sources
//!
//! | Anchors | Roots used |
//! |---------|------------|
//! | `Some(set)` | only the supplied anchors |
//! | `None` | platform store, or the bundled Mozilla roots if the platform has none |
//!
//! The platform store is read once per process and shared by every later
//! validator.
//!
//! Only TLS 1.3 and TLS 1.2 are offered. Hostname checks run inside the
//! standard WebPKI verifier; [`HostnameVerifier`] wraps it to log the
//! name being checked and forwards every decision unchanged.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, OnceLock};

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, DistinguishedName, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::store::TrustAnchorSet;

// ============================================================================
// Constants
// ============================================================================

/// Protocol versions offered, newest first.
static PROTOCOL_VERSIONS: &[&rustls::SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// Platform roots, loaded on first use.
static PLATFORM_ROOTS: OnceLock<(Arc<RootCertStore>, TrustSource)> = OnceLock::new();

// ============================================================================
// TrustSource
// ============================================================================

/// Roots behind a [`Validator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustSource {
    /// Anchors loaded from a CA bundle.
    Custom {
        /// Number of anchors.
        anchors: usize,
    },

    /// Roots from the operating system store.
    Platform {
        /// Number of roots.
        anchors: usize,
    },

    /// Bundled Mozilla roots, used when the platform store is empty.
    Bundled {
        /// Number of roots.
        anchors: usize,
    },
}

// ============================================================================
// Validator
// ============================================================================

/// Certificate validator plus the TLS client configuration built on it.
#[derive(Clone)]
pub struct Validator {
    config: Arc<ClientConfig>,
    verifier: Arc<HostnameVerifier>,
    source: TrustSource,
}

impl Validator {
    /// Returns the TLS client configuration for the transport.
    #[inline]
    #[must_use]
    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }

    /// Returns the certificate verifier installed in the configuration.
    #[inline]
    #[must_use]
    pub fn verifier(&self) -> Arc<dyn ServerCertVerifier> {
        self.verifier.clone()
    }

    /// Returns where the roots came from.
    #[inline]
    #[must_use]
    pub fn source(&self) -> TrustSource {
        self.source
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// TrustManager
// ============================================================================

/// Builds [`Validator`]s on one crypto provider.
#[derive(Debug, Clone)]
pub struct TrustManager {
    provider: Arc<CryptoProvider>,
}

impl TrustManager {
    /// Creates a manager on the process-default crypto provider, falling
    /// back to `ring` when none is installed.
    #[must_use]
    pub fn new() -> Self {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));

        Self { provider }
    }

    /// Creates a manager on a specific crypto provider.
    #[inline]
    #[must_use]
    pub fn with_provider(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Builds a validator.
    ///
    /// With anchors, a chain is accepted only if it leads to one of them.
    /// Without, the platform default roots are used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TlsConfig`] if the provider cannot build a
    /// verifier or a client configuration for the pinned versions.
    pub fn build(&self, anchors: Option<TrustAnchorSet>) -> Result<Validator> {
        let (roots, source) = match anchors {
            Some(set) => {
                let anchors = set.len();
                (Arc::new(set.into_roots()), TrustSource::Custom { anchors })
            }
            None => platform_roots(),
        };

        let inner =
            WebPkiServerVerifier::builder_with_provider(roots, Arc::clone(&self.provider))
                .build()
                .map_err(|e| Error::tls_config(format!("cannot build certificate verifier: {e}")))?;

        let verifier = Arc::new(HostnameVerifier { inner });

        let config = ClientConfig::builder_with_provider(Arc::clone(&self.provider))
            .with_protocol_versions(PROTOCOL_VERSIONS)
            .map_err(|e| Error::tls_config(format!("cannot build TLS context: {e}")))?
            .dangerous()
            .with_custom_certificate_verifier(verifier.clone())
            .with_no_client_auth();

        debug!(?source, "Built certificate validator");

        Ok(Validator {
            config: Arc::new(config),
            verifier,
            source,
        })
    }
}

impl Default for TrustManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the shared platform roots, reading the store on first call.
fn platform_roots() -> (Arc<RootCertStore>, TrustSource) {
    let (roots, source) = PLATFORM_ROOTS.get_or_init(load_platform_roots);
    (Arc::clone(roots), *source)
}

fn load_platform_roots() -> (Arc<RootCertStore>, TrustSource) {
    let mut roots = RootCertStore::empty();

    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!(error = %err, "Skipping unreadable platform certificate");
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    if ignored > 0 {
        debug!(ignored, "Ignored unparsable platform certificates");
    }

    if added > 0 {
        return (Arc::new(roots), TrustSource::Platform { anchors: added });
    }

    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let anchors = roots.len();
    debug!(anchors, "Platform store empty, using bundled roots");

    (Arc::new(roots), TrustSource::Bundled { anchors })
}

// ============================================================================
// HostnameVerifier
// ============================================================================

/// Forwards to the WebPKI verifier, logging the host name it checks.
#[derive(Debug)]
pub struct HostnameVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for HostnameVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        debug!(host = ?server_name, "Verifying server certificate");
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }

    fn root_hint_subjects(&self) -> Option<&[DistinguishedName]> {
        self.inner.root_hint_subjects()
    }
}

// ============================================================================
// Tests
// ============================================================================
