//! CA bundle parsing.
//!
//! Turns raw bundle bytes into a [`TrustAnchorSet`]. Parsing is pure: it
//! neither logs nor notifies, errors go back to the caller.
//!
//! # Formats
//!
//! | Format | Input | Accepted when |
//! |--------|-------|---------------|
//! | [`CaFormat::Pem`] | one or more `CERTIFICATE` blocks | at least one block, every block decodes |
//! | [`CaFormat::SingleCertificate`] | one DER certificate | the DER decodes |

// ============================================================================
// Imports
// ============================================================================

use std::path::Path;

use rustls::RootCertStore;
use rustls::pki_types::CertificateDer;

use crate::error::{Error, Result};

// ============================================================================
// CaFormat
// ============================================================================

/// Encoding of a CA bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaFormat {
    /// PEM text with one or more certificate blocks.
    Pem,

    /// One binary (DER) certificate.
    SingleCertificate,
}

impl CaFormat {
    /// Derives the format from a bundle path.
    ///
    /// A `.pem` suffix (any case) selects [`CaFormat::Pem`]; anything else
    /// is treated as a single certificate.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let is_pem = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pem"));

        if is_pem {
            Self::Pem
        } else {
            Self::SingleCertificate
        }
    }
}

// ============================================================================
// TrustAnchorSet
// ============================================================================

/// Certificates accepted as roots for one connection.
#[derive(Debug, Clone)]
pub struct TrustAnchorSet {
    roots: RootCertStore,
}

impl TrustAnchorSet {
    /// Parses bundle bytes in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TlsConfig`] if the bundle holds no certificate or
    /// any certificate fails to decode.
    pub fn load(bytes: &[u8], format: CaFormat) -> Result<Self> {
        let certs = match format {
            CaFormat::Pem => parse_pem(bytes)?,
            CaFormat::SingleCertificate => vec![CertificateDer::from(bytes.to_vec())],
        };

        let mut roots = RootCertStore::empty();
        for (index, cert) in certs.into_iter().enumerate() {
            roots.add(cert).map_err(|e| {
                Error::tls_config(format!("certificate {index} in CA bundle is invalid: {e}"))
            })?;
        }

        Ok(Self { roots })
    }

    /// Returns the number of anchors.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Returns `true` if the set holds no anchors.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Returns the underlying root store.
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &RootCertStore {
        &self.roots
    }

    /// Consumes the set, returning the root store.
    #[inline]
    #[must_use]
    pub fn into_roots(self) -> RootCertStore {
        self.roots
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_pem(bytes: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = bytes;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::tls_config(format!("malformed PEM in CA bundle: {e}")))?;

    if certs.is_empty() {
        return Err(Error::tls_config("no certificates found in CA bundle"));
    }

    Ok(certs)
}

// ============================================================================
// Tests
// ============================================================================
