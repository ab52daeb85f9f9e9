//! TLS trust configuration.
//!
//! Turns a CA bundle path into a rustls client configuration:
//!
//! ```text
//! CaSource ──read──▶ bytes ──TrustAnchorSet::load──▶ anchors ──TrustManager::build──▶ Validator
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `source` | Bundle location (packaged asset or file) |
//! | `store` | PEM / DER parsing into trust anchors |
//! | `manager` | Validator and client configuration |

// ============================================================================
// Submodules
// ============================================================================

/// Validator construction.
pub mod manager;

/// CA bundle locations.
pub mod source;

/// CA bundle parsing.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use manager::{HostnameVerifier, TrustManager, TrustSource, Validator};
pub use source::{ASSET_PREFIX, AssetResolver, CaSource, DirectoryAssets};
pub use store::{CaFormat, TrustAnchorSet};

// ============================================================================
// Public Functions
// ============================================================================

/// Reads, parses and validates a CA bundle in one step.
///
/// # Errors
///
/// Returns [`Error::TlsConfig`](crate::Error::TlsConfig) if the bundle
/// cannot be read or parsed, or the validator cannot be built.
pub fn load_validator(
    path: &str,
    assets: &dyn AssetResolver,
    manager: &TrustManager,
) -> crate::Result<Validator> {
    let source = CaSource::from(path);
    let bytes = source.read(assets)?;
    let anchors = TrustAnchorSet::load(&bytes, CaFormat::from_path(path))?;

    tracing::debug!(path = %source, anchors = anchors.len(), "Loaded CA bundle");

    manager.build(Some(anchors))
}
