//! CA bundle locations.
//!
//! A CA bundle path is either a packaged asset or a plain filesystem path:
//!
//! | Prefix | Source | Read by |
//! |--------|--------|---------|
//! | `assets/` | [`CaSource::Asset`] | the client's [`AssetResolver`] |
//! | anything else | [`CaSource::File`] | `std::fs` |
//!
//! # Example
//!
//! ```
//! use websocket_bridge::tls::CaSource;
//!
//! assert!(CaSource::from("assets/certs/ca.pem").is_asset());
//! assert!(CaSource::from("/etc/ssl/ca.pem").is_file());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Path prefix that selects the packaged-asset resolver.
pub const ASSET_PREFIX: &str = "assets/";

// ============================================================================
// CaSource
// ============================================================================

/// Where a CA bundle is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaSource {
    /// Packaged asset, named by its full `assets/...` path.
    Asset(String),

    /// Filesystem path.
    File(PathBuf),
}

impl CaSource {
    /// Returns the path as given by the host.
    #[must_use]
    pub fn display_path(&self) -> String {
        match self {
            Self::Asset(name) => name.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Returns `true` if this is a packaged asset.
    #[inline]
    #[must_use]
    pub fn is_asset(&self) -> bool {
        matches!(self, Self::Asset(_))
    }

    /// Returns `true` if this is a filesystem path.
    #[inline]
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Reads the bundle bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TlsConfig`] naming the path if it cannot be read.
    pub fn read(&self, assets: &dyn AssetResolver) -> Result<Vec<u8>> {
        let result = match self {
            Self::Asset(name) => assets.read_asset(name),
            Self::File(path) => fs::read(path).map_err(Error::from),
        };

        result.map_err(|e| {
            Error::tls_config(format!(
                "cannot read CA bundle {}: {}",
                self.display_path(),
                e.notification_message()
            ))
        })
    }
}

impl From<&str> for CaSource {
    fn from(path: &str) -> Self {
        if path.starts_with(ASSET_PREFIX) {
            Self::Asset(path.to_string())
        } else {
            Self::File(PathBuf::from(path))
        }
    }
}

impl From<String> for CaSource {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl fmt::Display for CaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_path())
    }
}

// ============================================================================
// AssetResolver
// ============================================================================

/// Resolves packaged asset names to bytes.
pub trait AssetResolver: Send + Sync {
    /// Reads the asset named `name` (including its `assets/` prefix).
    ///
    /// # Errors
    ///
    /// Returns an error if the asset does not exist or cannot be read.
    fn read_asset(&self, name: &str) -> Result<Vec<u8>>;
}

/// Asset resolver backed by a directory on disk.
///
/// `assets/certs/ca.pem` resolves to `<root>/assets/certs/ca.pem`.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Creates a resolver rooted at `root`.
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the package root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for DirectoryAssets {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AssetResolver for DirectoryAssets {
    fn read_asset(&self, name: &str) -> Result<Vec<u8>> {
        let relative = Path::new(name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(Error::config(format!("asset path escapes package: {name}")));
        }

        Ok(fs::read(self.root.join(relative))?)
    }
}

// ============================================================================
// Tests
// ============================================================================
