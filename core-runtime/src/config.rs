//! # Core Configuration Module
//!
//! Provides configuration management for the local-images core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! holding the local media settings, the image store settings and the bridge
//! implementations. `build()` validates eagerly so a misconfigured host fails
//! at startup instead of on the first indexed track.
//!
//! ## Settings
//!
//! | Setting | Default | Meaning |
//! |---------|---------|---------|
//! | `media_dir` | required | Root of the local media files |
//! | `data_dir` | required | Data root; images default to `data_dir/images` |
//! | `library` | `"memory"` | Name of the delegate library implementation |
//! | `base_uri` | `"/images/"` | Base joined with stored file names to form image URIs |
//! | `image_dir` | `data_dir/images` | Image store root |
//! | `album_art_files` | `*.jpg`, `*.jpeg`, `*.png` | Sidecar art glob patterns |
//! | `scan_timeout` | 1000 ms | Bound on the metadata scan |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .media_dir("/srv/music")
//!     .data_dir("/var/lib/local-images")
//!     .library("json")
//!     .album_art_files(["cover.jpg", "folder.png"])
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::FileSystemAccess;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default delegate library name.
pub const DEFAULT_LIBRARY: &str = "memory";

/// Default base URI for stored images.
pub const DEFAULT_BASE_URI: &str = "/images/";

/// Default sidecar art patterns, tried in order.
pub const DEFAULT_ALBUM_ART_FILES: &[&str] = &["*.jpg", "*.jpeg", "*.png"];

/// Default metadata scan timeout.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Name of the image store directory below `data_dir`.
pub const IMAGES_DIR_NAME: &str = "images";

/// Core configuration for the local-images core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Root directory of the local media library
    pub media_dir: PathBuf,

    /// Data directory; the default image store lives below it
    pub data_dir: PathBuf,

    /// Name of the delegate library implementation
    pub library: String,

    /// Base URI joined with stored file names
    pub base_uri: String,

    /// Explicit image store root (defaults to `data_dir/images`)
    pub image_dir: Option<PathBuf>,

    /// Ordered glob patterns for sidecar album art
    pub album_art_files: Vec<String>,

    /// Upper bound for a single metadata scan
    pub scan_timeout: Duration,

    /// File system access abstraction (optional with desktop default)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_dir", &self.media_dir)
            .field("data_dir", &self.data_dir)
            .field("library", &self.library)
            .field("base_uri", &self.base_uri)
            .field("image_dir", &self.image_dir)
            .field("album_art_files", &self.album_art_files)
            .field("scan_timeout", &self.scan_timeout)
            .field(
                "file_system",
                &self
                    .file_system
                    .as_ref()
                    .map(|_| "FileSystemAccess { ... }"),
            )
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Resolved image store root.
    pub fn image_dir(&self) -> PathBuf {
        self.image_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(IMAGES_DIR_NAME))
    }

    /// Returns the configured file system or the platform default.
    ///
    /// Without the `desktop-shims` feature a missing file system is a
    /// [`Error::CapabilityMissing`].
    pub fn file_system(&self) -> Result<Arc<dyn FileSystemAccess>> {
        match &self.file_system {
            Some(fs) => Ok(Arc::clone(fs)),
            None => provide_default_file_system(),
        }
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.media_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "Local media directory cannot be empty".to_string(),
            ));
        }

        if self.data_dir.as_os_str().is_empty() && self.image_dir.is_none() {
            return Err(Error::Config(
                "Either a data directory or an image directory is required".to_string(),
            ));
        }

        if self.library.trim().is_empty() {
            return Err(Error::InvalidSetting {
                field: "library".to_string(),
                message: "delegate library name cannot be empty".to_string(),
            });
        }

        if let Some(pattern) = self.album_art_files.iter().find(|p| p.trim().is_empty()) {
            return Err(Error::InvalidSetting {
                field: "album_art_files".to_string(),
                message: format!("empty glob pattern {:?}", pattern),
            });
        }

        if self.scan_timeout.is_zero() {
            return Err(Error::InvalidSetting {
                field: "scan_timeout".to_string(),
                message: "scan timeout must be greater than 0ms".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Ok(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required for the image store. \
                 Desktop: enable the 'desktop-shims' feature to use TokioFileSystem. \
                 Other hosts: inject a FileSystemAccess via CoreConfigBuilder::file_system."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    library: Option<String>,
    base_uri: Option<String>,
    image_dir: Option<PathBuf>,
    album_art_files: Option<Vec<String>>,
    scan_timeout: Option<Duration>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl CoreConfigBuilder {
    /// Sets the local media directory.
    pub fn media_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.media_dir = Some(path.into());
        self
    }

    /// Sets the data directory.
    pub fn data_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Sets the delegate library name.
    ///
    /// Default: `"memory"`
    pub fn library(mut self, name: impl Into<String>) -> Self {
        self.library = Some(name.into());
        self
    }

    /// Sets the base URI for image references.
    ///
    /// Default: `"/images/"`
    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Sets an explicit image store root instead of `data_dir/images`.
    pub fn image_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.image_dir = Some(path.into());
        self
    }

    /// Sets the ordered sidecar art glob patterns.
    pub fn album_art_files<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.album_art_files = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the metadata scan timeout.
    ///
    /// Default: 1000 ms
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = Some(timeout);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the media directory is missing, neither a data nor
    /// an image directory is given, or any setting fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let media_dir = self.media_dir.ok_or_else(|| {
            Error::Config(
                "Local media directory is required. Use .media_dir() to set it.".to_string(),
            )
        })?;

        let data_dir = match (self.data_dir, &self.image_dir) {
            (Some(dir), _) => dir,
            (None, Some(_)) => PathBuf::new(),
            (None, None) => {
                return Err(Error::Config(
                    "Data directory is required. Use .data_dir() or .image_dir() to set it."
                        .to_string(),
                ))
            }
        };

        let config = CoreConfig {
            media_dir,
            data_dir,
            library: self.library.unwrap_or_else(|| DEFAULT_LIBRARY.to_string()),
            base_uri: self.base_uri.unwrap_or_else(|| DEFAULT_BASE_URI.to_string()),
            image_dir: self.image_dir,
            album_art_files: self.album_art_files.unwrap_or_else(|| {
                DEFAULT_ALBUM_ART_FILES
                    .iter()
                    .map(|p| p.to_string())
                    .collect()
            }),
            scan_timeout: self.scan_timeout.unwrap_or(DEFAULT_SCAN_TIMEOUT),
            file_system: self.file_system,
        };

        config.validate()?;

        Ok(config)
    }
}
