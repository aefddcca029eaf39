//! Core service façade and bootstrap helpers.
//!
//! Wires the image library into a host: [`LocalImagesExtension`] registers
//! the `"images"` library on top of whatever libraries are already known,
//! and [`CoreService`] opens it from a [`CoreConfig`]. Desktop hosts enable
//! the `desktop-shims` feature so the tokio file system is used by default.

pub mod error;

pub use error::{CoreError, Result};

use core_library::{LibraryError, LibraryHandle, LibraryRegistry};
use core_metadata::{ImageLibrary, TagScanner, IMAGE_LIBRARY_NAME};
use core_runtime::CoreConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Extension descriptor for the local images library.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalImagesExtension;

impl LocalImagesExtension {
    pub const DIST_NAME: &'static str = "Local-Images";
    pub const EXT_NAME: &'static str = "local-images";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Settings read from the extension's configuration section.
    pub const CONFIG_KEYS: &'static [&'static str] =
        &["library", "base_uri", "image_dir", "album_art_files"];

    /// Add the `"images"` library to `registry`.
    ///
    /// The libraries registered so far become the delegate candidates; later
    /// registrations are not visible to the image library.
    pub fn register(&self, registry: &mut LibraryRegistry, scanner: Option<Arc<dyn TagScanner>>) {
        let delegates = registry.clone();
        debug!(delegates = ?delegates.names(), "Registering image library");

        registry.register(IMAGE_LIBRARY_NAME, move |config: CoreConfig| {
            let delegates = delegates.clone();
            let scanner = scanner.clone();
            async move {
                let library = ImageLibrary::from_config(config, &delegates, scanner).await?;
                Ok::<_, LibraryError>(LibraryHandle::tagged(Arc::new(library)))
            }
        });
    }

    /// Create the image directory if needed and return it.
    pub async fn get_or_create_image_dir(config: &CoreConfig) -> Result<PathBuf> {
        let dir = config.image_dir();
        config.file_system()?.create_dir_all(&dir).await?;
        Ok(dir)
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: CoreConfig,
    registry: LibraryRegistry,
}

impl CoreService {
    /// Service with the built-in libraries plus the image library.
    pub fn new(config: CoreConfig) -> Self {
        let mut registry = LibraryRegistry::new();
        core_library::register_builtin(&mut registry);
        LocalImagesExtension.register(&mut registry, None);
        Self::with_registry(config, registry)
    }

    /// Service over a host-assembled registry.
    pub fn with_registry(config: CoreConfig, registry: LibraryRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &LibraryRegistry {
        &self.registry
    }

    /// Open the image library wrapping the configured delegate.
    pub async fn open_library(&self) -> Result<LibraryHandle> {
        let dir = LocalImagesExtension::get_or_create_image_dir(&self.config).await?;
        let handle = self
            .registry
            .create(IMAGE_LIBRARY_NAME, self.config.clone())
            .await?;
        info!(
            library = %self.config.library,
            image_dir = %dir.display(),
            "Local images library ready"
        );
        Ok(handle)
    }
}
