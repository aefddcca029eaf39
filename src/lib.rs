//! Album art for local music libraries.
//!
//! `local-images` wraps a local track library so that every indexed track
//! carries references to its album art. Embedded pictures and sidecar files
//! such as `cover.jpg` are stored once, under content-addressed names, and
//! files no track references any more are removed when the library closes.
//!
//! ```ignore
//! use local_images::{CoreConfig, CoreService};
//!
//! let config = CoreConfig::builder()
//!     .media_dir("/srv/music")
//!     .data_dir("/var/lib/local-images")
//!     .build()?;
//!
//! let library = CoreService::new(config).open_library().await?;
//! library.add(track, None, None).await?;
//! library.close().await?;
//! ```

pub use core_library::{
    Album, Artist, Image, InMemoryLibrary, LibraryError, LibraryHandle, LibraryRegistry,
    LocalLibrary, SearchRequest, TaggedLibrary, Track,
};
pub use core_metadata::{
    ImageExtractor, ImageLibrary, ImageStore, LoftyTagScanner, MetadataError, ReconcileReport,
    TagScanner,
};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::{CoreConfig, CoreConfigBuilder};
pub use core_service::{CoreError, CoreService, LocalImagesExtension};
