//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `FileSystemAccess` using `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use std::sync::Arc;
//!
//! let fs = Arc::new(TokioFileSystem::new());
//! let config = CoreConfig::builder()
//!     .media_dir("/srv/music")
//!     .data_dir("/var/lib/local-images")
//!     .file_system(fs)
//!     .build()?;
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
