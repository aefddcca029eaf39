//! # Host Bridge Traits
//!
//! Capability traits the local-images core consumes from its host.
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - File I/O for the image
//!   store, including atomic create-if-absent writes
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! keep the underlying `std::io::Error` so callers can tell a missing file
//! apart from a failed write:
//!
//! ```ignore
//! match fs.delete_file(&path).await {
//!     Err(err) if err.is_not_found() => { /* already gone */ }
//!     other => other?,
//! }
//! ```
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared across concurrent extraction tasks.

pub mod error;
pub mod storage;
pub mod log;

pub use error::BridgeError;

pub use storage::{FileMetadata, FileSystemAccess};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
