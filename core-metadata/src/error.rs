use bridge_traits::error::BridgeError;
use core_library::error::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Unknown image format")]
    UnknownFormat,

    #[error("Failed to scan {path}: {message}")]
    ScanFailed { path: String, message: String },

    #[error("Scanning {path} timed out after {timeout_ms}ms")]
    ScanTimeout { path: String, timeout_ms: u64 },

    #[error("Failed to write image {name}: {source}")]
    StoreWrite {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Image not found: {0}")]
    NotFound(String),

    #[error("Failed to delete image {name}: {source}")]
    DeleteFailed {
        name: String,
        #[source]
        source: BridgeError,
    },

    #[error("Invalid image name: {0}")]
    InvalidName(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),
}

impl MetadataError {
    /// Whether the error only affects a single image, scan or file.
    ///
    /// Recoverable errors are logged and skipped; the rest are surfaced.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MetadataError::UnknownFormat
                | MetadataError::ScanFailed { .. }
                | MetadataError::ScanTimeout { .. }
                | MetadataError::StoreWrite { .. }
                | MetadataError::NotFound(_)
                | MetadataError::DeleteFailed { .. }
                | MetadataError::InvalidName(_)
                | MetadataError::Bridge(_)
        )
    }
}

impl From<MetadataError> for LibraryError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Library(inner) => inner,
            MetadataError::Config(inner) => LibraryError::Config(inner),
            MetadataError::Bridge(inner) => LibraryError::Bridge(inner),
            other => LibraryError::Backend(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
