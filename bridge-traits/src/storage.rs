//! Storage and File System Abstractions
//!
//! Provides the platform-agnostic file I/O trait the image store is built on.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Abstracts the file operations needed by the image store and the sidecar
/// art reader so hosts can supply sandboxed or virtual file systems.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn store(fs: &dyn FileSystemAccess, root: &Path, data: Bytes) -> Result<()> {
///     let created = fs.create_file_if_absent(&root.join("cover.png"), data).await?;
///     if !created {
///         // somebody else already wrote the same name
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Atomically publish `data` at `path` unless a file already exists there.
    ///
    /// Returns `Ok(true)` when this call created the file and `Ok(false)` when
    /// the path was already taken. Concurrent callers racing on the same path
    /// must never observe a partially written file and must never overwrite
    /// an existing one.
    async fn create_file_if_absent(&self, path: &Path, data: Bytes) -> Result<bool>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Remove an empty directory
    async fn remove_dir(&self, path: &Path) -> Result<()>;

    /// List all entries in a directory (non-recursive)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
