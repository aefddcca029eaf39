//! # Content-Addressed Image Store
//!
//! Stores raw image payloads as flat files named `hex(md5(bytes)).<format>`
//! under a single root directory and hands out reference URIs built from a
//! configured base URI.
//!
//! ## Naming
//!
//! The format is sniffed from the payload's magic bytes. A caller-supplied
//! hint is never trusted. Identical bytes therefore always map to the same
//! name, and an existing name is never rewritten.
//!
//! ## Concurrency
//!
//! `put` relies on [`FileSystemAccess::create_file_if_absent`], so concurrent
//! puts of the same payload publish exactly one file and all of them return
//! the same reference.

use crate::error::{MetadataError, Result};
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_runtime::CoreConfig;
use futures::future::BoxFuture;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// An image written to (or already present in) the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Reference URI (`join(base_uri, name)`)
    pub uri: String,
    /// Content-addressed file name
    pub name: String,
    /// Sniffed format extension
    pub extension: &'static str,
    /// Payload length in bytes
    pub size: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// `false` when the file already existed
    pub created: bool,
}

/// A file found in the store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub name: String,
    pub path: PathBuf,
}

/// Join a file name onto a base URI.
///
/// Absolute URLs use RFC 3986 reference resolution. Anything else (such as
/// the default `/images/`) keeps the base up to its last `/` and appends the
/// name.
pub fn join_uri(base: &str, name: &str) -> String {
    if base.is_empty() {
        return name.to_string();
    }

    if let Ok(url) = Url::parse(base) {
        if let Ok(joined) = url.join(name) {
            return joined.to_string();
        }
    }

    match base.rfind('/') {
        Some(idx) => format!("{}{}", &base[..=idx], name),
        None => name.to_string(),
    }
}

/// File extension for the sniffed format of `data`.
///
/// # Errors
///
/// [`MetadataError::UnknownFormat`] unless the payload is a JPEG, PNG, GIF,
/// BMP, TIFF or WebP image.
pub fn sniff_extension(data: &[u8]) -> Result<&'static str> {
    let format = image::guess_format(data).map_err(|_| MetadataError::UnknownFormat)?;
    match format {
        ImageFormat::Jpeg => Ok("jpeg"),
        ImageFormat::Png => Ok("png"),
        ImageFormat::Gif => Ok("gif"),
        ImageFormat::Bmp => Ok("bmp"),
        ImageFormat::Tiff => Ok("tiff"),
        ImageFormat::WebP => Ok("webp"),
        _ => Err(MetadataError::UnknownFormat),
    }
}

/// Content-addressed name for `data` in the sniffed `extension`.
fn content_name(data: &[u8], extension: &str) -> String {
    format!("{:x}.{}", md5::compute(data), extension)
}

/// Width and height from the image header, if decodable.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

fn same_format(hint: &str, extension: &str) -> bool {
    let hint = hint.trim_start_matches('.').to_ascii_lowercase();
    let hint = match hint.as_str() {
        "jpg" | "jpe" => "jpeg",
        "tif" => "tiff",
        other => other,
    };
    hint == extension
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(MetadataError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub struct ImageStore {
    fs: Arc<dyn FileSystemAccess>,
    root: PathBuf,
    base_uri: String,
}

impl ImageStore {
    pub fn new(fs: Arc<dyn FileSystemAccess>, root: impl Into<PathBuf>, base_uri: impl Into<String>) -> Self {
        Self {
            fs,
            root: root.into(),
            base_uri: base_uri.into(),
        }
    }

    /// Store rooted at `config.image_dir()` using the configured file system.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        Ok(Self::new(
            config.file_system()?,
            config.image_dir(),
            config.base_uri.clone(),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Create the store root if missing.
    pub async fn init(&self) -> Result<()> {
        self.fs.create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn uri_for(&self, name: &str) -> String {
        join_uri(&self.base_uri, name)
    }

    /// Inverse of [`uri_for`](Self::uri_for) for URIs pointing into this store.
    pub fn name_for_uri(&self, uri: &str) -> Option<String> {
        let name = uri.rsplit('/').next()?;
        if validate_name(name).is_err() || self.uri_for(name) != uri {
            return None;
        }
        Some(name.to_string())
    }

    /// Store `data` under its content-addressed name.
    ///
    /// `hint` is only compared against the sniffed format for diagnostics.
    pub async fn put(&self, data: Bytes, hint: Option<&str>) -> Result<StoredImage> {
        let extension = sniff_extension(&data)?;
        if let Some(hint) = hint.filter(|h| !same_format(h, extension)) {
            debug!(hint, sniffed = extension, "Ignoring mismatched image format hint");
        }

        let name = content_name(&data, extension);
        let dimensions = image_dimensions(&data);
        let size = data.len();
        let path = self.root.join(&name);

        let created = self
            .fs
            .create_file_if_absent(&path, data)
            .await
            .map_err(|source| MetadataError::StoreWrite {
                name: name.clone(),
                source,
            })?;

        if created {
            debug!(name = %name, size, "Stored image");
        } else {
            debug!(name = %name, "Image already stored");
        }

        Ok(StoredImage {
            uri: self.uri_for(&name),
            name,
            extension,
            size,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            created,
        })
    }

    /// Files currently in the store root.
    ///
    /// Directories and dot-files (in-flight temporary writes) are skipped.
    /// An entry that cannot be stat'ed is listed; it only fails on its own
    /// later operation.
    pub async fn list(&self) -> Result<Vec<StoredEntry>> {
        if !self.fs.exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for path in self.fs.list_directory(&self.root).await? {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                warn!(path = %path.display(), "Skipping non UTF-8 file name");
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            match self.fs.metadata(&path).await {
                Ok(meta) if meta.is_directory => continue,
                Ok(_) => {}
                // Dangling links and unreadable entries are still sweep candidates
                Err(err) => warn!(path = %path.display(), error = %err, "Cannot stat store entry"),
            }
            entries.push(StoredEntry {
                name: name.to_string(),
                path,
            });
        }
        Ok(entries)
    }

    /// Remove the file called `name`.
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.fs
            .delete_file(&self.root.join(name))
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    MetadataError::NotFound(name.to_string())
                } else {
                    MetadataError::DeleteFailed {
                        name: name.to_string(),
                        source,
                    }
                }
            })
    }

    /// Header dimensions of the stored file `name`.
    pub async fn dimensions(&self, name: &str) -> Result<Option<(u32, u32)>> {
        validate_name(name)?;
        let data = self
            .fs
            .read_file(&self.root.join(name))
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    MetadataError::NotFound(name.to_string())
                } else {
                    MetadataError::Bridge(source)
                }
            })?;
        Ok(image_dimensions(&data))
    }

    /// Remove every file and subdirectory below the root, best-effort.
    ///
    /// Returns the number of removed entries.
    pub async fn clear(&self) -> usize {
        match self.fs.exists(&self.root).await {
            Ok(true) => self.clear_dir(&self.root).await,
            Ok(false) => 0,
            Err(err) => {
                warn!(error = %err, "Cannot access image directory");
                0
            }
        }
    }

    fn clear_dir<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, usize> {
        Box::pin(async move {
            let paths = match self.fs.list_directory(dir).await {
                Ok(paths) => paths,
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "Cannot list directory");
                    return 0;
                }
            };

            let mut removed = 0;
            for path in paths {
                let is_dir = match self.fs.metadata(&path).await {
                    Ok(meta) => meta.is_directory,
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "Cannot stat entry");
                        continue;
                    }
                };

                let result = if is_dir {
                    removed += self.clear_dir(&path).await;
                    self.fs.remove_dir(&path).await
                } else {
                    self.fs.delete_file(&path).await
                };

                match result {
                    Ok(()) => {
                        debug!(path = %path.display(), "Removed");
                        removed += 1;
                    }
                    Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove"),
                }
            }
            removed
        })
    }
}

impl std::fmt::Debug for ImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageStore")
            .field("root", &self.root)
            .field("base_uri", &self.base_uri)
            .finish()
    }
}
