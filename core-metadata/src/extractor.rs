//! # Image Extraction
//!
//! Builds the set of image references for one track from its scanned tags
//! and from sidecar art files next to the media file.
//!
//! ## Sources
//!
//! 1. Embedded payloads under the `image` tag, or under `preview-image` when
//!    `image` carries nothing.
//! 2. Files in the track's directory matching the configured glob patterns
//!    (e.g. `cover.jpg`, `*.png`), in pattern order.
//!
//! Every payload goes through the [`ImageStore`], so identical bytes from
//! different sources collapse to one reference.
//!
//! ## Failure isolation
//!
//! A payload that is not an image, or a sidecar that cannot be read or
//! written, is logged and skipped. Extraction itself never fails; an empty
//! set means no art was found.

use crate::error::{MetadataError, Result};
use crate::image_store::ImageStore;
use crate::scanner::{IMAGE_TAG, PREVIEW_IMAGE_TAG};
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_async::task;
use core_library::models::{TagValue, Tags};
use globwalk::GlobWalkerBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ImageExtractor {
    store: Arc<ImageStore>,
    fs: Arc<dyn FileSystemAccess>,
    patterns: Vec<String>,
}

impl ImageExtractor {
    pub fn new(store: Arc<ImageStore>, fs: Arc<dyn FileSystemAccess>, patterns: Vec<String>) -> Self {
        Self {
            store,
            fs,
            patterns,
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Image references for the track stored at `path`.
    pub async fn extract(&self, path: &Path, tags: &Tags) -> BTreeSet<String> {
        let mut images = BTreeSet::new();

        for value in embedded_payloads(tags) {
            let TagValue::Binary(data) = value else {
                warn!(value = %value, "Skipping non-binary image tag");
                continue;
            };
            match self.store.put(data.clone(), None).await {
                Ok(stored) => {
                    images.insert(stored.uri);
                }
                Err(err) => warn!(track = %path.display(), error = %err, "Skipping embedded image"),
            }
        }

        if let Some(dir) = path.parent() {
            for pattern in &self.patterns {
                for file in self.find_sidecars(dir, pattern).await {
                    match self.store_sidecar(&file).await {
                        Ok(uri) => {
                            images.insert(uri);
                        }
                        Err(err) => {
                            warn!(file = %file.display(), error = %err, "Skipping album art file")
                        }
                    }
                }
            }
        }

        debug!(track = %path.display(), count = images.len(), "Extracted images");
        images
    }

    async fn store_sidecar(&self, file: &Path) -> Result<String> {
        let data: Bytes = self.fs.read_file(file).await?;
        let hint = file.extension().and_then(|ext| ext.to_str());
        Ok(self.store.put(data, hint).await?.uri)
    }

    async fn find_sidecars(&self, dir: &Path, pattern: &str) -> Vec<PathBuf> {
        let dir = dir.to_path_buf();
        let owned = pattern.to_string();
        match task::spawn_blocking(move || glob_files(&dir, &owned)).await {
            Ok(Ok(files)) => files,
            Ok(Err(err)) => {
                warn!(pattern, error = %err, "Invalid album art pattern");
                Vec::new()
            }
            Err(err) => {
                warn!(pattern, error = %err, "Album art lookup failed");
                Vec::new()
            }
        }
    }
}

/// Embedded payloads, preferring `image` over `preview-image`.
fn embedded_payloads(tags: &Tags) -> &[TagValue] {
    let non_empty = |key: &str| tags.get(key).filter(|values| !values.is_empty());
    non_empty(IMAGE_TAG)
        .or_else(|| non_empty(PREVIEW_IMAGE_TAG))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Files below `dir` matching `pattern`, sorted.
///
/// The walk depth follows the number of path segments in the pattern, so
/// `cover.jpg` only looks in `dir` itself while `scans/*.png` looks one
/// level down.
fn glob_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let depth = pattern.split('/').filter(|s| !s.is_empty()).count().max(1);
    let walker = GlobWalkerBuilder::from_patterns(dir, &[pattern])
        .max_depth(depth)
        .build()
        .map_err(|e| MetadataError::InvalidName(format!("{}: {}", pattern, e)))?;

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}
