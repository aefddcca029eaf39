//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bridge_desktop::TokioFileSystem;
use bridge_traits::FileSystemAccess;
use bytes::Bytes;
use core_library::{Album, TagValue, Tags, Track};
use core_metadata::error::{MetadataError, Result};
use core_metadata::scanner::{ScanResult, TagScanner, IMAGE_TAG};
use core_metadata::{ImageExtractor, ImageStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const GIF_B64: &str = "R0lGODlhAQABAIAAAAUEBAAAACwAAAAAAQABAAACAkQBADs=";

pub const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAAAAAA6fptVAAAACklEQVQYV2P4DwABAQEAWk1v8QAAAABJRU5ErkJggg==";

pub const JPEG_B64: &str = concat!(
    "/9j/4AAQSkZJRgABAQEAYABgAAD/4QAWRXhpZgAASUkqAAgAAAAAAAAAAAD/2wBDAAEBAQEBAQEB",
    "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQH/",
    "2wBDAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEB",
    "AQEBAQEBAQEBAQH/wAARCAABAAEDASIAAhEBAxEB/8QAFQABAQAAAAAAAAAAAAAAAAAAAAr/xAAU",
    "EAEAAAAAAAAAAAAAAAAAAAAA/8QAFAEBAAAAAAAAAAAAAAAAAAAAAP/EABQRAQAAAAAAAAAAAAAA",
    "AAAAAAD/2gAMAwEAAhEDEQA/AL+AAf/Z",
);

/// md5 of the decoded GIF fixture.
pub const GIF_MD5: &str = "df16d33739defe9bda1f4c45d36fd7a7";

pub fn gif() -> Bytes {
    Bytes::from(STANDARD.decode(GIF_B64).unwrap())
}

pub fn png() -> Bytes {
    Bytes::from(STANDARD.decode(PNG_B64).unwrap())
}

pub fn jpeg() -> Bytes {
    Bytes::from(STANDARD.decode(JPEG_B64).unwrap())
}

pub fn md5_name(data: &[u8], extension: &str) -> String {
    format!("{:x}.{}", md5::compute(data), extension)
}

pub fn image_tags(payloads: Vec<Bytes>) -> Tags {
    Tags::from([(
        IMAGE_TAG.to_string(),
        payloads.into_iter().map(TagValue::Binary).collect(),
    )])
}

pub fn album_track(uri: &str, album: &str) -> Track {
    Track::new(uri).with_name("Track").with_album(Album::named(album))
}

/// Temporary media and image directories.
pub struct Dirs {
    pub media: TempDir,
    pub images: TempDir,
}

impl Dirs {
    pub fn new() -> Self {
        Self {
            media: tempfile::tempdir().unwrap(),
            images: tempfile::tempdir().unwrap(),
        }
    }

    pub fn fs(&self) -> Arc<dyn FileSystemAccess> {
        Arc::new(TokioFileSystem::new())
    }

    pub fn store(&self) -> Arc<ImageStore> {
        Arc::new(ImageStore::new(self.fs(), self.images.path(), "/images/"))
    }

    pub fn extractor(&self, store: &Arc<ImageStore>, patterns: &[&str]) -> ImageExtractor {
        ImageExtractor::new(
            Arc::clone(store),
            self.fs(),
            patterns.iter().map(|p| p.to_string()).collect(),
        )
    }

    /// Create an (empty) media file and return its path.
    pub fn media_file(&self, relative: &str) -> PathBuf {
        let path = self.media.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"").unwrap();
        path
    }

    pub fn stored_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.images.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Scanner returning canned results keyed by file name.
#[derive(Default)]
pub struct FakeScanner {
    results: Mutex<Vec<(String, Option<ScanResult>)>>,
    pub calls: AtomicUsize,
}

impl FakeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(self, file_name: &str, tags: Tags) -> Self {
        self.results.lock().unwrap().push((
            file_name.to_string(),
            Some(ScanResult {
                tags,
                duration: Some(1000),
            }),
        ));
        self
    }

    pub fn failing(self, file_name: &str) -> Self {
        self.results
            .lock()
            .unwrap()
            .push((file_name.to_string(), None));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TagScanner for FakeScanner {
    async fn scan(&self, path: &Path) -> Result<ScanResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        let results = self.results.lock().unwrap();
        match results.iter().rev().find(|(name, _)| *name == file_name) {
            Some((_, Some(result))) => Ok(result.clone()),
            Some((_, None)) => Err(MetadataError::ScanTimeout {
                path: file_name,
                timeout_ms: 1,
            }),
            None => Ok(ScanResult::default()),
        }
    }
}
