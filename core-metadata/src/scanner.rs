//! Metadata scanner adapter.
//!
//! Turns an audio file into the raw tag mapping consumed by the extractor.
//! Embedded pictures land under `image`, icons under `preview-image`.

use crate::error::{MetadataError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use core_async::{task, time};
use core_library::models::{TagValue, Tags};
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Tag key for full-size embedded images.
pub const IMAGE_TAG: &str = "image";

/// Tag key for low-resolution embedded images.
pub const PREVIEW_IMAGE_TAG: &str = "preview-image";

/// Output of a single scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanResult {
    pub tags: Tags,
    /// Duration in milliseconds
    pub duration: Option<u64>,
}

#[async_trait]
pub trait TagScanner: Send + Sync {
    async fn scan(&self, path: &Path) -> Result<ScanResult>;
}

/// [`TagScanner`] backed by `lofty`, bounded by a timeout.
pub struct LoftyTagScanner {
    timeout: Duration,
    parse_options: ParseOptions,
}

impl LoftyTagScanner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            parse_options: ParseOptions::new(),
        }
    }

    pub fn with_options(timeout: Duration, parse_options: ParseOptions) -> Self {
        Self {
            timeout,
            parse_options,
        }
    }
}

#[async_trait]
impl TagScanner for LoftyTagScanner {
    async fn scan(&self, path: &Path) -> Result<ScanResult> {
        let owned = path.to_path_buf();
        let options = self.parse_options;
        let blocking = task::spawn_blocking(move || read_tags(&owned, options));

        match time::timeout(self.timeout, blocking).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(scan_failed(path, join_err)),
            Err(_) => Err(MetadataError::ScanTimeout {
                path: path.display().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

fn scan_failed(path: &Path, err: impl std::fmt::Display) -> MetadataError {
    MetadataError::ScanFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Tag key an embedded picture of `pic_type` is reported under.
pub fn picture_tag_key(pic_type: PictureType) -> &'static str {
    match pic_type {
        PictureType::Icon | PictureType::OtherIcon => PREVIEW_IMAGE_TAG,
        _ => IMAGE_TAG,
    }
}

fn push(tags: &mut Tags, key: &str, value: TagValue) {
    tags.entry(key.to_string()).or_default().push(value);
}

fn read_tags(path: &Path, options: ParseOptions) -> Result<ScanResult> {
    debug!(path = %path.display(), "Scanning tags");

    let tagged_file = Probe::open(path)
        .map_err(|e| scan_failed(path, e))?
        .options(options)
        .guess_file_type()
        .map_err(|e| scan_failed(path, e))?
        .read()
        .map_err(|e| scan_failed(path, e))?;

    let duration = tagged_file.properties().duration().as_millis() as u64;

    let mut tags = Tags::new();
    for tag in tagged_file.tags() {
        for picture in tag.pictures() {
            if picture.data().is_empty() {
                continue;
            }
            push(
                &mut tags,
                picture_tag_key(picture.pic_type()),
                TagValue::Binary(Bytes::copy_from_slice(picture.data())),
            );
        }

        let text = [
            ("title", tag.title()),
            ("artist", tag.artist()),
            ("album", tag.album()),
        ];
        for (key, value) in text {
            if let Some(value) = value {
                push(&mut tags, key, TagValue::Text(value.into_owned()));
            }
        }
        if let Some(track) = tag.track() {
            push(&mut tags, "track-number", TagValue::Integer(i64::from(track)));
        }
    }

    Ok(ScanResult {
        tags,
        duration: (duration > 0).then_some(duration),
    })
}
