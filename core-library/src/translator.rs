//! Conversion between `local:track:` URIs and media file paths.

use crate::error::{LibraryError, Result};
use std::path::{Component, Path, PathBuf};

const TRACK_PREFIX: &str = "local:track:";

/// Resolve a `local:track:` URI to a file below `media_dir`.
///
/// The remainder of the URI is a percent-encoded path relative to the media
/// directory. Absolute paths and `..` segments are rejected.
pub fn local_track_uri_to_path(uri: &str, media_dir: &Path) -> Result<PathBuf> {
    let encoded = uri
        .strip_prefix(TRACK_PREFIX)
        .ok_or_else(|| LibraryError::InvalidUri(uri.to_string()))?;

    let decoded = urlencoding::decode(encoded)
        .map_err(|_| LibraryError::InvalidUri(uri.to_string()))?;

    let relative = Path::new(decoded.as_ref());
    if decoded.is_empty()
        || relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(LibraryError::InvalidUri(uri.to_string()));
    }

    Ok(media_dir.join(relative))
}

/// Build the `local:track:` URI for a file below `media_dir`.
pub fn path_to_local_track_uri(path: &Path, media_dir: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(media_dir)
        .map_err(|_| LibraryError::InvalidInput {
            field: "path".to_string(),
            message: format!("{} is outside the media directory", path.display()),
        })?;

    let segments = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str().map(|s| urlencoding::encode(s).into_owned()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .filter(|segments| !segments.is_empty())
        .ok_or_else(|| LibraryError::InvalidInput {
            field: "path".to_string(),
            message: format!("{} is not a valid media file path", path.display()),
        })?;

    Ok(format!("{}{}", TRACK_PREFIX, segments.join("/")))
}
