//! Domain models for the local track library
//!
//! Plain value types shared by every delegate library and the image proxy.
//! Values are immutable in spirit: enrichment builds a new `Track` with a new
//! `Album` instead of mutating one in place.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// =============================================================================
// Tag Types
// =============================================================================

/// A single raw tag value as produced by a metadata scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Integer(i64),
    /// Raw bytes, e.g. an embedded picture
    Binary(Bytes),
}

impl TagValue {
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            TagValue::Binary(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            TagValue::Text(_) => "text",
            TagValue::Integer(_) => "integer",
            TagValue::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(text) => write!(f, "{}", text),
            TagValue::Integer(value) => write!(f, "{}", value),
            TagValue::Binary(data) => write!(f, "<{} {} bytes>", self.kind(), data.len()),
        }
    }
}

/// Tag name to the list of values found for it.
pub type Tags = HashMap<String, Vec<TagValue>>;

/// Search query: field name to the values to match.
pub type Query = BTreeMap<String, Vec<String>>;

// =============================================================================
// Library Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Artist {
    pub uri: Option<String>,
    pub name: Option<String>,
}

impl Artist {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            uri: None,
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub uri: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub num_tracks: Option<u32>,
    pub date: Option<String>,
    /// Image URIs attached to this album
    #[serde(default)]
    pub images: BTreeSet<String>,
}

impl Album {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Whether the album carries a non-empty name.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Copy of this album with its image list replaced.
    pub fn with_images(&self, images: BTreeSet<String>) -> Self {
        Self {
            images,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub album: Option<Album>,
    pub track_no: Option<u32>,
    /// Length in milliseconds
    pub length: Option<u64>,
    /// Modification time in milliseconds since the epoch
    pub last_modified: Option<i64>,
}

impl Track {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_album(mut self, album: Album) -> Self {
        self.album = Some(album);
        self
    }

    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.artists.push(artist);
        self
    }

    /// The album, if present and named.
    pub fn named_album(&self) -> Option<&Album> {
        self.album.as_ref().filter(|album| album.has_name())
    }

    /// Image URIs referenced by this track's album.
    pub fn album_images(&self) -> impl Iterator<Item = &String> {
        self.album.iter().flat_map(|album| album.images.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Image {
    pub uri: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            width: None,
            height: None,
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    Directory,
    Track,
    Album,
    Artist,
}

/// Lightweight browse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub uri: String,
    pub name: Option<String>,
    pub ref_type: RefType,
}

impl Ref {
    pub fn track(uri: impl Into<String>, name: Option<String>) -> Self {
        Self {
            uri: uri.into(),
            name,
            ref_type: RefType::Track,
        }
    }

    pub fn directory(uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: Some(name.into()),
            ref_type: RefType::Directory,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub uri: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default)]
    pub artists: Vec<Artist>,
}
