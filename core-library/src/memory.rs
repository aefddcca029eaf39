//! In-memory reference implementation of [`LocalLibrary`].
//!
//! Tracks are kept in a map keyed by URI. Nothing is persisted; `flush`
//! only reports whether the set changed since the previous flush.

use crate::error::{LibraryError, Result};
use crate::library::{LocalLibrary, SearchRequest, TaggedLibrary};
use crate::models::{Image, Query, Ref, SearchResult, Tags, Track};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Root browse URI.
pub const ROOT_DIRECTORY_URI: &str = "local:directory";

#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    tracks: RwLock<BTreeMap<String, Track>>,
    dirty: AtomicBool,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library pre-populated with `tracks`.
    pub fn with_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let map = tracks
            .into_iter()
            .map(|track| (track.uri.clone(), track))
            .collect();
        Self {
            tracks: RwLock::new(map),
            dirty: AtomicBool::new(false),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Track>>> {
        self.tracks
            .read()
            .map_err(|_| LibraryError::Backend("track map lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Track>>> {
        self.tracks
            .write()
            .map_err(|_| LibraryError::Backend("track map lock poisoned".to_string()))
    }

    fn insert(&self, track: Track) -> Result<()> {
        debug!(uri = %track.uri, "Adding track");
        self.write()?.insert(track.uri.clone(), track);
        self.dirty.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn field_values<'a>(track: &'a Track, field: &str) -> Result<Vec<&'a str>> {
    let album_name = track.album.as_ref().and_then(|a| a.name.as_deref());
    let artist_names = track.artists.iter().filter_map(|a| a.name.as_deref());

    let values = match field {
        "uri" => vec![track.uri.as_str()],
        "track_name" => track.name.as_deref().into_iter().collect(),
        "album" => album_name.into_iter().collect(),
        "artist" => artist_names.collect(),
        "any" => std::iter::once(track.uri.as_str())
            .chain(track.name.as_deref())
            .chain(album_name)
            .chain(artist_names)
            .collect(),
        other => {
            return Err(LibraryError::InvalidInput {
                field: other.to_string(),
                message: "unsupported search field".to_string(),
            })
        }
    };
    Ok(values)
}

fn matches_query(track: &Track, query: &Query, exact: bool) -> Result<bool> {
    for (field, wanted) in query {
        let values = field_values(track, field)?;
        for needle in wanted {
            let needle = needle.to_lowercase();
            let hit = values.iter().any(|value| {
                let value = value.to_lowercase();
                if exact {
                    value == needle
                } else {
                    value.contains(&needle)
                }
            });
            if !hit {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn within_uris(track: &Track, uris: Option<&[String]>) -> bool {
    match uris {
        None => true,
        Some(uris) => uris.iter().any(|prefix| {
            prefix == ROOT_DIRECTORY_URI || track.uri.starts_with(prefix.as_str())
        }),
    }
}

#[async_trait]
impl LocalLibrary for InMemoryLibrary {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn browse(&self, uri: &str) -> Result<Vec<Ref>> {
        if !uri.starts_with(ROOT_DIRECTORY_URI) {
            return Err(LibraryError::InvalidUri(uri.to_string()));
        }
        if uri != ROOT_DIRECTORY_URI {
            return Ok(Vec::new());
        }
        Ok(self
            .read()?
            .values()
            .map(|track| Ref::track(track.uri.clone(), track.name.clone()))
            .collect())
    }

    async fn get_distinct(&self, field: &str, query: Option<Query>) -> Result<BTreeSet<String>> {
        let query = query.unwrap_or_default();
        let tracks = self.read()?;
        let mut distinct = BTreeSet::new();

        for track in tracks.values() {
            if !matches_query(track, &query, false)? {
                continue;
            }
            match field {
                "album" => distinct.extend(
                    track
                        .album
                        .as_ref()
                        .and_then(|a| a.name.clone()),
                ),
                "artist" => distinct.extend(track.artists.iter().filter_map(|a| a.name.clone())),
                other => {
                    return Err(LibraryError::InvalidInput {
                        field: other.to_string(),
                        message: "unsupported distinct field".to_string(),
                    })
                }
            }
        }
        Ok(distinct)
    }

    async fn get_images(&self, uris: &[String]) -> Result<HashMap<String, Vec<Image>>> {
        let tracks = self.read()?;
        Ok(uris
            .iter()
            .filter_map(|uri| {
                tracks.get(uri).map(|track| {
                    let images = track.album_images().map(Image::new).collect();
                    (uri.clone(), images)
                })
            })
            .collect())
    }

    async fn lookup(&self, uri: &str) -> Result<Vec<Track>> {
        Ok(self.read()?.get(uri).cloned().into_iter().collect())
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResult> {
        let tracks = self.read()?;
        let mut found = Vec::new();
        for track in tracks.values() {
            if within_uris(track, request.uris.as_deref())
                && matches_query(track, &request.query, request.exact)?
            {
                found.push(track.clone());
            }
        }

        Ok(SearchResult {
            uri: Some(format!("local:search?{}", if request.exact { "exact" } else { "any" })),
            tracks: found
                .into_iter()
                .skip(request.offset)
                .take(request.limit)
                .collect(),
            ..Default::default()
        })
    }

    async fn begin(&self) -> Result<Vec<Track>> {
        Ok(self.read()?.values().cloned().collect())
    }

    async fn add(&self, track: Track) -> Result<()> {
        self.insert(track)
    }

    async fn remove(&self, uri: &str) -> Result<()> {
        if self.write()?.remove(uri).is_some() {
            self.dirty.store(true, Ordering::SeqCst);
        } else {
            debug!(uri, "Remove of unknown track ignored");
        }
        Ok(())
    }

    async fn flush(&self) -> Result<bool> {
        Ok(self.dirty.swap(false, Ordering::SeqCst))
    }

    async fn clear(&self) -> Result<bool> {
        self.write()?.clear();
        self.dirty.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl TaggedLibrary for InMemoryLibrary {
    /// Fills in a missing track length from the scanned duration.
    async fn add_with_tags(
        &self,
        mut track: Track,
        _tags: Option<Tags>,
        duration: Option<u64>,
    ) -> Result<()> {
        if track.length.is_none() {
            track.length = duration;
        }
        self.insert(track)
    }
}
