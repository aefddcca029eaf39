//! # Delegate Library Capability
//!
//! The contract every local track library implements, plus the optional
//! extended `add` that also receives the raw scan output.
//!
//! ## Capability probe
//!
//! Callers never check per call whether a delegate understands tags. A
//! [`LibraryHandle`] is built once, either with [`LibraryHandle::basic`] or
//! [`LibraryHandle::tagged`], and [`LibraryHandle::add`] dispatches on what was
//! recorded at construction.
//!
//! ```ignore
//! let handle = LibraryHandle::tagged(Arc::new(JsonLibrary::open(&config)?));
//! handle.add(track, Some(tags), Some(duration_ms)).await?;
//! ```

use crate::error::Result;
use crate::models::{Image, Query, Ref, SearchResult, Tags, Track};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Default page size for [`SearchRequest`].
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Parameters of a library search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: Query,
    pub limit: usize,
    pub offset: usize,
    /// Restrict results to these URIs (or URI prefixes)
    pub uris: Option<Vec<String>>,
    /// Exact match instead of substring match
    pub exact: bool,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            limit: DEFAULT_SEARCH_LIMIT,
            offset: 0,
            uris: None,
            exact: false,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_uris(mut self, uris: Vec<String>) -> Self {
        self.uris = Some(uris);
        self
    }

    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::new(Query::new())
    }
}

/// A local track library.
#[async_trait]
pub trait LocalLibrary: Send + Sync {
    /// Implementation name, as registered.
    fn name(&self) -> &'static str;

    /// (Re)load the library, returning the number of tracks.
    async fn load(&self) -> Result<usize>;

    async fn browse(&self, uri: &str) -> Result<Vec<Ref>>;

    /// Distinct values of `field` among tracks matching `query`.
    async fn get_distinct(&self, field: &str, query: Option<Query>) -> Result<BTreeSet<String>>;

    async fn get_images(&self, uris: &[String]) -> Result<HashMap<String, Vec<Image>>>;

    async fn lookup(&self, uri: &str) -> Result<Vec<Track>>;

    async fn search(&self, request: SearchRequest) -> Result<SearchResult>;

    /// Start an update session; returns a complete snapshot of every
    /// currently indexed track.
    async fn begin(&self) -> Result<Vec<Track>>;

    async fn add(&self, track: Track) -> Result<()>;

    async fn remove(&self, uri: &str) -> Result<()>;

    /// Persist pending changes. `true` if anything was written.
    async fn flush(&self) -> Result<bool>;

    /// Drop every indexed track. `true` on success.
    async fn clear(&self) -> Result<bool>;

    /// End the update session and release resources.
    async fn close(&self) -> Result<()>;
}

/// A library whose `add` also accepts the raw scan output.
#[async_trait]
pub trait TaggedLibrary: LocalLibrary {
    async fn add_with_tags(
        &self,
        track: Track,
        tags: Option<Tags>,
        duration: Option<u64>,
    ) -> Result<()>;
}

/// A delegate library together with its probed `add` capability.
#[derive(Clone)]
pub struct LibraryHandle {
    library: Arc<dyn LocalLibrary>,
    tagged: Option<Arc<dyn TaggedLibrary>>,
}

impl LibraryHandle {
    /// Wrap a library that only understands `add(track)`.
    pub fn basic(library: Arc<dyn LocalLibrary>) -> Self {
        Self {
            library,
            tagged: None,
        }
    }

    /// Wrap a library that understands `add(track, tags, duration)`.
    pub fn tagged<L>(library: Arc<L>) -> Self
    where
        L: TaggedLibrary + 'static,
    {
        let tagged: Arc<dyn TaggedLibrary> = library.clone();
        Self {
            library,
            tagged: Some(tagged),
        }
    }

    pub fn library(&self) -> &Arc<dyn LocalLibrary> {
        &self.library
    }

    pub fn accepts_tags(&self) -> bool {
        self.tagged.is_some()
    }

    /// Forward `add`, passing tags and duration only to libraries that take them.
    pub async fn add(&self, track: Track, tags: Option<Tags>, duration: Option<u64>) -> Result<()> {
        match &self.tagged {
            Some(tagged) => tagged.add_with_tags(track, tags, duration).await,
            None => self.library.add(track).await,
        }
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("library", &self.library.name())
            .field("accepts_tags", &self.accepts_tags())
            .finish()
    }
}

impl std::ops::Deref for LibraryHandle {
    type Target = dyn LocalLibrary;

    fn deref(&self) -> &Self::Target {
        self.library.as_ref()
    }
}
