//! # Image Library Proxy
//!
//! A [`LocalLibrary`] that wraps the configured delegate library. Adding a
//! track with a named album scans the media file, stores its embedded and
//! sidecar art, and replaces the album's image list with the stored
//! references before forwarding. Closing the library runs the
//! [`Reconciler`] over the image store.
//!
//! Everything else is forwarded to the delegate unchanged.
//!
//! ```ignore
//! let mut registry = LibraryRegistry::new();
//! core_library::register_builtin(&mut registry);
//!
//! let library = ImageLibrary::from_config(config, &registry, None).await?;
//! library.add(track).await?;
//! library.close().await?;
//! ```

use crate::error::Result;
use crate::extractor::ImageExtractor;
use crate::image_store::ImageStore;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::scanner::{LoftyTagScanner, TagScanner};
use async_trait::async_trait;
use core_library::translator::local_track_uri_to_path;
use core_library::{
    Image, LibraryHandle, LibraryRegistry, LocalLibrary, Query, Ref, SearchRequest,
    SearchResult, TaggedLibrary, Tags, Track,
};
use core_runtime::CoreConfig;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name the proxy is registered under.
pub const IMAGE_LIBRARY_NAME: &str = "images";

type LibResult<T> = core_library::Result<T>;

pub struct ImageLibrary {
    delegate: LibraryHandle,
    store: Arc<ImageStore>,
    extractor: ImageExtractor,
    scanner: Arc<dyn TagScanner>,
    media_dir: PathBuf,
}

impl ImageLibrary {
    pub fn with_parts(
        delegate: LibraryHandle,
        store: Arc<ImageStore>,
        extractor: ImageExtractor,
        scanner: Arc<dyn TagScanner>,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            delegate,
            store,
            extractor,
            scanner,
            media_dir: media_dir.into(),
        }
    }

    /// Build the proxy around `config.library`, looked up in `libraries`.
    ///
    /// # Errors
    ///
    /// Fails when the delegate is not registered, the file system bridge is
    /// missing, or the image directory cannot be created.
    pub async fn from_config(
        config: CoreConfig,
        libraries: &LibraryRegistry,
        scanner: Option<Arc<dyn TagScanner>>,
    ) -> Result<Self> {
        let delegate = libraries.create(&config.library, config.clone()).await?;
        debug!(library = delegate.name(), "Using local library");

        let fs = config.file_system()?;
        let store = Arc::new(ImageStore::new(
            Arc::clone(&fs),
            config.image_dir(),
            config.base_uri.clone(),
        ));
        store.init().await?;

        let extractor = ImageExtractor::new(Arc::clone(&store), fs, config.album_art_files.clone());
        let scanner: Arc<dyn TagScanner> = match scanner {
            Some(scanner) => scanner,
            None => Arc::new(LoftyTagScanner::new(config.scan_timeout)),
        };

        Ok(Self::with_parts(
            delegate,
            store,
            extractor,
            scanner,
            config.media_dir,
        ))
    }

    pub fn delegate(&self) -> &LibraryHandle {
        &self.delegate
    }

    pub fn store(&self) -> &Arc<ImageStore> {
        &self.store
    }

    /// Close the delegate and sweep unreferenced images.
    pub async fn close_with_report(&self) -> Result<ReconcileReport> {
        Reconciler::new(self.delegate.library().as_ref(), &self.store)
            .run()
            .await
    }

    /// Track with its album images replaced, or `None` to pass it through.
    async fn enrich(&self, track: &Track, tags: Option<&Tags>) -> Option<Track> {
        let album = track.named_album()?;

        let path = match local_track_uri_to_path(&track.uri, &self.media_dir) {
            Ok(path) => path,
            Err(err) => {
                warn!(uri = %track.uri, error = %err, "Error extracting images");
                return None;
            }
        };

        let scanned;
        let tags = match tags.filter(|t| !t.is_empty()) {
            Some(tags) => tags,
            None => {
                debug!(path = %path.display(), "Scanning for images");
                match self.scanner.scan(&path).await {
                    Ok(result) => {
                        scanned = result.tags;
                        &scanned
                    }
                    Err(err) => {
                        warn!(uri = %track.uri, error = %err, "Error extracting images");
                        return None;
                    }
                }
            }
        };

        let images = self.extractor.extract(&path, tags).await;
        Some(Track {
            album: Some(album.with_images(images)),
            ..track.clone()
        })
    }

    async fn fill_dimensions(&self, image: &mut Image) {
        if image.has_dimensions() {
            return;
        }
        let Some(name) = self.store.name_for_uri(&image.uri) else {
            return;
        };
        match self.store.dimensions(&name).await {
            Ok(Some((width, height))) => {
                image.width = Some(width);
                image.height = Some(height);
            }
            Ok(None) => {}
            Err(err) => debug!(uri = %image.uri, error = %err, "No dimensions for image"),
        }
    }
}

#[async_trait]
impl LocalLibrary for ImageLibrary {
    fn name(&self) -> &'static str {
        IMAGE_LIBRARY_NAME
    }

    async fn load(&self) -> LibResult<usize> {
        self.delegate.load().await
    }

    async fn browse(&self, uri: &str) -> LibResult<Vec<Ref>> {
        self.delegate.browse(uri).await
    }

    async fn get_distinct(&self, field: &str, query: Option<Query>) -> LibResult<BTreeSet<String>> {
        self.delegate.get_distinct(field, query).await
    }

    async fn get_images(&self, uris: &[String]) -> LibResult<HashMap<String, Vec<Image>>> {
        let mut result = self.delegate.get_images(uris).await?;
        for images in result.values_mut() {
            for image in images.iter_mut() {
                self.fill_dimensions(image).await;
            }
        }
        Ok(result)
    }

    async fn lookup(&self, uri: &str) -> LibResult<Vec<Track>> {
        self.delegate.lookup(uri).await
    }

    async fn search(&self, request: SearchRequest) -> LibResult<SearchResult> {
        self.delegate.search(request).await
    }

    async fn begin(&self) -> LibResult<Vec<Track>> {
        self.delegate.begin().await
    }

    async fn add(&self, track: Track) -> LibResult<()> {
        self.add_with_tags(track, None, None).await
    }

    async fn remove(&self, uri: &str) -> LibResult<()> {
        self.delegate.remove(uri).await
    }

    async fn flush(&self) -> LibResult<bool> {
        self.delegate.flush().await
    }

    /// Clears the image store, then the delegate.
    async fn clear(&self) -> LibResult<bool> {
        let removed = self.store.clear().await;
        info!(removed, "Cleared image directory");
        self.delegate.clear().await
    }

    async fn close(&self) -> LibResult<()> {
        self.close_with_report()
            .await
            .map(|_| ())
            .map_err(Into::into)
    }
}

#[async_trait]
impl TaggedLibrary for ImageLibrary {
    async fn add_with_tags(
        &self,
        track: Track,
        tags: Option<Tags>,
        duration: Option<u64>,
    ) -> LibResult<()> {
        let track = match self.enrich(&track, tags.as_ref()).await {
            Some(enriched) => enriched,
            None => track,
        };
        self.delegate.add(track, tags, duration).await
    }
}
