//! Library proxy: enrichment, forwarding and cleanup

mod common;

use async_trait::async_trait;
use common::*;
use core_library::error::Result as LibResult;
use core_library::{
    Album, Image, InMemoryLibrary, LibraryError, LibraryHandle, LibraryRegistry, LocalLibrary,
    Query, Ref, SearchRequest, SearchResult, TagValue, TaggedLibrary, Tags, Track,
};
use core_metadata::scanner::TagScanner;
use core_metadata::ImageLibrary;
use mockall::{mock, Sequence};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

mock! {
    pub Delegate {}

    #[async_trait]
    impl LocalLibrary for Delegate {
        fn name(&self) -> &'static str;
        async fn load(&self) -> LibResult<usize>;
        async fn browse(&self, uri: &str) -> LibResult<Vec<Ref>>;
        async fn get_distinct(&self, field: &str, query: Option<Query>) -> LibResult<BTreeSet<String>>;
        async fn get_images(&self, uris: &[String]) -> LibResult<HashMap<String, Vec<Image>>>;
        async fn lookup(&self, uri: &str) -> LibResult<Vec<Track>>;
        async fn search(&self, request: SearchRequest) -> LibResult<SearchResult>;
        async fn begin(&self) -> LibResult<Vec<Track>>;
        async fn add(&self, track: Track) -> LibResult<()>;
        async fn remove(&self, uri: &str) -> LibResult<()>;
        async fn flush(&self) -> LibResult<bool>;
        async fn clear(&self) -> LibResult<bool>;
        async fn close(&self) -> LibResult<()>;
    }

    #[async_trait]
    impl TaggedLibrary for Delegate {
        async fn add_with_tags(&self, track: Track, tags: Option<Tags>, duration: Option<u64>) -> LibResult<()>;
    }
}

const TRACK_URI: &str = "local:track:album/01.mp3";

fn proxy(dirs: &Dirs, delegate: LibraryHandle, scanner: Arc<dyn TagScanner>) -> ImageLibrary {
    let store = dirs.store();
    let extractor = dirs.extractor(&store, &["cover.jpg"]);
    ImageLibrary::with_parts(delegate, store, extractor, scanner, dirs.media.path())
}

fn memory_proxy(dirs: &Dirs, scanner: Arc<dyn TagScanner>) -> (Arc<InMemoryLibrary>, ImageLibrary) {
    let memory = Arc::new(InMemoryLibrary::new());
    let library = proxy(dirs, LibraryHandle::tagged(Arc::clone(&memory)), scanner);
    (memory, library)
}

async fn stored_track(memory: &InMemoryLibrary, uri: &str) -> Track {
    memory.lookup(uri).await.unwrap().remove(0)
}

#[tokio::test]
async fn test_add_without_album_passes_through() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new().with_tags("01.mp3", image_tags(vec![gif()])));
    let (memory, library) = memory_proxy(&dirs, scanner.clone());
    dirs.media_file("album/01.mp3");

    let bare = Track::new(TRACK_URI).with_name("No album");
    library.add(bare.clone()).await.unwrap();
    assert_eq!(stored_track(&memory, TRACK_URI).await, bare);

    let unnamed = Track::new(TRACK_URI).with_album(Album::default());
    library.add(unnamed.clone()).await.unwrap();
    assert_eq!(stored_track(&memory, TRACK_URI).await, unnamed);

    assert_eq!(scanner.calls(), 0);
    assert!(dirs.stored_names().is_empty());
}

#[tokio::test]
async fn test_add_replaces_album_images() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new().with_tags("01.mp3", image_tags(vec![gif()])));
    let (memory, library) = memory_proxy(&dirs, scanner.clone());
    dirs.media_file("album/01.mp3");

    let mut album = Album::named("Blue Train");
    album.images.insert("/images/stale.png".to_string());
    library
        .add(Track::new(TRACK_URI).with_album(album))
        .await
        .unwrap();

    let track = stored_track(&memory, TRACK_URI).await;
    assert_eq!(
        track.album.unwrap().images,
        BTreeSet::from([format!("/images/{}.gif", GIF_MD5)])
    );
    assert_eq!(scanner.calls(), 1);
}

#[tokio::test]
async fn test_second_add_does_not_accumulate() {
    let dirs = Dirs::new();
    let scanner: Arc<dyn TagScanner> = Arc::new(FakeScanner::new());
    let (memory, library) = memory_proxy(&dirs, scanner);
    dirs.media_file("album/01.mp3");

    let track = album_track(TRACK_URI, "Blue Train");
    library
        .add_with_tags(track.clone(), Some(image_tags(vec![gif()])), None)
        .await
        .unwrap();
    library
        .add_with_tags(track, Some(image_tags(vec![png()])), None)
        .await
        .unwrap();

    let images = stored_track(&memory, TRACK_URI).await.album.unwrap().images;
    assert_eq!(
        images,
        BTreeSet::from([format!("/images/{}", md5_name(&png(), "png"))])
    );
}

#[tokio::test]
async fn test_supplied_tags_skip_scan() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new());
    let (memory, library) = memory_proxy(&dirs, scanner.clone());
    dirs.media_file("album/01.mp3");

    library
        .add_with_tags(
            album_track(TRACK_URI, "Blue Train"),
            Some(image_tags(vec![gif()])),
            Some(42_000),
        )
        .await
        .unwrap();

    assert_eq!(scanner.calls(), 0);
    let track = stored_track(&memory, TRACK_URI).await;
    assert_eq!(track.length, Some(42_000));
    assert_eq!(track.album.unwrap().images.len(), 1);
}

#[tokio::test]
async fn test_empty_supplied_tags_still_scan() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new().with_tags("01.mp3", image_tags(vec![gif()])));
    let (memory, library) = memory_proxy(&dirs, scanner.clone());
    dirs.media_file("album/01.mp3");

    library
        .add_with_tags(album_track(TRACK_URI, "Blue Train"), Some(Tags::new()), None)
        .await
        .unwrap();

    assert_eq!(scanner.calls(), 1);
    let track = stored_track(&memory, TRACK_URI).await;
    assert_eq!(
        track.album.unwrap().images,
        BTreeSet::from([format!("/images/{}.gif", GIF_MD5)])
    );
}

#[tokio::test]
async fn test_scan_failure_passes_track_unchanged() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new().failing("01.mp3"));
    let (memory, library) = memory_proxy(&dirs, scanner.clone());
    dirs.media_file("album/01.mp3");
    std::fs::write(dirs.media.path().join("album/cover.jpg"), jpeg()).unwrap();

    let mut album = Album::named("Blue Train");
    album.images.insert("/images/kept.png".to_string());
    let track = Track::new(TRACK_URI).with_album(album);
    library.add(track.clone()).await.unwrap();

    assert_eq!(scanner.calls(), 1);
    assert_eq!(stored_track(&memory, TRACK_URI).await, track);
    assert!(dirs.stored_names().is_empty());
}

#[tokio::test]
async fn test_non_local_uri_passes_through() {
    let dirs = Dirs::new();
    let scanner = Arc::new(FakeScanner::new());
    let (memory, library) = memory_proxy(&dirs, scanner.clone());

    let track = album_track("file:///tmp/x.mp3", "Blue Train");
    library.add(track.clone()).await.unwrap();

    assert_eq!(scanner.calls(), 0);
    assert_eq!(stored_track(&memory, "file:///tmp/x.mp3").await, track);
}

#[tokio::test]
async fn test_close_deletes_unreferenced_files() {
    let dirs = Dirs::new();
    let scanner: Arc<dyn TagScanner> = Arc::new(FakeScanner::new());
    let (_memory, library) = memory_proxy(&dirs, scanner);
    dirs.media_file("album/01.mp3");
    dirs.media_file("album/02.mp3");

    library
        .add_with_tags(album_track(TRACK_URI, "A"), Some(image_tags(vec![gif()])), None)
        .await
        .unwrap();
    library
        .add_with_tags(
            album_track("local:track:album/02.mp3", "A"),
            Some(image_tags(vec![png()])),
            None,
        )
        .await
        .unwrap();
    let orphan = library.store().put(jpeg(), None).await.unwrap();
    assert_eq!(dirs.stored_names().len(), 3);

    let report = library.close_with_report().await.unwrap();

    assert_eq!(report.referenced, 2);
    assert_eq!(report.scanned, 3);
    assert_eq!(report.deleted, vec![orphan.name.clone()]);
    assert!(report.failed.is_empty());

    let mut expected = vec![format!("{}.gif", GIF_MD5), md5_name(&png(), "png")];
    expected.sort();
    assert_eq!(dirs.stored_names(), expected);
}

#[tokio::test]
async fn test_close_without_orphans_deletes_nothing() {
    let dirs = Dirs::new();
    let scanner: Arc<dyn TagScanner> = Arc::new(FakeScanner::new());
    let (_memory, library) = memory_proxy(&dirs, scanner);
    dirs.media_file("album/01.mp3");

    library
        .add_with_tags(album_track(TRACK_URI, "A"), Some(image_tags(vec![gif()])), None)
        .await
        .unwrap();

    let report = library.close_with_report().await.unwrap();
    assert!(report.deleted.is_empty());
    assert_eq!(dirs.stored_names(), vec![format!("{}.gif", GIF_MD5)]);
}

#[tokio::test]
async fn test_end_to_end_gif() {
    let dirs = Dirs::new();
    dirs.media_file("album/01.mp3");
    let scanner = Arc::new(FakeScanner::new().with_tags("01.mp3", image_tags(vec![gif()])));

    let added = Arc::new(Mutex::new(Vec::<Track>::new()));
    let sink = Arc::clone(&added);

    let mut delegate = MockDelegate::new();
    delegate
        .expect_add_with_tags()
        .times(1)
        .returning(move |track, tags, duration| {
            assert!(tags.is_none());
            assert!(duration.is_none());
            sink.lock().unwrap().push(track);
            Ok(())
        });
    delegate.expect_begin().times(1).returning(|| Ok(Vec::new()));
    delegate.expect_close().times(1).returning(|| Ok(()));

    let library = proxy(&dirs, LibraryHandle::tagged(Arc::new(delegate)), scanner);
    library.add(album_track(TRACK_URI, "foo")).await.unwrap();

    let name = format!("{}.gif", GIF_MD5);
    let track = added.lock().unwrap().remove(0);
    assert_eq!(
        track.album.unwrap().images,
        BTreeSet::from([format!("/images/{}", name)])
    );
    assert_eq!(dirs.stored_names(), vec![name]);

    library.close().await.unwrap();
    assert!(dirs.stored_names().is_empty());
}

#[tokio::test]
async fn test_snapshot_precedes_close_and_sweep() {
    let dirs = Dirs::new();
    let store = dirs.store();
    let orphan = store.put(gif(), None).await.unwrap();
    let orphan_path = dirs.images.path().join(&orphan.name);

    let mut seq = Sequence::new();
    let mut delegate = MockDelegate::new();
    delegate
        .expect_begin()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(Vec::new()));
    delegate
        .expect_close()
        .times(1)
        .in_sequence(&mut seq)
        .returning(move || {
            assert!(orphan_path.exists(), "sweep ran before close");
            Ok(())
        });

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );
    let report = library.close_with_report().await.unwrap();
    assert_eq!(report.deleted, vec![orphan.name]);
}

#[tokio::test]
async fn test_failed_snapshot_skips_sweep() {
    let dirs = Dirs::new();
    let store = dirs.store();
    store.put(gif(), None).await.unwrap();

    let mut delegate = MockDelegate::new();
    delegate
        .expect_begin()
        .times(1)
        .returning(|| Err(LibraryError::Backend("index unreadable".to_string())));
    delegate.expect_close().times(1).returning(|| Ok(()));

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );

    let err = library.close().await.unwrap_err();
    assert!(matches!(err, LibraryError::Backend(_)));
    assert_eq!(dirs.stored_names().len(), 1);
}

#[tokio::test]
async fn test_basic_delegate_receives_plain_add() {
    let dirs = Dirs::new();
    dirs.media_file("album/01.mp3");

    let mut delegate = MockDelegate::new();
    delegate.expect_add_with_tags().never();
    delegate
        .expect_add()
        .times(1)
        .withf(|track| track.album.as_ref().is_some_and(|a| a.images.len() == 1))
        .returning(|_| Ok(()));

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );
    library
        .add_with_tags(
            album_track(TRACK_URI, "foo"),
            Some(image_tags(vec![gif()])),
            Some(1000),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_tagged_delegate_receives_tags() {
    let dirs = Dirs::new();

    let mut delegate = MockDelegate::new();
    delegate
        .expect_add_with_tags()
        .times(1)
        .withf(|track, tags, duration| {
            track.album.is_none()
                && tags
                    .as_ref()
                    .and_then(|t| t.get("title"))
                    .is_some_and(|v| v == &vec![TagValue::Text("bar".to_string())])
                && *duration == Some(0)
        })
        .returning(|_, _, _| Ok(()));

    let library = proxy(
        &dirs,
        LibraryHandle::tagged(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );
    let tags = Tags::from([("title".to_string(), vec![TagValue::Text("bar".to_string())])]);
    library
        .add_with_tags(Track::new("local:track:foo.mp3"), Some(tags), Some(0))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_images_fills_dimensions() {
    let dirs = Dirs::new();
    let store = dirs.store();
    let stored = store.put(png(), None).await.unwrap();
    let stored_uri = stored.uri.clone();

    let mut delegate = MockDelegate::new();
    delegate.expect_get_images().times(1).returning(move |_| {
        Ok(HashMap::from([
            ("local:track:foo.mp3".to_string(), vec![Image::new(stored_uri.clone())]),
            (
                "local:track:bar.mp3".to_string(),
                vec![Image {
                    uri: "bar.png".to_string(),
                    width: Some(10),
                    height: Some(20),
                }],
            ),
            ("local:track:baz.mp3".to_string(), vec![Image::new("/images/missing.png")]),
        ]))
    });

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );
    let images = library
        .get_images(&["local:track:foo.mp3".to_string()])
        .await
        .unwrap();

    let foo = &images["local:track:foo.mp3"][0];
    assert_eq!((foo.width, foo.height), (Some(1), Some(1)));
    let bar = &images["local:track:bar.mp3"][0];
    assert_eq!((bar.width, bar.height), (Some(10), Some(20)));
    let baz = &images["local:track:baz.mp3"][0];
    assert_eq!((baz.width, baz.height), (None, None));
}

#[tokio::test]
async fn test_clear_empties_store_and_delegate() {
    let dirs = Dirs::new();
    let store = dirs.store();
    store.put(gif(), None).await.unwrap();
    std::fs::create_dir(dirs.images.path().join("sub")).unwrap();

    let mut delegate = MockDelegate::new();
    delegate.expect_clear().times(1).returning(|| Ok(true));

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );
    assert!(library.clear().await.unwrap());
    assert!(dirs.stored_names().is_empty());
}

#[tokio::test]
async fn test_forwards_queries() {
    let dirs = Dirs::new();

    let mut delegate = MockDelegate::new();
    delegate.expect_load().times(1).returning(|| Ok(3));
    delegate
        .expect_browse()
        .withf(|uri| uri == "local:directory")
        .times(1)
        .returning(|_| Ok(Vec::new()));
    delegate
        .expect_search()
        .withf(|request| {
            request.limit == 100 && request.offset == 0 && request.uris.is_none() && !request.exact
        })
        .times(1)
        .returning(|_| Ok(SearchResult::default()));
    delegate
        .expect_get_distinct()
        .withf(|field, query| field == "album" && query.is_none())
        .times(1)
        .returning(|_, _| Ok(BTreeSet::new()));
    delegate
        .expect_remove()
        .withf(|uri| uri == "local:track:foo.mp3")
        .times(1)
        .returning(|_| Ok(()));
    delegate.expect_flush().times(1).returning(|| Ok(true));

    let library = proxy(
        &dirs,
        LibraryHandle::basic(Arc::new(delegate)),
        Arc::new(FakeScanner::new()),
    );

    assert_eq!(library.name(), "images");
    assert_eq!(library.load().await.unwrap(), 3);
    library.browse("local:directory").await.unwrap();
    library.search(SearchRequest::default()).await.unwrap();
    library.get_distinct("album", None).await.unwrap();
    library.remove("local:track:foo.mp3").await.unwrap();
    assert!(library.flush().await.unwrap());
}

#[tokio::test]
async fn test_from_config_unknown_library_is_fatal() {
    let dirs = Dirs::new();
    let config = core_runtime::CoreConfig::builder()
        .media_dir(dirs.media.path())
        .image_dir(dirs.images.path())
        .library("json")
        .file_system(dirs.fs())
        .build()
        .unwrap();

    let mut registry = LibraryRegistry::new();
    core_library::register_builtin(&mut registry);

    let err = ImageLibrary::from_config(config, &registry, None)
        .await
        .err()
        .unwrap();
    assert!(!err.is_recoverable());
    assert!(err.to_string().contains("json"));
}

#[tokio::test]
async fn test_from_config_builds_store() {
    let dirs = Dirs::new();
    let image_dir = dirs.images.path().join("store");
    let config = core_runtime::CoreConfig::builder()
        .media_dir(dirs.media.path())
        .image_dir(&image_dir)
        .file_system(dirs.fs())
        .build()
        .unwrap();

    let mut registry = LibraryRegistry::new();
    core_library::register_builtin(&mut registry);

    let library = ImageLibrary::from_config(config, &registry, Some(Arc::new(FakeScanner::new())))
        .await
        .unwrap();
    assert!(image_dir.is_dir());
    assert_eq!(library.delegate().name(), "memory");
    assert!(library.delegate().accepts_tags());
}
