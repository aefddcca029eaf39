//! # Library Management Module
//!
//! Domain models and the delegate library contract for local tracks.
//!
//! ## Overview
//!
//! This module provides:
//! - Track, album, artist and image models
//! - The [`LocalLibrary`] capability and its tag-aware extension
//!   [`TaggedLibrary`], selected once through [`LibraryHandle`]
//! - An explicit [`LibraryRegistry`] of library factories
//! - `local:track:` URI translation
//! - [`InMemoryLibrary`], a reference delegate registered as `"memory"`

pub mod error;
pub mod library;
pub mod memory;
pub mod models;
pub mod registry;
pub mod translator;

pub use error::{LibraryError, Result};
pub use library::{LibraryHandle, LocalLibrary, SearchRequest, TaggedLibrary};
pub use memory::InMemoryLibrary;
pub use models::{Album, Artist, Image, Query, Ref, RefType, SearchResult, TagValue, Tags, Track};
pub use registry::{LibraryFactory, LibraryRegistry};

use std::sync::Arc;

/// Register the built-in libraries.
pub fn register_builtin(registry: &mut LibraryRegistry) {
    registry.register("memory", |_config| async {
        Ok(LibraryHandle::tagged(Arc::new(InMemoryLibrary::new())))
    });
}
