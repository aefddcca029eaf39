//! # Local Images Metadata Module
//!
//! Extracts album art from local tracks and keeps it in a content-addressed
//! image store.
//!
//! ## Overview
//!
//! This module handles:
//! - Content-addressed image storage ([`ImageStore`])
//! - Tag scanning through `lofty` ([`LoftyTagScanner`])
//! - Embedded and sidecar art extraction ([`ImageExtractor`])
//! - The library proxy that attaches art to tracks ([`ImageLibrary`])
//! - Cleanup of unreferenced images on close ([`Reconciler`])

pub mod error;
pub mod extractor;
pub mod image_store;
pub mod library;
pub mod reconciler;
pub mod scanner;

pub use error::{MetadataError, Result};
pub use extractor::ImageExtractor;
pub use image_store::{join_uri, ImageStore, StoredEntry, StoredImage};
pub use library::{ImageLibrary, IMAGE_LIBRARY_NAME};
pub use reconciler::{ReconcileReport, Reconciler};
pub use scanner::{LoftyTagScanner, ScanResult, TagScanner};
