//! Mark-and-sweep cleanup of the image store.
//!
//! Marks every image URI referenced by the delegate's current tracks, closes
//! the delegate, then deletes every stored file whose URI was not marked.
//!
//! The sweep is not safe against concurrent adds: an image stored after the
//! snapshot is taken may be deleted. Run it only after indexing has finished.

use crate::error::{MetadataError, Result};
use crate::image_store::ImageStore;
use core_library::LocalLibrary;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Distinct image URIs referenced by the library
    pub referenced: usize,
    /// Files found in the store
    pub scanned: usize,
    /// Names of deleted files
    pub deleted: Vec<String>,
    /// Names of files that could not be deleted
    pub failed: Vec<String>,
}

pub struct Reconciler<'a> {
    library: &'a dyn LocalLibrary,
    store: &'a ImageStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(library: &'a dyn LocalLibrary, store: &'a ImageStore) -> Self {
        Self { library, store }
    }

    /// Snapshot, close the library, sweep.
    ///
    /// # Errors
    ///
    /// Fails without deleting anything when the snapshot cannot be taken or
    /// the store cannot be listed. A failure closing the library is logged
    /// and the sweep still runs.
    pub async fn run(&self) -> Result<ReconcileReport> {
        info!("Cleaning up image directory");

        let snapshot = self.library.begin().await;
        if let Err(err) = self.library.close().await {
            warn!(error = %err, "Failed to close local library");
        }

        let referenced: HashSet<String> = snapshot?
            .iter()
            .flat_map(|track| track.album_images().cloned())
            .collect();

        let entries = self.store.list().await?;
        let mut report = ReconcileReport {
            referenced: referenced.len(),
            scanned: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            if referenced.contains(&self.store.uri_for(&entry.name)) {
                continue;
            }

            info!(path = %entry.path.display(), "Deleting file");
            match self.store.delete(&entry.name).await {
                Ok(()) => report.deleted.push(entry.name),
                Err(MetadataError::NotFound(name)) => {
                    debug!(name = %name, "File already removed");
                }
                Err(err) => {
                    warn!(name = %entry.name, error = %err, "Failed to delete file");
                    report.failed.push(entry.name);
                }
            }
        }

        info!(
            referenced = report.referenced,
            scanned = report.scanned,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Image cleanup finished"
        );
        Ok(report)
    }
}
