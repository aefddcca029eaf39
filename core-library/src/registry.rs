//! Explicit registry of delegate library implementations.
//!
//! Maps a library name to an async factory. Hosts build one registry at
//! startup and pass it where libraries are constructed; the image proxy
//! captures a clone so later registrations do not change its delegate set.

use crate::error::{LibraryError, Result};
use crate::library::LibraryHandle;
use core_runtime::CoreConfig;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Async constructor for a delegate library.
pub type LibraryFactory =
    Arc<dyn Fn(CoreConfig) -> BoxFuture<'static, Result<LibraryHandle>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct LibraryRegistry {
    factories: BTreeMap<String, LibraryFactory>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(CoreConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LibraryHandle>> + Send + 'static,
    {
        let name = name.into();
        debug!(library = %name, "Registering local library");
        let factory: LibraryFactory =
            Arc::new(move |config| -> BoxFuture<'static, Result<LibraryHandle>> {
                Box::pin(factory(config))
            });
        self.factories.insert(name, factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Construct the library registered as `name`.
    ///
    /// # Errors
    ///
    /// [`LibraryError::UnknownLibrary`] if nothing is registered under
    /// `name`, otherwise whatever the factory returns.
    pub async fn create(&self, name: &str, config: CoreConfig) -> Result<LibraryHandle> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| LibraryError::UnknownLibrary {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;
        factory(config).await
    }
}

impl fmt::Debug for LibraryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryRegistry")
            .field("libraries", &self.names())
            .finish()
    }
}
