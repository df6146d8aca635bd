//! Scheme-prefix lookup for path classes.
//!
//! Maps a URI prefix such as `az://` to a factory that builds the matching
//! `CloudPath`. The registry is an ordinary value: nothing is registered
//! until a caller does it.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    backend::BlobBackend,
    errors::{BlobError, BlobResult},
    path::{AzureBlobPath, CloudPath},
};

/// Builds a path from a full URI (prefix included).
pub type PathFactory = Arc<dyn Fn(&str) -> BlobResult<Box<dyn CloudPath>> + Send + Sync>;

/// Routes URIs to path classes by prefix.
///
/// Prefixes are matched longest-first, so a more specific registration
/// wins over a shorter one that also matches.
#[derive(Default, Clone)]
pub struct PathRegistry {
    factories: BTreeMap<String, PathFactory>,
}

impl fmt::Debug for PathRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathRegistry")
            .field("prefixes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PathRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry with `az://` wired to `backend`.
    pub fn with_backend(backend: Arc<dyn BlobBackend>) -> Self {
        let mut registry = Self::new();
        registry.register(AzureBlobPath::PREFIX, move |uri| {
            let path = AzureBlobPath::new(uri, backend.clone())?;
            Ok(Box::new(path) as Box<dyn CloudPath>)
        });
        registry
    }

    /// Register `factory` for `prefix`, replacing any previous entry.
    pub fn register<F>(&mut self, prefix: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> BlobResult<Box<dyn CloudPath>> + Send + Sync + 'static,
    {
        self.factories.insert(prefix.into(), Arc::new(factory));
    }

    /// Remove the factory for `prefix`. Returns `true` if one was registered.
    pub fn unregister(&mut self, prefix: &str) -> bool {
        self.factories.remove(prefix).is_some()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// True if some registered prefix matches `uri`.
    pub fn is_supported(&self, uri: &str) -> bool {
        self.find(uri).is_some()
    }

    /// Build the path for `uri` with whichever class claims its prefix.
    pub fn resolve(&self, uri: &str) -> BlobResult<Box<dyn CloudPath>> {
        match self.find(uri) {
            Some(factory) => factory(uri),
            None => Err(BlobError::UnsupportedScheme(uri.to_string())),
        }
    }

    fn find(&self, uri: &str) -> Option<&PathFactory> {
        self.factories
            .iter()
            .filter(|(prefix, _)| uri.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, factory)| factory)
    }
}
