//! Memoisation of parsed paths for path arguments that vary row to row.

use std::sync::Arc;

use hashbrown::HashMap;
use log::trace;

use crate::config::VariantQueryConfig;
use crate::error::PathParseError;
use crate::path::{parse_path, ParsedPath};

type CachedParse = Result<Arc<ParsedPath>, PathParseError>;

/// A path-text to parsed-path map owned by exactly one fragment.
///
/// Entries are inserted lazily and never evicted. Once `capacity` distinct
/// paths are stored, further misses are parsed without being inserted.
#[derive(Debug)]
pub struct PathCache {
    entries: HashMap<String, CachedParse>,
    capacity: usize,
    cache_failures: bool,
    hits: u64,
    misses: u64,
}

impl PathCache {
    pub fn new(capacity: usize, cache_failures: bool) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            cache_failures,
            hits: 0,
            misses: 0,
        }
    }

    pub fn from_config(config: &VariantQueryConfig) -> Self {
        Self::new(config.path_cache_capacity, config.cache_parse_failures)
    }

    /// Returns the parsed form of `path`, parsing it only on the first sighting.
    pub fn resolve(&mut self, path: &str) -> CachedParse {
        if let Some(entry) = self.entries.get(path) {
            self.hits += 1;
            return entry.clone();
        }

        self.misses += 1;
        let parsed = parse_path(path).map(Arc::new);
        let cacheable = parsed.is_ok() || self.cache_failures;
        if cacheable && self.entries.len() < self.capacity {
            self.entries.insert(path.to_owned(), parsed.clone());
        } else if cacheable {
            trace!("Path cache full ({} entries), not caching '{}'", self.capacity, path);
        }
        parsed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
