//! Content-addressed cache of lowered files.
//!
//! Lowering is the expensive part of a resolution and its result depends only
//! on the file text, so it is shared between requests keyed by
//! `(path, fileName, content hash)`. Cross-file results are never cached.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use tracing::trace;

use crate::syntax::LoweredFile;

/// Hash of a document's text.
pub fn content_hash(text: &str) -> u64 {
    let mut hasher = FxHasher::default();
    text.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    file_name: String,
    hash: u64,
}

/// The text is kept so that a hash collision is never a hit.
#[derive(Debug)]
struct CacheEntry {
    text: Arc<str>,
    lowered: Arc<LoweredFile>,
}

/// Bounded cache; when full, the oldest entry is evicted first.
#[derive(Debug)]
pub struct ParseCache {
    capacity: usize,
    entries: Mutex<IndexMap<CacheKey, CacheEntry>>,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn get(&self, path: &Path, file_name: &str, text: &str) -> Option<Arc<LoweredFile>> {
        let key = CacheKey {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            hash: content_hash(text),
        };
        let hit = self
            .entries
            .lock()
            .get(&key)
            .filter(|entry| &*entry.text == text)
            .map(|entry| entry.lowered.clone());
        trace!(path = %path.display(), hit = hit.is_some(), "parse cache lookup");
        hit
    }

    pub fn insert(&self, path: &Path, file_name: &str, text: &str, lowered: Arc<LoweredFile>) {
        if self.capacity == 0 {
            return;
        }
        let key = CacheKey {
            path: path.to_path_buf(),
            file_name: file_name.to_string(),
            hash: content_hash(text),
        };
        let mut entries = self.entries.lock();
        // An edited document replaces its stale versions.
        entries.retain(|k, _| !(k.path == key.path && k.file_name == key.file_name));
        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(
            key,
            CacheEntry {
                text: Arc::from(text),
                lowered,
            },
        );
    }

    /// Drop every entry for `path`.
    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().retain(|k, _| k.path != path);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
