//! Process-wide cache of component-inlined JS and CSS.
//!
//! Inlined assets are stored per component *class*, keyed by
//! `__components:{class_hash}:{kind}`, so the serving endpoint can return them by URL
//! and the aggregator can inline them into documents.
//!
//! Entries are written at most once per class and kind. Concurrent first renders of the
//! same class may both attempt the write; since they carry the same content and no entry
//! is ever mutated after creation, the race is harmless.

use dashmap::DashMap;

use super::ScriptKind;
use crate::component::ComponentClass;
use crate::constants::CACHE_KEY_PREFIX;

/// Storage for cached component assets.
///
/// Implementations must provide atomic per-key `get`/`set`; no locking is layered on top.
pub trait MediaCache: Send + Sync {
    /// Fetch the content stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Whether `key` is present.
    fn has(&self, key: &str) -> bool;

    /// Store `value` under `key`.
    fn set(&self, key: &str, value: String);
}

/// In-memory [`MediaCache`] backed by a [`DashMap`] for lock-free concurrent access.
#[derive(Debug, Default)]
pub struct InMemoryMediaCache {
    data: DashMap<String, String>,
}

impl InMemoryMediaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl MediaCache for InMemoryMediaCache {
    fn get(&self, key: &str) -> Option<String> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn set(&self, key: &str, value: String) {
        self.data.insert(key.to_string(), value);
    }
}

/// Build the cache key for a class hash and asset kind.
pub fn cache_key(class_hash: &str, kind: ScriptKind) -> String {
    format!("{CACHE_KEY_PREFIX}:{class_hash}:{kind}")
}

/// Cache a class's inlined asset, first write wins.
///
/// Blank content is ignored. Returns `true` when this call wrote the entry.
pub fn cache_inlined(
    cache: &dyn MediaCache,
    class: &ComponentClass,
    kind: ScriptKind,
    content: &str,
) -> bool {
    if content.trim().is_empty() {
        return false;
    }

    let key = cache_key(class.class_hash(), kind);
    if cache.has(&key) {
        return false;
    }

    cache.set(&key, content.trim().to_string());
    tracing::debug!("Cached inlined {} for component {}", kind, class.class_hash());
    true
}

/// Read a class's cached asset.
pub fn get_cached(cache: &dyn MediaCache, class_hash: &str, kind: ScriptKind) -> Option<String> {
    cache.get(&cache_key(class_hash, kind))
}
