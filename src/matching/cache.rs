// src/matching/cache.rs
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;

use crate::models::BrandLabel;

/// Memoizes brand resolution per distinct raw name within one batch run.
///
/// Every entry is computed against one vocabulary version; a lookup under a
/// different version flushes the cache wholesale, so a mid-run vocabulary
/// append can never serve a stale label. The cache is scoped to a single
/// orchestration run and rebuilt on the next one.
pub struct ResolutionCache {
    entries: LruCache<String, BrandLabel>,
    vocab_version: u64,
    hits: usize,
    misses: usize,
}

impl ResolutionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::new(NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1")),
            vocab_version: 0,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &str, vocab_version: u64) -> Option<BrandLabel> {
        self.sync_version(vocab_version);
        match self.entries.get(key) {
            Some(label) => {
                self.hits += 1;
                Some(label.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: String, label: BrandLabel, vocab_version: u64) {
        self.sync_version(vocab_version);
        self.entries.put(key, label);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn log_stats(&self) {
        let total = self.hits + self.misses;
        if total > 0 {
            info!(
                "Resolution cache: {} hits, {} misses ({:.1}% hit rate, {} distinct names)",
                self.hits,
                self.misses,
                self.hits as f64 * 100.0 / total as f64,
                self.entries.len()
            );
        }
    }

    fn sync_version(&mut self, vocab_version: u64) {
        if vocab_version != self.vocab_version {
            if !self.entries.is_empty() {
                debug!(
                    "Flushing resolution cache: vocabulary version {} -> {}",
                    self.vocab_version, vocab_version
                );
            }
            self.entries.clear();
            self.vocab_version = vocab_version;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_cached_label_for_same_version() {
        let mut cache = ResolutionCache::new(16);
        cache.put("MI BAND 8".to_string(), BrandLabel::Canonical("XIAOMI".into()), 1);
        assert_eq!(
            cache.get("MI BAND 8", 1),
            Some(BrandLabel::Canonical("XIAOMI".into()))
        );
    }

    #[test]
    fn version_change_flushes_all_entries() {
        let mut cache = ResolutionCache::new(16);
        cache.put("A".to_string(), BrandLabel::Unresolved, 1);
        cache.put("B".to_string(), BrandLabel::Unresolved, 1);
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.get("A", 2), None);
        assert!(cache.is_empty());
    }
}
