//! Bounded result cache keyed by a fingerprint of the submitted text.

use crate::issue::Issue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Default number of cached results.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// A 256-bit BLAKE3 digest of submitted text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint the full contents of `text`.
    pub fn of(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint(")?;
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "..)")
    }
}

#[derive(Debug)]
struct CacheSlot {
    issues: Arc<[Issue]>,
    last_used: u64,
}

/// Fingerprint → issue list, least-recently-used eviction.
///
/// Lookups and inserts both count as a use. Eviction scans the (small) slot map for the oldest
/// tick, which is cheaper than maintaining a linked list at this capacity.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    tick: u64,
    slots: HashMap<Fingerprint, CacheSlot>,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` results (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tick: 0,
            slots: HashMap::with_capacity(capacity),
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up cached issues, marking the entry as most recently used.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<Arc<[Issue]>> {
        let tick = self.next_tick();
        let slot = self.slots.get_mut(fingerprint)?;
        slot.last_used = tick;
        Some(Arc::clone(&slot.issues))
    }

    /// Whether a result is cached, without touching recency.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.slots.contains_key(fingerprint)
    }

    /// Store issues for `fingerprint`, evicting the least recently used entry when full.
    pub fn insert(&mut self, fingerprint: Fingerprint, issues: Arc<[Issue]>) {
        let tick = self.next_tick();
        if !self.slots.contains_key(&fingerprint) && self.slots.len() >= self.capacity {
            let oldest = self
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| *key);
            if let Some(oldest) = oldest {
                self.slots.remove(&oldest);
            }
        }
        self.slots.insert(
            fingerprint,
            CacheSlot {
                issues,
                last_used: tick,
            },
        );
    }

    /// Drop every cached result.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of cached results.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of cached results.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Arc<[Issue]> {
        Arc::from(Vec::new())
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(Fingerprint::of("abc"), Fingerprint::of("abc"));
        assert_ne!(Fingerprint::of("abc"), Fingerprint::of("abd"));
    }

    #[test]
    fn test_eleventh_entry_evicts_least_recent() {
        let mut cache = ResultCache::default();
        let keys: Vec<_> = (0..11).map(|i| Fingerprint::of(&format!("text {i}"))).collect();
        for key in &keys[..10] {
            cache.insert(*key, empty());
        }
        // Touch the first entry so the second becomes the oldest.
        assert!(cache.get(&keys[0]).is_some());

        cache.insert(keys[10], empty());
        assert_eq!(cache.len(), 10);
        assert!(cache.get(&keys[1]).is_none());
        assert!(cache.get(&keys[0]).is_some());
        assert!(cache.get(&keys[10]).is_some());
    }

    #[test]
    fn test_reinserting_does_not_evict() {
        let mut cache = ResultCache::new(2);
        let a = Fingerprint::of("a");
        let b = Fingerprint::of("b");
        cache.insert(a, empty());
        cache.insert(b, empty());
        cache.insert(a, empty());
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&b));
    }
}
