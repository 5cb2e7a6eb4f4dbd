//! A bounded, name-keyed LRU cache shared by the Content Store and the
//! Object Processor — same eviction policy, two separate tables so traffic
//! through one never evicts the other (spec'd reason: OP entries must
//! survive long enough to serve as derivation parents).

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use udcn_common::ndn::{Data, Name};

pub struct CacheEntry {
    pub data: Data,
    pub insertion_time: Instant,
}

pub enum CacheResult {
    Hit(Data),
    Miss,
}

pub struct BoundedCache {
    max_size: usize,
    entries: HashMap<Name, CacheEntry>,
    recency: VecDeque<Name>,
}

impl BoundedCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: HashMap::new(),
            recency: VecDeque::new(),
        }
    }

    /// Inserts or refreshes `data`. Evicts the least-recently-used entry
    /// while over `max_size`. A `max_size` of zero disables caching.
    pub fn insert(&mut self, data: Data) -> usize {
        if self.max_size == 0 {
            return 0;
        }
        let name = data.name.clone();
        self.touch_remove(&name);
        self.entries.insert(
            name.clone(),
            CacheEntry {
                data,
                insertion_time: Instant::now(),
            },
        );
        self.recency.push_back(name);

        let mut evictions = 0;
        while self.entries.len() > self.max_size {
            if let Some(evicted) = self.recency.pop_front() {
                self.entries.remove(&evicted);
                evictions += 1;
            } else {
                break;
            }
        }
        evictions
    }

    /// Looks up `name`. `must_be_fresh` requests a miss on stale content
    /// rather than returning it.
    pub fn find(&mut self, name: &Name, must_be_fresh: bool) -> CacheResult {
        let Some(entry) = self.entries.get(name) else {
            return CacheResult::Miss;
        };
        if must_be_fresh && !entry.data.is_fresh_now() {
            return CacheResult::Miss;
        }
        let data = entry.data.clone();
        self.touch_remove(name);
        self.recency.push_back(name.clone());
        CacheResult::Hit(data)
    }

    fn touch_remove(&mut self, name: &Name) {
        if let Some(pos) = self.recency.iter().position(|n| n == name) {
            self.recency.remove(pos);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn data(uri: &str) -> Data {
        Data::new(Name::from_uri(uri).unwrap(), Bytes::from_static(b"x"))
    }

    #[test]
    fn insert_then_find_hits() {
        let mut cache = BoundedCache::new(2);
        cache.insert(data("/a"));
        match cache.find(&Name::from_uri("/a").unwrap(), false) {
            CacheResult::Hit(d) => assert_eq!(d.name, Name::from_uri("/a").unwrap()),
            CacheResult::Miss => panic!("expected hit"),
        }
    }

    #[test]
    fn eviction_drops_the_least_recently_used() {
        let mut cache = BoundedCache::new(1);
        cache.insert(data("/a"));
        cache.insert(data("/b"));
        assert!(matches!(
            cache.find(&Name::from_uri("/a").unwrap(), false),
            CacheResult::Miss
        ));
        assert!(matches!(
            cache.find(&Name::from_uri("/b").unwrap(), false),
            CacheResult::Hit(_)
        ));
    }

    #[test]
    fn zero_capacity_never_caches() {
        let mut cache = BoundedCache::new(0);
        cache.insert(data("/a"));
        assert!(cache.is_empty());
    }
}
