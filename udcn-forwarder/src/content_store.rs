//! Content Store: caches Data keyed by its own name for direct Interest
//! satisfaction, independent of the Object Processor's derivation cache.

use udcn_common::ndn::{Data, Interest};

use crate::cache::{BoundedCache, CacheResult};

pub struct ContentStore {
    cache: BoundedCache,
}

impl ContentStore {
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: BoundedCache::new(max_size),
        }
    }

    pub fn insert(&mut self, data: Data) -> usize {
        self.cache.insert(data)
    }

    pub fn find(&mut self, interest: &Interest) -> CacheResult {
        self.cache.find(&interest.name, interest.must_be_fresh)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
