//! Object Processor cache: holds higher-bitrate variants long enough for
//! the variant deriver to synthesize lower-bitrate children from them.

use udcn_common::ndn::{Data, Name};

use crate::cache::{BoundedCache, CacheResult};

pub struct ObjectProcessor {
    cache: BoundedCache,
}

impl ObjectProcessor {
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: BoundedCache::new(max_size),
        }
    }

    pub fn insert(&mut self, data: Data) -> usize {
        self.cache.insert(data)
    }

    /// Looks up a candidate parent by its exact name. The deriver tries
    /// parents in ladder order and this is consulted once per candidate.
    pub fn find(&mut self, name: &Name) -> CacheResult {
        self.cache.find(name, false)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
