use super::bonds::graph::BondGraph;
use super::config::ModelConfig;
use crate::core::collections::sorted::SortedSet;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Identifies an intra-unit bond computation: the atom set plus the operator key that
/// index-pair bonds may be restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BondCacheKey {
    pub elements: SortedSet,
    pub operator_key: Option<i32>,
}

/// Bounded first-in-first-out cache of intra-unit bond graphs.
#[derive(Debug)]
pub struct BondCache {
    capacity: usize,
    inner: Mutex<BondCacheInner>,
}

#[derive(Debug, Default)]
struct BondCacheInner {
    entries: HashMap<BondCacheKey, Arc<BondGraph>>,
    order: VecDeque<BondCacheKey>,
}

impl BondCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(BondCacheInner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &BondCacheKey) -> Option<Arc<BondGraph>> {
        let inner = self.inner.lock().ok()?;
        inner.entries.get(key).cloned()
    }

    /// Returns the cached graph for `key`, computing and inserting it on a miss.
    ///
    /// `compute` runs without the lock held; if two callers race on the same key the first
    /// inserted graph wins.
    pub fn get_or_insert_with(
        &self,
        key: BondCacheKey,
        compute: impl FnOnce() -> BondGraph,
    ) -> Arc<BondGraph> {
        if let Some(hit) = self.get(&key) {
            trace!(elements = key.elements.len(), "Bond cache hit.");
            return hit;
        }
        let graph = Arc::new(compute());
        let Ok(mut inner) = self.inner.lock() else {
            return graph;
        };
        if let Some(existing) = inner.entries.get(&key) {
            return existing.clone();
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, graph.clone());
        graph
    }
}

/// State shared by every unit built from one model: its configuration and bond cache.
#[derive(Debug)]
pub struct ModelCaches {
    pub config: ModelConfig,
    pub bonds: BondCache,
}

impl ModelCaches {
    pub fn new(config: ModelConfig) -> Arc<Self> {
        let bonds = BondCache::new(config.cache.bond_cache_capacity);
        Arc::new(Self { config, bonds })
    }
}
