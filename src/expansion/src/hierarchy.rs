//! Group chain resolution with caching
//!
//! Probing walks a role's group and its ancestors once per probed entry, and
//! the same few groups come up over and over. The resolver memoizes each
//! chain so the walk happens once per group per expansion run.

use aclx_core::{Group, GroupId, SecurityModel};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Chain cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that walked the model
    pub misses: usize,
    /// Cached chains
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Resolves and caches `group → [group, parent, grandparent, ...]`
pub struct GroupChainResolver<'m> {
    model: &'m SecurityModel,
    cache: DashMap<GroupId, Arc<Vec<&'m Group>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<'m> GroupChainResolver<'m> {
    pub fn new(model: &'m SecurityModel) -> Self {
        Self {
            model,
            cache: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// The group and its ancestors, closest first
    pub fn chain(&self, group: &str) -> Arc<Vec<&'m Group>> {
        if let Some(chain) = self.cache.get(group) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(chain.value());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let chain = Arc::new(self.model.group_chain(group));
        self.cache.insert(group.to_string(), Arc::clone(&chain));
        chain
    }

    /// Closest ancestor-or-self of `group` having `group_type`
    pub fn first_with_type(&self, group: &str, group_type: &str) -> Option<&'m Group> {
        self.chain(group)
            .iter()
            .copied()
            .find(|g| g.group_type.as_deref() == Some(group_type))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
