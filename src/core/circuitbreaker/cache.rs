use super::ResourceCircuitState;
use crate::base::{Level, Resource, ServiceKey};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// `CounterValue` is what the cache knows about a resource.
#[derive(Debug, Clone)]
pub enum CounterValue {
    /// no rule applies to the resource
    NotConfigured,
    Tracking(Arc<ResourceCircuitState>),
}

impl CounterValue {
    pub fn state(&self) -> Option<&Arc<ResourceCircuitState>> {
        match self {
            CounterValue::Tracking(state) => Some(state),
            CounterValue::NotConfigured => None,
        }
    }

    fn destroy(&self) {
        if let CounterValue::Tracking(state) = self {
            state.destroy();
        }
    }
}

#[derive(Debug)]
pub struct CacheEntry {
    value: CounterValue,
    last_access_ms: AtomicU64,
}

impl CacheEntry {
    fn new(value: CounterValue, now: u64) -> Self {
        CacheEntry {
            value,
            last_access_ms: AtomicU64::new(now),
        }
    }

    pub fn value(&self) -> &CounterValue {
        &self.value
    }

    pub fn last_access_ms(&self) -> u64 {
        self.last_access_ms.load(Ordering::SeqCst)
    }

    #[inline]
    fn touch(&self, now: u64) {
        self.last_access_ms.fetch_max(now, Ordering::SeqCst);
    }
}

/// `ResourceStateCache` keeps the circuit states, one map per resource level.
/// Entries are sharded, no lock is shared by unrelated resources.
#[derive(Debug, Default)]
pub struct ResourceStateCache {
    services: DashMap<Resource, CacheEntry>,
    methods: DashMap<Resource, CacheEntry>,
    instances: DashMap<Resource, CacheEntry>,
}

impl ResourceStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn level_map(&self, level: Level) -> &DashMap<Resource, CacheEntry> {
        match level {
            Level::Service => &self.services,
            Level::Method => &self.methods,
            Level::Instance => &self.instances,
        }
    }

    /// `get_or_create` returns the cached value of the resource and touches it.
    /// On a miss, `factory` builds the value while the entry is reserved,
    /// so concurrent callers share a single state.
    pub fn get_or_create<F>(&self, resource: &Resource, now: u64, factory: F) -> CounterValue
    where
        F: FnOnce() -> CounterValue,
    {
        let map = self.level_map(resource.level());
        if let Some(entry) = map.get(resource) {
            entry.touch(now);
            return entry.value.clone();
        }
        match map.entry(resource.clone()) {
            Entry::Occupied(entry) => {
                entry.get().touch(now);
                entry.get().value.clone()
            }
            Entry::Vacant(entry) => {
                let value = factory();
                entry.insert(CacheEntry::new(value.clone(), now));
                value
            }
        }
    }

    /// `get` returns the cached value of the resource, it never inserts nor touches.
    pub fn get(&self, resource: &Resource) -> Option<CounterValue> {
        self.level_map(resource.level())
            .get(resource)
            .map(|entry| entry.value.clone())
    }

    /// `remove_service` removes and destroys all the entries of the destination service.
    pub fn remove_service(&self, service: &ServiceKey) -> usize {
        let mut removed = 0;
        for level in Level::ALL.iter() {
            self.level_map(*level).retain(|resource, entry| {
                if resource.service_key() == service {
                    entry.value.destroy();
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    /// `cleanup_expired_with_time` removes and destroys the entries idle for longer than `ttl_ms`.
    pub fn cleanup_expired_with_time(&self, now: u64, ttl_ms: u64) -> usize {
        let mut removed = 0;
        for level in Level::ALL.iter() {
            self.level_map(*level).retain(|_, entry| {
                if now.saturating_sub(entry.last_access_ms()) > ttl_ms {
                    entry.value.destroy();
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        removed
    }

    pub fn len(&self) -> usize {
        Level::ALL.iter().map(|level| self.len_of(*level)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len_of(&self, level: Level) -> usize {
        self.level_map(level).len()
    }

    /// `states` returns a snapshot of the tracked circuit states.
    pub fn states(&self) -> Vec<Arc<ResourceCircuitState>> {
        let mut states = Vec::with_capacity(self.len());
        for level in Level::ALL.iter() {
            for entry in self.level_map(*level).iter() {
                if let CounterValue::Tracking(state) = &entry.value {
                    states.push(Arc::clone(state));
                }
            }
        }
        states
    }

    /// `clear` destroys and removes every entry.
    pub fn clear(&self) {
        for level in Level::ALL.iter() {
            self.level_map(*level).retain(|_, entry| {
                entry.value.destroy();
                false
            });
        }
    }
}
