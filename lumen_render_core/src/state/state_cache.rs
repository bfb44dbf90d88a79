/// StateCache - content-addressed cache of immutable render states
///
/// Equal descriptors resolve to one shared `CachedState` (same backend object,
/// same dense id). The cache only keeps weak references: the state is destroyed
/// with its last strong handle, and its `Drop` removes the cache entry.
///
/// Entries live in a `SlotMap` so every `CachedState` carries a generation
/// counted key. Removal on drop checks both the key generation and the stored
/// object identity, so a drop racing an insert of an equal descriptor never
/// erases the newer entry.
///
/// No backend call happens under the cache mutex: on a miss the lock is
/// released while the factory runs, then re-acquired and the bucket re-checked.

use std::fmt;
use std::ptr;
use std::sync::{Arc, Mutex, Weak};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::device::BackendStateObject;
use crate::error::{Error, Result};
use crate::state::descriptor::{
    BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc,
};
use crate::state::descriptor_hash::StateDescriptor;
use crate::utils::lock;
use crate::{engine_debug, engine_trace, engine_warn};

new_key_type! {
    /// Stable key of a cache entry
    pub struct StateKey;
}

/// Cached blend state
pub type BlendState = CachedState<BlendStateDesc>;
/// Cached rasterizer state
pub type RasterizerState = CachedState<RasterizerStateDesc>;
/// Cached depth-stencil state
pub type DepthStencilState = CachedState<DepthStencilStateDesc>;
/// Cached sampler state
pub type SamplerState = CachedState<SamplerStateDesc>;

// ===== ENTRIES =====

struct Entry<D: StateDescriptor> {
    canonical: Box<[u8]>,
    hash: u64,
    object: Weak<CachedState<D>>,
}

struct Inner<D: StateDescriptor> {
    slots: SlotMap<StateKey, Entry<D>>,
    /// Content hash -> entries with that hash (collisions compared byte-wise)
    buckets: FxHashMap<u64, Vec<StateKey>>,
    next_id: u32,
    stats: StateCacheStats,
}

impl<D: StateDescriptor> Inner<D> {
    /// Live entry matching `canonical`, dropping stale entries met on the way
    fn find_live(&mut self, hash: u64, canonical: &[u8]) -> Option<Arc<CachedState<D>>> {
        let keys = self.buckets.get(&hash)?.clone();
        for key in keys {
            let Some(entry) = self.slots.get(key) else { continue };
            if &*entry.canonical != canonical {
                continue;
            }
            match entry.object.upgrade() {
                Some(object) => return Some(object),
                None => {
                    // Last handle dropped, its Drop has not reached the lock yet
                    self.remove_entry(key);
                }
            }
        }
        None
    }

    fn remove_entry(&mut self, key: StateKey) {
        if let Some(entry) = self.slots.remove(key) {
            if let Some(bucket) = self.buckets.get_mut(&entry.hash) {
                bucket.retain(|k| *k != key);
                if bucket.is_empty() {
                    self.buckets.remove(&entry.hash);
                }
            }
            self.stats.evictions += 1;
        }
    }

    fn live_count(&self) -> usize {
        self.slots.values().filter(|e| e.object.strong_count() > 0).count()
    }
}

struct Shared<D: StateDescriptor> {
    inner: Mutex<Inner<D>>,
    max_ids: u32,
}

// ===== CACHED STATE =====

/// An immutable cached render state
///
/// Shared by every caller that asked for an equal descriptor. Has no mutators.
pub struct CachedState<D: StateDescriptor> {
    desc: D,
    id: u32,
    hash: u64,
    backend: Arc<dyn BackendStateObject>,
    key: StateKey,
    cache: Weak<Shared<D>>,
}

impl<D: StateDescriptor> CachedState<D> {
    /// Descriptor this state was created from
    pub fn desc(&self) -> &D {
        &self.desc
    }

    /// Dense id, unique among live states of this category
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Content hash of the descriptor
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Opaque backend handle
    pub fn backend_object(&self) -> &Arc<dyn BackendStateObject> {
        &self.backend
    }
}

impl<D: StateDescriptor> fmt::Debug for CachedState<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedState")
            .field("kind", &D::KIND)
            .field("id", &self.id)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .finish()
    }
}

impl<D: StateDescriptor> Drop for CachedState<D> {
    fn drop(&mut self) {
        let Some(shared) = self.cache.upgrade() else { return };
        let mut inner = lock(&shared.inner);
        let is_ours = inner
            .slots
            .get(self.key)
            .is_some_and(|entry| ptr::eq(entry.object.as_ptr(), self as *const Self));
        if is_ours {
            inner.remove_entry(self.key);
            engine_trace!("lumen::StateCache",
                "Evicted {} state id {}", D::KIND.name(), self.id);
        }
    }
}

// ===== STATISTICS =====

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries whose object is still alive
    pub live: usize,
}

// ===== CACHE =====

/// Content-addressed cache for one state category
pub struct StateCache<D: StateDescriptor> {
    shared: Arc<Shared<D>>,
}

impl<D: StateDescriptor> StateCache<D> {
    /// Create an empty cache handing out at most `max_ids` dense ids
    pub fn new(max_ids: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    slots: SlotMap::with_key(),
                    buckets: FxHashMap::default(),
                    next_id: 0,
                    stats: StateCacheStats::default(),
                }),
                max_ids,
            }),
        }
    }

    /// Return the shared state for `desc`, creating it through `create` on a miss
    ///
    /// `create` receives the descriptor and the dense id reserved for it. It runs
    /// without the cache lock held.
    ///
    /// # Errors
    ///
    /// - `Error::StateIdsExhausted` if every dense id is in use
    /// - any error returned by `create`
    pub fn get_or_create<F>(&self, desc: &D, create: F) -> Result<Arc<CachedState<D>>>
    where
        F: FnOnce(&D, u32) -> Result<Arc<dyn BackendStateObject>>,
    {
        let canonical = desc.canonical_bytes();
        let hash = crate::state::descriptor_hash::hash_canonical(&canonical);

        // 1. Lookup, reserve an id on a miss
        let id = {
            let mut inner = lock(&self.shared.inner);
            if let Some(existing) = inner.find_live(hash, &canonical) {
                inner.stats.hits += 1;
                return Ok(existing);
            }
            inner.stats.misses += 1;
            if inner.next_id >= self.shared.max_ids {
                engine_warn!("lumen::StateCache",
                    "No dense id left for {} states ({} in use)",
                    D::KIND.name(), self.shared.max_ids);
                return Err(Error::StateIdsExhausted {
                    kind: D::KIND.name(),
                    max: self.shared.max_ids,
                });
            }
            let id = inner.next_id;
            inner.next_id += 1;
            id
        };

        // 2. Create the backend object without the lock
        let created = create(desc, id);

        // 3. Insert, unless an equal descriptor won the race
        let mut inner = lock(&self.shared.inner);
        let backend = match created {
            Ok(backend) => backend,
            Err(err) => {
                inner.release_reserved_id(id);
                return Err(err);
            }
        };
        if let Some(winner) = inner.find_live(hash, &canonical) {
            inner.release_reserved_id(id);
            return Ok(winner);
        }

        let key = inner.slots.insert(Entry {
            canonical: canonical.into_boxed_slice(),
            hash,
            object: Weak::new(),
        });
        inner.buckets.entry(hash).or_default().push(key);

        let state = Arc::new(CachedState {
            desc: desc.clone(),
            id,
            hash,
            backend,
            key,
            cache: Arc::downgrade(&self.shared),
        });
        if let Some(entry) = inner.slots.get_mut(key) {
            entry.object = Arc::downgrade(&state);
        }
        engine_debug!("lumen::StateCache",
            "Created {} state id {} (hash {:#018x})", D::KIND.name(), id, hash);
        Ok(state)
    }

    /// Live state for `desc`, without creating one
    pub fn find(&self, desc: &D) -> Option<Arc<CachedState<D>>> {
        let canonical = desc.canonical_bytes();
        let hash = crate::state::descriptor_hash::hash_canonical(&canonical);
        lock(&self.shared.inner).find_live(hash, &canonical)
    }

    /// Drop every entry
    ///
    /// States still held elsewhere stay valid but are no longer found by
    /// lookups. The dense id counter restarts at 0 only when no state of this
    /// category is alive.
    pub fn clear(&self) {
        let mut inner = lock(&self.shared.inner);
        let outstanding = inner.live_count();
        inner.slots.clear();
        inner.buckets.clear();
        if outstanding == 0 {
            inner.next_id = 0;
        } else {
            engine_debug!("lumen::StateCache",
                "Cleared {} cache with {} states outstanding, ids not reset",
                D::KIND.name(), outstanding);
        }
    }

    /// Counters and live entry count
    pub fn stats(&self) -> StateCacheStats {
        let inner = lock(&self.shared.inner);
        StateCacheStats { live: inner.live_count(), ..inner.stats }
    }

    /// Number of entries (live or awaiting removal)
    pub fn len(&self) -> usize {
        lock(&self.shared.inner).slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next dense id the cache would hand out
    pub fn next_id(&self) -> u32 {
        lock(&self.shared.inner).next_id
    }

    /// Maximum number of dense ids
    pub fn max_ids(&self) -> u32 {
        self.shared.max_ids
    }
}

impl<D: StateDescriptor> Inner<D> {
    /// Give back an id reserved by a miss that did not insert
    ///
    /// Only the most recent reservation can be returned; anything else is
    /// simply never reused.
    fn release_reserved_id(&mut self, id: u32) {
        if self.next_id == id + 1 {
            self.next_id = id;
        }
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
