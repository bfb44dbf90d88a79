/// ResourceListenerManager - routes resource load/change events to listeners
///
/// Listeners (parameter tables) report the resources they depend on. Loaders
/// report events. Once per frame, before the core sync point, `update()`
/// refreshes the dependencies of listeners marked dirty and delivers each
/// queued event to each dependent listener exactly once.
///
/// Listener callbacks run without the manager lock, so a listener may call
/// back into the manager (for example to mark itself dirty).

use std::sync::{Mutex, Weak};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::resource::ResourceId;
use crate::utils::lock;
use crate::engine_trace;

new_key_type! {
    /// Registration handle of a listener
    pub struct ListenerKey;
}

/// Object that wants to know when resources it uses load or change
pub trait ResourceListener: Send + Sync {
    /// Append every resource the listener currently depends on
    fn listener_resources(&self, resources: &mut Vec<ResourceId>);

    /// A dependency finished loading
    fn notify_resource_loaded(&self, resource: ResourceId);

    /// A dependency's content changed
    fn notify_resource_changed(&self, resource: ResourceId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EventKind {
    Loaded,
    Changed,
}

struct ListenerEntry {
    listener: Weak<dyn ResourceListener>,
    resources: Vec<ResourceId>,
}

#[derive(Default)]
struct State {
    listeners: SlotMap<ListenerKey, ListenerEntry>,
    dirty: Vec<ListenerKey>,
    dirty_set: FxHashSet<ListenerKey>,
    dependents: FxHashMap<ResourceId, Vec<ListenerKey>>,
    events: Vec<(ResourceId, EventKind)>,
    event_set: FxHashSet<(ResourceId, EventKind)>,
}

impl State {
    fn mark_dirty(&mut self, key: ListenerKey) {
        if self.dirty_set.insert(key) {
            self.dirty.push(key);
        }
    }

    fn set_dependencies(&mut self, key: ListenerKey, resources: Vec<ResourceId>) {
        let Some(entry) = self.listeners.get_mut(key) else { return };
        let old = std::mem::replace(&mut entry.resources, resources.clone());
        for id in old {
            if let Some(keys) = self.dependents.get_mut(&id) {
                keys.retain(|k| *k != key);
                if keys.is_empty() {
                    self.dependents.remove(&id);
                }
            }
        }
        for id in resources {
            let keys = self.dependents.entry(id).or_default();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
    }

    fn remove_listener(&mut self, key: ListenerKey) {
        self.set_dependencies(key, Vec::new());
        self.listeners.remove(key);
        self.dirty_set.remove(&key);
        self.dirty.retain(|k| *k != key);
    }
}

/// Registry of resource listeners
#[derive(Default)]
pub struct ResourceListenerManager {
    state: Mutex<State>,
}

impl ResourceListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; its dependencies are queried at the next `update()`
    pub fn register_listener(&self, listener: Weak<dyn ResourceListener>) -> ListenerKey {
        let mut state = lock(&self.state);
        let key = state.listeners.insert(ListenerEntry { listener, resources: Vec::new() });
        state.mark_dirty(key);
        key
    }

    /// Forget a listener
    pub fn unregister_listener(&self, key: ListenerKey) {
        lock(&self.state).remove_listener(key);
    }

    /// Re-query the listener's dependencies at the next `update()`
    pub fn mark_listener_dirty(&self, key: ListenerKey) {
        let mut state = lock(&self.state);
        if state.listeners.contains_key(key) {
            state.mark_dirty(key);
        }
    }

    /// Queue a "loaded" event for `resource`
    pub fn notify_loaded(&self, resource: ResourceId) {
        let mut state = lock(&self.state);
        if state.event_set.insert((resource, EventKind::Loaded)) {
            state.events.push((resource, EventKind::Loaded));
        }
    }

    /// Queue a "changed" event for `resource`
    pub fn notify_changed(&self, resource: ResourceId) {
        let mut state = lock(&self.state);
        if state.event_set.insert((resource, EventKind::Changed)) {
            state.events.push((resource, EventKind::Changed));
        }
    }

    /// Refresh dependencies and deliver queued events
    pub fn update(&self) {
        // 1. Query dirty listeners without the lock
        let dirty: Vec<(ListenerKey, Weak<dyn ResourceListener>)> = {
            let mut state = lock(&self.state);
            let keys = std::mem::take(&mut state.dirty);
            state.dirty_set.clear();
            keys.into_iter()
                .filter_map(|key| state.listeners.get(key).map(|e| (key, e.listener.clone())))
                .collect()
        };
        let mut refreshed = Vec::with_capacity(dirty.len());
        let mut dead = Vec::new();
        for (key, weak) in dirty {
            match weak.upgrade() {
                Some(listener) => {
                    let mut resources = Vec::new();
                    listener.listener_resources(&mut resources);
                    resources.sort_unstable();
                    resources.dedup();
                    refreshed.push((key, resources));
                }
                None => dead.push(key),
            }
        }

        // 2. Apply dependencies, resolve events to listeners
        let deliveries: Vec<(Weak<dyn ResourceListener>, ResourceId, EventKind)> = {
            let mut state = lock(&self.state);
            for key in dead {
                state.remove_listener(key);
            }
            for (key, resources) in refreshed {
                state.set_dependencies(key, resources);
            }
            let events = std::mem::take(&mut state.events);
            state.event_set.clear();

            let mut deliveries = Vec::new();
            for (resource, kind) in events {
                let Some(keys) = state.dependents.get(&resource) else { continue };
                for key in keys {
                    if let Some(entry) = state.listeners.get(*key) {
                        deliveries.push((entry.listener.clone(), resource, kind));
                    }
                }
            }
            deliveries
        };

        if !deliveries.is_empty() {
            engine_trace!("lumen::ResourceListenerManager",
                "Delivering {} resource notifications", deliveries.len());
        }

        // 3. Notify without the lock
        for (weak, resource, kind) in deliveries {
            let Some(listener) = weak.upgrade() else { continue };
            match kind {
                EventKind::Loaded => listener.notify_resource_loaded(resource),
                EventKind::Changed => listener.notify_resource_changed(resource),
            }
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    /// Number of events waiting for `update()`
    pub fn pending_event_count(&self) -> usize {
        lock(&self.state).events.len()
    }

    /// Number of listeners currently depending on `resource`
    pub fn dependent_count(&self, resource: ResourceId) -> usize {
        lock(&self.state).dependents.get(&resource).map_or(0, Vec::len)
    }
}

#[cfg(test)]
#[path = "resource_listener_tests.rs"]
mod tests;
