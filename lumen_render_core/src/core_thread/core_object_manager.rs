/// CoreObjectManager - proxy-side bookkeeping and the per-frame sync point
///
/// Shared (`Arc`) by every proxy. Proxies register themselves, queue their core
/// object's creation, mark themselves dirty and queue their destruction from
/// any thread. `sync_to_core` turns one frame's worth of those requests into a
/// `CoreSyncPacket` and hands it to the render thread over a bounded channel.

use std::sync::{Arc, Mutex, Weak};
use rustc_hash::FxHashSet;
use slotmap::SlotMap;
use crate::config::RenderCoreConfig;
use crate::core_thread::{
    AsyncOp, CoreObject, CoreObjectId, CoreSyncSource, CoreThread, FrameAlloc, SyncBlob,
};
use crate::utils::lock;
use crate::{engine_debug, engine_trace, engine_warn};

/// Builds a core object on the render thread
pub type CoreObjectFactory = Box<dyn FnOnce() -> Box<dyn CoreObject> + Send>;

/// Arbitrary work run on the render thread after the frame's syncs
pub type CoreCommand = Box<dyn FnOnce(&mut CoreThread) + Send>;

/// One frame's immutable hand-off from proxies to the render thread
///
/// Applied in order: initializations, syncs, commands, destructions.
pub struct CoreSyncPacket {
    pub(crate) frame: u64,
    pub(crate) arena: FrameAlloc,
    pub(crate) inits: Vec<(CoreObjectId, &'static str, CoreObjectFactory)>,
    pub(crate) syncs: Vec<(CoreObjectId, SyncBlob)>,
    pub(crate) commands: Vec<CoreCommand>,
    pub(crate) destroys: Vec<CoreObjectId>,
}

impl CoreSyncPacket {
    /// Frame index of the sync point that produced the packet
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

// ===== INTERNAL STATE =====

struct ProxyEntry {
    source: Weak<dyn CoreSyncSource>,
    type_name: &'static str,
    dirty_flags: u32,
    initialize_queued: bool,
}

struct ManagerState {
    proxies: SlotMap<CoreObjectId, ProxyEntry>,
    init_queue: Vec<(CoreObjectId, &'static str, CoreObjectFactory)>,
    /// Dirty proxies in first-marked order
    dirty: Vec<CoreObjectId>,
    dirty_set: FxHashSet<CoreObjectId>,
    commands: Vec<CoreCommand>,
    destroy_queue: Vec<CoreObjectId>,
    next_frame: u64,
}

/// Proxy-side registry and sync point
pub struct CoreObjectManager {
    state: Mutex<ManagerState>,
    sender: flume::Sender<CoreSyncPacket>,
    receiver: Mutex<Option<flume::Receiver<CoreSyncPacket>>>,
    arena_capacity: usize,
}

impl CoreObjectManager {
    /// Create a manager whose channel holds `config.max_in_flight_frames` packets
    pub fn new(config: &RenderCoreConfig) -> Arc<Self> {
        let (sender, receiver) = flume::bounded(config.max_in_flight_frames.max(1) as usize);
        Arc::new(Self {
            state: Mutex::new(ManagerState {
                proxies: SlotMap::with_key(),
                init_queue: Vec::new(),
                dirty: Vec::new(),
                dirty_set: FxHashSet::default(),
                commands: Vec::new(),
                destroy_queue: Vec::new(),
                next_frame: 0,
            }),
            sender,
            receiver: Mutex::new(Some(receiver)),
            arena_capacity: config.frame_arena_capacity,
        })
    }

    /// Receiving end of the packet channel (handed out once)
    pub(crate) fn take_receiver(&self) -> Option<flume::Receiver<CoreSyncPacket>> {
        lock(&self.receiver).take()
    }

    // ===== PROXY API =====

    /// Register a proxy
    pub fn register(&self, source: Weak<dyn CoreSyncSource>, type_name: &'static str) -> CoreObjectId {
        lock(&self.state).proxies.insert(ProxyEntry {
            source,
            type_name,
            dirty_flags: 0,
            initialize_queued: false,
        })
    }

    /// Queue creation of the core object (at most once per proxy)
    pub fn queue_initialize(&self, id: CoreObjectId, factory: CoreObjectFactory) {
        let mut state = lock(&self.state);
        let Some(entry) = state.proxies.get_mut(id) else {
            engine_warn!("lumen::CoreObjectManager", "initialize on an unregistered core object");
            return;
        };
        if entry.initialize_queued {
            engine_warn!("lumen::CoreObjectManager",
                "{} initialized twice, ignoring", entry.type_name);
            return;
        }
        entry.initialize_queued = true;
        let type_name = entry.type_name;
        state.init_queue.push((id, type_name, factory));
    }

    /// OR `flags` into the proxy's dirty flags and queue it for the next sync
    ///
    /// A proxy marked several times in a frame is synced once, at the
    /// position it was first marked.
    pub fn mark_dirty(&self, id: CoreObjectId, flags: u32) {
        let mut state = lock(&self.state);
        let Some(entry) = state.proxies.get_mut(id) else { return };
        entry.dirty_flags |= flags;
        if state.dirty_set.insert(id) {
            state.dirty.push(id);
        }
    }

    /// Pending dirty flags of a proxy (0 once synced)
    pub fn dirty_flags(&self, id: CoreObjectId) -> u32 {
        lock(&self.state).proxies.get(id).map_or(0, |entry| entry.dirty_flags)
    }

    /// Unregister the proxy and queue destruction of its core object
    pub fn queue_destroy(&self, id: CoreObjectId) {
        let mut state = lock(&self.state);
        if let Some(entry) = state.proxies.remove(id) {
            if entry.initialize_queued {
                state.destroy_queue.push(id);
            }
        }
    }

    /// Run `command` on the render thread after the next sync
    pub fn queue_command<F>(&self, command: F)
    where
        F: FnOnce(&mut CoreThread) + Send + 'static,
    {
        lock(&self.state).commands.push(Box::new(command));
    }

    /// Run `command` on the render thread and get its result back
    pub fn queue_return_command<T, F>(&self, command: F) -> AsyncOp<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CoreThread) -> T + Send + 'static,
    {
        let op = AsyncOp::new();
        let completion = op.clone();
        self.queue_command(move |core| completion.complete(command(core)));
        op
    }

    // ===== SYNC POINT =====

    /// Ship this frame's requests to the render thread
    ///
    /// Drains the queues under the lock, then asks each dirty proxy for its
    /// snapshot with the lock released, so proxies may lock their own state.
    /// Blocks when `max_in_flight_frames` packets are already waiting.
    ///
    /// Returns the frame index of the packet.
    pub fn sync_to_core(&self) -> u64 {
        let (frame, inits, dirty, commands, destroys) = {
            let mut state = lock(&self.state);
            let frame = state.next_frame;
            state.next_frame += 1;

            let dirty_ids = std::mem::take(&mut state.dirty);
            state.dirty_set.clear();
            let mut dirty = Vec::with_capacity(dirty_ids.len());
            for id in dirty_ids {
                // No core object to receive a sync before initialize()
                if let Some(entry) = state.proxies.get_mut(id).filter(|e| e.initialize_queued) {
                    let flags = std::mem::take(&mut entry.dirty_flags);
                    dirty.push((id, entry.source.clone(), flags));
                }
            }

            (
                frame,
                std::mem::take(&mut state.init_queue),
                dirty,
                std::mem::take(&mut state.commands),
                std::mem::take(&mut state.destroy_queue),
            )
        };

        let mut arena = FrameAlloc::with_capacity(self.arena_capacity);
        let mut syncs = Vec::with_capacity(dirty.len());
        for (id, source, flags) in dirty {
            // Proxy dropped since it was marked: its destruction is queued
            let Some(source) = source.upgrade() else { continue };
            if let Some(blob) = source.sync_to_core(flags, &mut arena) {
                syncs.push((id, blob));
            }
        }

        engine_trace!("lumen::CoreObjectManager",
            "Frame {}: {} inits, {} syncs ({} bytes), {} commands, {} destroys",
            frame, inits.len(), syncs.len(), arena.len(), commands.len(), destroys.len());

        let packet = CoreSyncPacket { frame, arena, inits, syncs, commands, destroys };
        if self.sender.send(packet).is_err() {
            engine_debug!("lumen::CoreObjectManager",
                "Core thread gone, frame {} dropped", frame);
        }
        frame
    }

    // ===== QUERIES =====

    /// Number of registered proxies
    pub fn live_proxy_count(&self) -> usize {
        lock(&self.state).proxies.len()
    }

    /// Number of proxies waiting for the next sync
    pub fn pending_dirty_count(&self) -> usize {
        lock(&self.state).dirty.len()
    }

    /// Index the next sync point will use
    pub fn next_frame(&self) -> u64 {
        lock(&self.state).next_frame
    }
}

// ===== LINK =====

/// A proxy's handle on its core object
///
/// Embedded in every proxy. Dropping it queues the core object's destruction.
pub struct CoreObjectLink {
    id: CoreObjectId,
    manager: Arc<CoreObjectManager>,
}

impl CoreObjectLink {
    /// Register `source` (usually the proxy itself, from `Arc::new_cyclic`)
    pub fn new(
        manager: &Arc<CoreObjectManager>,
        source: Weak<dyn CoreSyncSource>,
        type_name: &'static str,
    ) -> Self {
        let id = manager.register(source, type_name);
        Self { id, manager: manager.clone() }
    }

    pub fn id(&self) -> CoreObjectId {
        self.id
    }

    pub fn manager(&self) -> &Arc<CoreObjectManager> {
        &self.manager
    }

    /// Queue creation of the core object and an initial sync
    pub fn initialize<F>(&self, factory: F)
    where
        F: FnOnce() -> Box<dyn CoreObject> + Send + 'static,
    {
        self.manager.queue_initialize(self.id, Box::new(factory));
        self.manager.mark_dirty(self.id, u32::MAX);
    }

    /// Mark state selected by `flags` as changed
    pub fn mark_core_dirty(&self, flags: u32) {
        self.manager.mark_dirty(self.id, flags);
    }

    /// Flags marked since the last sync
    pub fn core_dirty_flags(&self) -> u32 {
        self.manager.dirty_flags(self.id)
    }
}

impl Drop for CoreObjectLink {
    fn drop(&mut self) {
        self.manager.queue_destroy(self.id);
    }
}

#[cfg(test)]
#[path = "core_object_manager_tests.rs"]
mod tests;
