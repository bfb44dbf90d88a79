//! Unit tests for core_object_manager.rs
//!
//! Packets are read straight from the channel, no CoreThread involved.

use std::any::Any;
use std::sync::{Arc, Mutex, Weak};
use crate::config::RenderCoreConfig;
use crate::core_thread::{
    CoreContext, CoreObject, CoreObjectLink, CoreObjectManager, CoreSyncPacket, CoreSyncSource,
    FrameAlloc, SyncBlob, SyncData,
};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct NullCore;

impl CoreObject for NullCore {
    fn sync_to_core(&mut self, _data: SyncData<'_>, _ctx: &CoreContext) {}
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Proxy {
    link: CoreObjectLink,
    tag: u32,
    last_flags: Mutex<u32>,
}

impl Proxy {
    fn new(manager: &Arc<CoreObjectManager>, tag: u32) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Proxy>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            Proxy {
                link: CoreObjectLink::new(manager, source, "Proxy"),
                tag,
                last_flags: Mutex::new(0),
            }
        })
    }

    fn initialized(manager: &Arc<CoreObjectManager>, tag: u32) -> Arc<Self> {
        let proxy = Self::new(manager, tag);
        proxy.link.initialize(|| Box::new(NullCore));
        proxy
    }
}

impl CoreSyncSource for Proxy {
    fn sync_to_core(&self, dirty_flags: u32, alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        *self.last_flags.lock().unwrap() = dirty_flags;
        Some(SyncBlob::from_pod(alloc, &self.tag))
    }
}

fn setup() -> (Arc<CoreObjectManager>, flume::Receiver<CoreSyncPacket>) {
    let config = RenderCoreConfig::default().with_max_in_flight_frames(4);
    let manager = CoreObjectManager::new(&config);
    let receiver = manager.take_receiver().unwrap();
    (manager, receiver)
}

fn synced_tags(packet: &CoreSyncPacket) -> Vec<u32> {
    packet
        .syncs
        .iter()
        .map(|(_, blob)| SyncData::new(blob, &packet.arena).read_pod::<u32>())
        .collect()
}

// ============================================================================
// REGISTRATION AND INITIALIZATION
// ============================================================================

#[test]
fn test_receiver_is_handed_out_once() {
    let (manager, _receiver) = setup();
    assert!(manager.take_receiver().is_none());
}

#[test]
fn test_initialize_queues_factory_and_initial_sync() {
    let (manager, receiver) = setup();
    let proxy = Proxy::initialized(&manager, 5);
    assert_eq!(manager.live_proxy_count(), 1);
    assert_eq!(proxy.link.core_dirty_flags(), u32::MAX);

    assert_eq!(manager.sync_to_core(), 0);
    let packet = receiver.try_recv().unwrap();
    assert_eq!(packet.frame(), 0);
    assert_eq!(packet.inits.len(), 1);
    assert_eq!(packet.inits[0].0, proxy.link.id());
    assert_eq!(synced_tags(&packet), vec![5]);
    assert_eq!(proxy.link.core_dirty_flags(), 0);
}

#[test]
fn test_double_initialize_is_ignored() {
    let (manager, receiver) = setup();
    let proxy = Proxy::initialized(&manager, 1);
    proxy.link.initialize(|| Box::new(NullCore));

    manager.sync_to_core();
    assert_eq!(receiver.try_recv().unwrap().inits.len(), 1);
}

#[test]
fn test_uninitialized_proxy_is_not_synced() {
    let (manager, receiver) = setup();
    let proxy = Proxy::new(&manager, 9);
    proxy.link.mark_core_dirty(1);

    manager.sync_to_core();
    let packet = receiver.try_recv().unwrap();
    assert!(packet.syncs.is_empty());

    drop(proxy);
    manager.sync_to_core();
    // Never initialized: nothing to destroy on the core side
    assert!(receiver.try_recv().unwrap().destroys.is_empty());
}

// ============================================================================
// DIRTY LIST
// ============================================================================

#[test]
fn test_dirty_order_is_first_marked_order() {
    let (manager, receiver) = setup();
    let a = Proxy::initialized(&manager, 1);
    let b = Proxy::initialized(&manager, 2);
    let c = Proxy::initialized(&manager, 3);
    manager.sync_to_core();
    receiver.try_recv().unwrap();

    b.link.mark_core_dirty(1);
    a.link.mark_core_dirty(1);
    c.link.mark_core_dirty(1);
    b.link.mark_core_dirty(2);
    assert_eq!(manager.pending_dirty_count(), 3);

    manager.sync_to_core();
    let packet = receiver.try_recv().unwrap();
    assert_eq!(synced_tags(&packet), vec![2, 1, 3]);
    assert_eq!(*b.last_flags.lock().unwrap(), 3);
    assert_eq!(manager.pending_dirty_count(), 0);
}

#[test]
fn test_clean_frame_sends_empty_packet() {
    let (manager, receiver) = setup();
    let _proxy = Proxy::initialized(&manager, 1);
    manager.sync_to_core();
    receiver.try_recv().unwrap();

    assert_eq!(manager.sync_to_core(), 1);
    let packet = receiver.try_recv().unwrap();
    assert!(packet.syncs.is_empty());
    assert!(packet.inits.is_empty());
    assert!(packet.arena.is_empty());
}

// ============================================================================
// DESTRUCTION AND COMMANDS
// ============================================================================

#[test]
fn test_drop_queues_destroy_and_skips_pending_sync() {
    let (manager, receiver) = setup();
    let proxy = Proxy::initialized(&manager, 4);
    let id = proxy.link.id();
    drop(proxy);
    assert_eq!(manager.live_proxy_count(), 0);

    manager.sync_to_core();
    let packet = receiver.try_recv().unwrap();
    assert_eq!(packet.inits.len(), 1);
    assert!(packet.syncs.is_empty());
    assert_eq!(packet.destroys, vec![id]);
}

#[test]
fn test_commands_travel_with_packet() {
    let (manager, receiver) = setup();
    manager.queue_command(|_core| {});
    let op = manager.queue_return_command(|_core| 42u32);
    assert!(!op.has_completed());

    manager.sync_to_core();
    assert_eq!(receiver.try_recv().unwrap().commands.len(), 2);
}

#[test]
fn test_frame_indices_increase() {
    let (manager, receiver) = setup();
    assert_eq!(manager.next_frame(), 0);
    manager.sync_to_core();
    manager.sync_to_core();
    assert_eq!(manager.next_frame(), 2);
    assert_eq!(receiver.try_recv().unwrap().frame(), 0);
    assert_eq!(receiver.try_recv().unwrap().frame(), 1);
}
