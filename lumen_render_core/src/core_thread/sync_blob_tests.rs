//! Unit tests for sync_blob.rs

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::core_thread::{FrameAlloc, SyncBlob, SyncData, SyncResource};
use crate::device::mock_render_backend::MockTexture;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Header {
    count: u32,
    flags: u32,
}

#[test]
fn test_pod_round_trip_through_arena() {
    let mut arena = FrameAlloc::with_capacity(64);
    let first = SyncBlob::from_pod(&mut arena, &7u32);
    let second = SyncBlob::from_pod(&mut arena, &Header { count: 2, flags: 1 });
    assert_eq!(arena.len(), 12);
    assert_eq!(second.size(), 8);

    assert_eq!(SyncData::new(&first, &arena).read_pod::<u32>(), 7);
    let data = SyncData::new(&second, &arena);
    assert!(data.is::<Header>());
    assert_eq!(data.read_pod::<Header>(), Header { count: 2, flags: 1 });
}

#[test]
fn test_variable_payload_reader() {
    let mut arena = FrameAlloc::default();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(bytemuck::bytes_of(&Header { count: 2, flags: 0 }));
    bytes.extend_from_slice(bytemuck::cast_slice(&[10u32, 20u32]));
    let blob = SyncBlob::from_bytes::<Header>(&mut arena, &bytes);

    let data = SyncData::new(&blob, &arena);
    let mut reader = data.expect_payload::<Header>(16);
    let header = reader.read::<Header>();
    assert_eq!(reader.read_vec::<u32>(header.count as usize), vec![10, 20]);
    assert_eq!(reader.remaining(), 0);
}

#[test]
fn test_resources_are_shared_handles() {
    let mut arena = FrameAlloc::default();
    let texture = Arc::new(MockTexture::new("albedo", 4, 4));
    let blob = SyncBlob::from_pod(&mut arena, &0u32).with_resources(vec![
        SyncResource::Texture(texture.clone()),
        SyncResource::Empty,
        SyncResource::Shared(Arc::new(5u64)),
    ]);

    let data = SyncData::new(&blob, &arena);
    let resources = data.resources();
    assert_eq!(resources[0].texture().unwrap().info().width, 4);
    assert!(resources[1].is_empty());
    assert_eq!(*resources[2].shared::<u64>().unwrap(), 5);
    assert!(resources[2].shared::<u32>().is_none());
    assert!(resources[0].buffer().is_none());
}

#[test]
#[should_panic(expected = "size mismatch")]
fn test_size_mismatch_is_fatal() {
    let mut arena = FrameAlloc::default();
    let blob = SyncBlob::from_bytes::<Header>(&mut arena, &[0u8; 12]);
    SyncData::new(&blob, &arena).read_pod::<Header>();
}

#[test]
#[should_panic(expected = "type mismatch")]
fn test_type_mismatch_is_fatal() {
    let mut arena = FrameAlloc::default();
    let blob = SyncBlob::from_pod(&mut arena, &[1u32, 2u32]);
    SyncData::new(&blob, &arena).read_pod::<Header>();
}

#[test]
#[should_panic(expected = "overrun")]
fn test_reader_overrun_is_fatal() {
    let mut arena = FrameAlloc::default();
    let blob = SyncBlob::from_bytes::<Header>(&mut arena, &[0u8; 4]);
    let mut reader = SyncData::new(&blob, &arena).reader();
    reader.read::<u64>();
}
