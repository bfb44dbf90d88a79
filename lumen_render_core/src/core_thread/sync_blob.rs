/// Sync blobs: the only data that crosses from proxies to core objects
///
/// Bytes are copied into a frame-scoped arena owned by the sync packet; shared
/// resources travel as value copies of `Arc` handles. Nothing in a blob points
/// into proxy memory.
///
/// Every blob carries the producer's type tag. The consumer states what it
/// expects (type and byte size) and a mismatch is a fatal programmer error:
/// it is logged at ERROR and panics.

use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use bytemuck::Pod;
use crate::device::{GpuBuffer, GpuTexture};
use crate::state::SamplerState;
use crate::engine_error;

// ===== FRAME ARENA =====

/// Frame-scoped byte arena
///
/// Filled by proxies during `CoreObjectManager::sync_to_core`, moved into the
/// frame's packet and released once the render thread has applied it.
#[derive(Debug, Default)]
pub struct FrameAlloc {
    bytes: Vec<u8>,
}

impl FrameAlloc {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { bytes: Vec::with_capacity(capacity) }
    }

    /// Copy `data` into the arena
    pub fn alloc_bytes(&mut self, data: &[u8]) -> Range<usize> {
        let start = self.bytes.len();
        self.bytes.extend_from_slice(data);
        start..self.bytes.len()
    }

    /// Copy a POD value into the arena
    pub fn alloc_pod<T: Pod>(&mut self, value: &T) -> Range<usize> {
        self.alloc_bytes(bytemuck::bytes_of(value))
    }

    /// Bytes used so far
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn slice(&self, range: &Range<usize>) -> &[u8] {
        self.bytes.get(range.clone()).unwrap_or(&[])
    }
}

// ===== RESOURCES =====

/// Shared handle carried next to a blob's bytes
#[derive(Clone)]
pub enum SyncResource {
    Empty,
    Texture(Arc<dyn GpuTexture>),
    Buffer(Arc<dyn GpuBuffer>),
    Sampler(Arc<SamplerState>),
    /// Any other shared value, recovered with `SyncResource::shared`
    Shared(Arc<dyn Any + Send + Sync>),
}

impl SyncResource {
    pub fn texture(&self) -> Option<&Arc<dyn GpuTexture>> {
        match self {
            SyncResource::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn buffer(&self) -> Option<&Arc<dyn GpuBuffer>> {
        match self {
            SyncResource::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    pub fn sampler(&self) -> Option<&Arc<SamplerState>> {
        match self {
            SyncResource::Sampler(sampler) => Some(sampler),
            _ => None,
        }
    }

    /// Downcast a `Shared` resource
    pub fn shared<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            SyncResource::Shared(value) => value.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SyncResource::Empty)
    }
}

impl fmt::Debug for SyncResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncResource::Empty => write!(f, "Empty"),
            SyncResource::Texture(texture) => write!(f, "Texture({:?})", texture),
            SyncResource::Buffer(buffer) => write!(f, "Buffer({:?})", buffer),
            SyncResource::Sampler(sampler) => write!(f, "Sampler({:?})", sampler),
            SyncResource::Shared(_) => write!(f, "Shared"),
        }
    }
}

// ===== BLOB =====

/// One proxy's snapshot for one frame
#[derive(Debug)]
pub struct SyncBlob {
    type_name: &'static str,
    type_id: TypeId,
    range: Range<usize>,
    resources: Vec<SyncResource>,
}

impl SyncBlob {
    /// Blob holding exactly one `T`
    pub fn from_pod<T: Pod>(alloc: &mut FrameAlloc, value: &T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            range: alloc.alloc_pod(value),
            resources: Vec::new(),
        }
    }

    /// Variable-length blob tagged with payload type `T`
    pub fn from_bytes<T: 'static>(alloc: &mut FrameAlloc, bytes: &[u8]) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            range: alloc.alloc_bytes(bytes),
            resources: Vec::new(),
        }
    }

    /// Attach shared handles
    pub fn with_resources(mut self, resources: Vec<SyncResource>) -> Self {
        self.resources = resources;
        self
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.range.len()
    }

    /// Producer's payload type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ===== CONSUMER VIEW =====

fn fatal_mismatch(message: String) -> ! {
    engine_error!("lumen::SyncData", "{}", message);
    panic!("{}", message);
}

/// Core-side view of a blob, valid for one `CoreObject::sync_to_core` call
#[derive(Clone, Copy)]
pub struct SyncData<'a> {
    blob: &'a SyncBlob,
    bytes: &'a [u8],
}

impl<'a> SyncData<'a> {
    pub(crate) fn new(blob: &'a SyncBlob, arena: &'a FrameAlloc) -> Self {
        Self { blob, bytes: arena.slice(&blob.range) }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn type_name(&self) -> &'static str {
        self.blob.type_name
    }

    /// True if the producer tagged the payload as `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.blob.type_id == TypeId::of::<T>()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn resources(&self) -> &'a [SyncResource] {
        &self.blob.resources
    }

    /// Read the payload as exactly one `T`
    ///
    /// # Panics
    ///
    /// If the payload is not tagged `T` or is not `size_of::<T>()` bytes.
    pub fn read_pod<T: Pod>(&self) -> T {
        self.check_type::<T>();
        let expected = std::mem::size_of::<T>();
        if self.bytes.len() != expected {
            fatal_mismatch(format!(
                "Sync blob size mismatch for {}: expected {} bytes, got {}",
                std::any::type_name::<T>(), expected, self.bytes.len()
            ));
        }
        bytemuck::pod_read_unaligned(self.bytes)
    }

    /// Variable-length payload tagged `T` whose size the consumer computed
    ///
    /// # Panics
    ///
    /// If the tag or the size does not match.
    pub fn expect_payload<T: 'static>(&self, expected_size: usize) -> SyncReader<'a> {
        self.check_type::<T>();
        self.expect_size(expected_size)
    }

    /// Reader over the payload, which must be `expected_size` bytes
    ///
    /// # Panics
    ///
    /// If the size does not match.
    pub fn expect_size(&self, expected_size: usize) -> SyncReader<'a> {
        if self.bytes.len() != expected_size {
            fatal_mismatch(format!(
                "Sync blob size mismatch for {}: expected {} bytes, got {}",
                self.blob.type_name, expected_size, self.bytes.len()
            ));
        }
        self.reader()
    }

    /// Unchecked reader over the payload
    pub fn reader(&self) -> SyncReader<'a> {
        SyncReader { bytes: self.bytes, pos: 0 }
    }

    fn check_type<T: 'static>(&self) {
        if !self.is::<T>() {
            fatal_mismatch(format!(
                "Sync blob type mismatch: produced as {}, consumed as {}",
                self.blob.type_name, std::any::type_name::<T>()
            ));
        }
    }
}

/// Sequential POD reader over a payload
pub struct SyncReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SyncReader<'a> {
    /// Read the next `T`
    ///
    /// # Panics
    ///
    /// On overrun (the payload is shorter than what the consumer reads).
    pub fn read<T: Pod>(&mut self) -> T {
        let size = std::mem::size_of::<T>();
        let Some(chunk) = self.bytes.get(self.pos..self.pos + size) else {
            fatal_mismatch(format!(
                "Sync blob overrun reading {} at offset {} of {}",
                std::any::type_name::<T>(), self.pos, self.bytes.len()
            ));
        };
        self.pos += size;
        bytemuck::pod_read_unaligned(chunk)
    }

    /// Read the next `count` values of `T`
    pub fn read_vec<T: Pod>(&mut self, count: usize) -> Vec<T> {
        (0..count).map(|_| self.read::<T>()).collect()
    }

    /// Next `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
        let Some(chunk) = self.bytes.get(self.pos..self.pos + len) else {
            fatal_mismatch(format!(
                "Sync blob overrun reading {} bytes at offset {} of {}",
                len, self.pos, self.bytes.len()
            ));
        };
        self.pos += len;
        chunk
    }

    /// Bytes not read yet
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

#[cfg(test)]
#[path = "sync_blob_tests.rs"]
mod tests;
