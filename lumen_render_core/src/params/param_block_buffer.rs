/// GpuParamBlockBuffer - CPU cache of a param block and its GPU buffer
///
/// Writes land in the proxy's byte cache and mark the block dirty; at the next
/// sync point the whole cache is copied into the frame arena and uploaded to
/// the uniform buffer the core object created on initialization.

use std::any::Any;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use crate::context::RenderContext;
use crate::core_thread::{
    CoreContext, CoreObject, CoreObjectId, CoreObjectLink, CoreSyncSource, FrameAlloc, SyncBlob,
    SyncData,
};
use crate::device::{BufferDesc, BufferUsage, GpuBuffer};
use crate::error::{Error, Result};
use crate::utils::lock;
use crate::{engine_debug, engine_error};

/// Payload tag of param block syncs
struct ParamBlockBytes;

/// Backend buffer of a param block, filled in on the render thread
pub(crate) type GpuBufferCell = Arc<OnceLock<Arc<dyn GpuBuffer>>>;

// ===== PROXY =====

/// Param block proxy
pub struct GpuParamBlockBuffer {
    name: String,
    size: u32,
    data: Mutex<Vec<u8>>,
    gpu_buffer: GpuBufferCell,
    link: CoreObjectLink,
}

impl GpuParamBlockBuffer {
    /// Zero-filled block of `size` bytes
    pub fn new(name: &str, size: u32, context: &RenderContext) -> Arc<Self> {
        let gpu_buffer: GpuBufferCell = Arc::new(OnceLock::new());
        let block = Arc::new_cyclic(|weak: &Weak<GpuParamBlockBuffer>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            GpuParamBlockBuffer {
                name: name.to_string(),
                size,
                data: Mutex::new(vec![0; size as usize]),
                gpu_buffer: gpu_buffer.clone(),
                link: CoreObjectLink::new(context.core_objects(), source, "GpuParamBlockBuffer"),
            }
        });
        let name = name.to_string();
        block.link.initialize(move || Box::new(GpuParamBlockBufferCore { name, size, gpu_buffer }));
        block
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn core_id(&self) -> CoreObjectId {
        self.link.id()
    }

    /// Copy `bytes` at `offset`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidParameter` if the range exceeds the block.
    pub fn write(&self, offset: u32, bytes: &[u8]) -> Result<()> {
        let range = self.range(offset, bytes.len())?;
        lock(&self.data)[range].copy_from_slice(bytes);
        self.link.mark_core_dirty(1);
        Ok(())
    }

    /// Copy `out.len()` bytes starting at `offset` into `out`
    pub fn read(&self, offset: u32, out: &mut [u8]) -> Result<()> {
        let range = self.range(offset, out.len())?;
        out.copy_from_slice(&lock(&self.data)[range]);
        Ok(())
    }

    /// Fill the block with zeros
    pub fn zero_out(&self) {
        lock(&self.data).fill(0);
        self.link.mark_core_dirty(1);
    }

    /// Snapshot of the CPU cache
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.data).clone()
    }

    /// Backend buffer, once the render thread created it
    pub fn gpu_buffer(&self) -> Option<Arc<dyn GpuBuffer>> {
        self.gpu_buffer.get().cloned()
    }

    pub(crate) fn gpu_buffer_cell(&self) -> GpuBufferCell {
        self.gpu_buffer.clone()
    }

    fn range(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>> {
        let start = offset as usize;
        let end = start + len;
        if end > self.size as usize {
            return Err(Error::InvalidParameter(format!(
                "param block '{}': {} bytes at offset {} exceed its {} bytes",
                self.name, len, offset, self.size
            )));
        }
        Ok(start..end)
    }
}

impl CoreSyncSource for GpuParamBlockBuffer {
    fn sync_to_core(&self, _dirty_flags: u32, alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        Some(SyncBlob::from_bytes::<ParamBlockBytes>(alloc, &lock(&self.data)))
    }
}

impl std::fmt::Debug for GpuParamBlockBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuParamBlockBuffer")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

// ===== CORE =====

/// Render-thread half of a param block
pub struct GpuParamBlockBufferCore {
    name: String,
    size: u32,
    gpu_buffer: GpuBufferCell,
}

impl GpuParamBlockBufferCore {
    pub fn gpu_buffer(&self) -> Option<&Arc<dyn GpuBuffer>> {
        self.gpu_buffer.get()
    }
}

impl CoreObject for GpuParamBlockBufferCore {
    fn initialize(&mut self, ctx: &CoreContext) -> Result<()> {
        let buffer = lock(ctx.backend()).create_buffer(&BufferDesc {
            name: self.name.clone(),
            size: self.size as u64,
            usage: BufferUsage::Uniform,
        })?;
        // Set once, never replaced
        let _ = self.gpu_buffer.set(buffer);
        engine_debug!("lumen::GpuParamBlockBuffer", "'{}' uniform buffer created ({} bytes)",
            self.name, self.size);
        Ok(())
    }

    fn sync_to_core(&mut self, data: SyncData<'_>, _ctx: &CoreContext) {
        let bytes = data.expect_payload::<ParamBlockBytes>(self.size as usize).read_bytes(self.size as usize);
        let Some(buffer) = self.gpu_buffer.get() else { return };
        if let Err(err) = buffer.write(0, bytes) {
            engine_error!("lumen::GpuParamBlockBuffer", "Upload of '{}' failed: {}", self.name, err);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "param_block_buffer_tests.rs"]
mod tests;
