/// In-memory backend objects of the null backend

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use lumen_render_core::lumen::{Error, Result};
use lumen_render_core::lumen::device::{
    BackendPipeline, BackendQuery, BackendStateObject, BufferUsage, GpuBuffer, GpuTexture,
    QueryKind, QueryResult, TextureInfo,
};
use lumen_render_core::lumen::state::StateKind;

// ============================================================================
// STATE OBJECT
// ============================================================================

/// Blend, rasterizer, depth-stencil or sampler state
#[derive(Debug)]
pub struct NullStateObject {
    pub kind: StateKind,
    /// Dense cache id the state was created with
    pub id: u32,
}

impl BackendStateObject for NullStateObject {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// BUFFER
// ============================================================================

/// Buffer whose bytes live in memory
#[derive(Debug)]
pub struct NullBuffer {
    name: String,
    usage: BufferUsage,
    data: Mutex<Vec<u8>>,
}

impl NullBuffer {
    pub fn new(name: &str, size: u64, usage: BufferUsage) -> Self {
        Self {
            name: name.to_string(),
            usage,
            data: Mutex::new(vec![0; size as usize]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Copy of the current bytes
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl GpuBuffer for NullBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap_or_else(PoisonError::into_inner).len() as u64
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        let start = offset as usize;
        let end = start.checked_add(data.len()).filter(|&end| end <= bytes.len());
        let Some(end) = end else {
            return Err(Error::InvalidParameter(format!(
                "write of {} bytes at offset {} overflows buffer '{}' ({} bytes)",
                data.len(), offset, self.name, bytes.len()
            )));
        };
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// TEXTURE
// ============================================================================

/// Texture without storage, only dimensions
#[derive(Debug)]
pub struct NullTexture {
    name: String,
    info: TextureInfo,
}

impl NullTexture {
    /// Single-mip 2D texture
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self::with_info(name, TextureInfo { width, height, mip_levels: 1, array_layers: 1 })
    }

    pub fn with_info(name: &str, info: TextureInfo) -> Self {
        Self { name: name.to_string(), info }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl GpuTexture for NullTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Graphics or compute pipeline
#[derive(Debug)]
pub struct NullPipeline {
    pub name: String,
    pub compute: bool,
    /// Number of attached programs
    pub stage_count: usize,
    /// Descriptor sets used by the layout
    pub num_sets: u32,
}

impl BackendPipeline for NullPipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// Query completed by the backend's GPU frame counter
///
/// Ends at GPU frame `f` and becomes ready at `f + latency`. Binary occlusion
/// queries complete one frame earlier when the latency allows it.
#[derive(Debug)]
pub struct NullQuery {
    kind: QueryKind,
    device_idx: u32,
    gpu_frame: Arc<AtomicU64>,
    latency: u64,
    result: QueryResult,
    ready_at: Option<u64>,
}

impl NullQuery {
    pub(crate) fn new(
        kind: QueryKind,
        device_idx: u32,
        gpu_frame: Arc<AtomicU64>,
        latency: u64,
        timer_elapsed_ms: f32,
        occlusion_samples: u64,
    ) -> Self {
        let (latency, result) = match kind {
            QueryKind::Event => (latency, QueryResult::Event),
            QueryKind::Timer => (latency, QueryResult::Timer { elapsed_ms: timer_elapsed_ms }),
            QueryKind::Occlusion { binary: true } => (
                latency.saturating_sub(1).max(1),
                QueryResult::Occlusion { num_samples: occlusion_samples.min(1) },
            ),
            QueryKind::Occlusion { binary: false } => {
                (latency, QueryResult::Occlusion { num_samples: occlusion_samples })
            }
        };
        Self { kind, device_idx, gpu_frame, latency, result, ready_at: None }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn device_idx(&self) -> u32 {
        self.device_idx
    }
}

impl BackendQuery for NullQuery {
    fn begin(&mut self) {
        self.ready_at = None;
    }

    fn end(&mut self) {
        self.ready_at = Some(self.gpu_frame.load(Ordering::Acquire) + self.latency);
    }

    fn is_ready(&self) -> bool {
        self.ready_at
            .is_some_and(|frame| self.gpu_frame.load(Ordering::Acquire) >= frame)
    }

    fn result(&self) -> QueryResult {
        self.result
    }
}
