/// Render backend contract

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use crate::error::Result;
use crate::device::{
    BackendCaps, BackendPipeline, BackendQuery, BufferDesc, GpuBuffer, QueryKind,
    GraphicsPipelineCreateInfo, ComputePipelineCreateInfo,
};
use crate::params::GpuParamsCore;
use crate::pipeline::{GraphicsPipelineStateCore, ComputePipelineStateCore};
use crate::state::{BlendStateDesc, RasterizerStateDesc, DepthStencilStateDesc, SamplerStateDesc};

/// Opaque backend state handle (blend, rasterizer, depth-stencil, sampler)
pub trait BackendStateObject: Send + Sync + Debug {
    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}

/// Graphics backend
///
/// Shared as `Arc<Mutex<dyn RenderBackend>>`. State objects and buffers are
/// created from whichever thread asks for them; pipelines, queries and all
/// binding/draw calls are issued from the render thread only.
pub trait RenderBackend: Send {
    /// Static capabilities
    fn caps(&self) -> &BackendCaps;

    // ===== STATE OBJECTS =====

    /// Create a blend state; `id` is its dense cache id
    fn create_blend_state(
        &mut self,
        desc: &BlendStateDesc,
        id: u32,
    ) -> Result<Arc<dyn BackendStateObject>>;

    /// Create a rasterizer state; `id` is its dense cache id
    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerStateDesc,
        id: u32,
    ) -> Result<Arc<dyn BackendStateObject>>;

    /// Create a depth-stencil state; `id` is its dense cache id
    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilStateDesc,
        id: u32,
    ) -> Result<Arc<dyn BackendStateObject>>;

    /// Create a sampler state; `id` is its dense cache id
    fn create_sampler_state(
        &mut self,
        desc: &SamplerStateDesc,
        id: u32,
    ) -> Result<Arc<dyn BackendStateObject>>;

    // ===== RESOURCES =====

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>>;

    /// Create a graphics pipeline
    fn create_graphics_pipeline(
        &mut self,
        info: &GraphicsPipelineCreateInfo<'_>,
    ) -> Result<Arc<dyn BackendPipeline>>;

    /// Create a compute pipeline
    fn create_compute_pipeline(
        &mut self,
        info: &ComputePipelineCreateInfo<'_>,
    ) -> Result<Arc<dyn BackendPipeline>>;

    /// Create a query on device `device_idx`
    fn create_query(&mut self, kind: QueryKind, device_idx: u32) -> Result<Box<dyn BackendQuery>>;

    // ===== COMMANDS =====

    /// Bind a graphics pipeline for subsequent draws
    fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipelineStateCore) -> Result<()>;

    /// Bind a compute pipeline for subsequent dispatches
    fn bind_compute_pipeline(&mut self, pipeline: &ComputePipelineStateCore) -> Result<()>;

    /// Bind a parameter table
    fn bind_gpu_params(&mut self, params: &GpuParamsCore) -> Result<()>;

    /// Draw non-indexed geometry
    fn draw(&mut self, vertex_offset: u32, vertex_count: u32, instance_count: u32) -> Result<()>;

    /// Dispatch compute work groups
    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()>;
}
