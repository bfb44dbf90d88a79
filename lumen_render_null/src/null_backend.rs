/// NullRenderBackend - a `RenderBackend` that records instead of rendering

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use lumen_render_core::lumen::Result;
use lumen_render_core::lumen::device::{
    BackendCaps, BackendPipeline, BackendQuery, BackendStateObject, BufferDesc,
    ComputePipelineCreateInfo, GpuBuffer, GraphicsPipelineCreateInfo, QueryKind, RenderBackend,
};
use lumen_render_core::lumen::params::GpuParamsCore;
use lumen_render_core::lumen::pipeline::{ComputePipelineStateCore, GraphicsPipelineStateCore};
use lumen_render_core::lumen::state::{
    BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc, StateKind,
};
use lumen_render_core::{engine_debug, engine_warn_err};
#[cfg(feature = "command-trace")]
use lumen_render_core::engine_trace;
use crate::null_resources::{NullBuffer, NullPipeline, NullQuery, NullStateObject};
use crate::stats::CommandStats;

/// One call received by the backend
#[derive(Debug, Clone, PartialEq)]
pub enum NullCommand {
    CreateState { kind: StateKind, id: u32 },
    CreateBuffer { name: String, size: u64 },
    CreateGraphicsPipeline { name: String, stage_count: usize },
    CreateComputePipeline { name: String },
    CreateQuery { kind: QueryKind, device_idx: u32 },
    BindGraphicsPipeline { name: String },
    BindComputePipeline { name: String },
    /// `resources` is the number of bindings holding a backend object
    BindGpuParams { resources: usize },
    Draw { vertex_offset: u32, vertex_count: u32, instance_count: u32 },
    Dispatch { x: u32, y: u32, z: u32 },
}

/// Headless backend
pub struct NullRenderBackend {
    caps: BackendCaps,
    commands: Vec<NullCommand>,
    buffers: Vec<Arc<NullBuffer>>,
    stats: CommandStats,
    gpu_frame: Arc<AtomicU64>,
    query_latency: u64,
    timer_elapsed_ms: f32,
    occlusion_samples: u64,
    fail_pipelines: bool,
}

impl NullRenderBackend {
    pub fn new() -> Self {
        Self::with_caps(BackendCaps { name: "null".to_string(), ..BackendCaps::default() })
    }

    pub fn with_caps(caps: BackendCaps) -> Self {
        engine_debug!("lumen::null", "Null backend created ({:?} matrices)", caps.matrix_order);
        Self {
            caps,
            commands: Vec::new(),
            buffers: Vec::new(),
            stats: CommandStats::default(),
            gpu_frame: Arc::new(AtomicU64::new(0)),
            query_latency: 1,
            timer_elapsed_ms: 0.5,
            occlusion_samples: 0,
            fail_pipelines: false,
        }
    }

    /// GPU frames between a query's end and its completion (at least 1)
    pub fn with_query_latency(mut self, frames: u64) -> Self {
        self.query_latency = frames.max(1);
        self
    }

    /// Results reported by timer and precise occlusion queries
    pub fn with_query_results(mut self, timer_elapsed_ms: f32, occlusion_samples: u64) -> Self {
        self.timer_elapsed_ms = timer_elapsed_ms;
        self.occlusion_samples = occlusion_samples;
        self
    }

    /// Reject every pipeline creation
    pub fn with_failing_pipelines(mut self) -> Self {
        self.fail_pipelines = true;
        self
    }

    /// Wrap for sharing with a `RenderContext`, keeping a concrete handle
    pub fn into_shared(self) -> (Arc<Mutex<NullRenderBackend>>, Arc<Mutex<dyn RenderBackend>>) {
        let null = Arc::new(Mutex::new(self));
        let backend: Arc<Mutex<dyn RenderBackend>> = null.clone();
        (null, backend)
    }

    // ===== INSPECTION =====

    /// Every command received so far
    pub fn commands(&self) -> &[NullCommand] {
        &self.commands
    }

    /// Drain the recorded commands
    pub fn take_commands(&mut self) -> Vec<NullCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Buffers created so far, in creation order
    pub fn buffers(&self) -> &[Arc<NullBuffer>] {
        &self.buffers
    }

    pub fn stats(&self) -> CommandStats {
        self.stats
    }

    // ===== GPU TIMELINE =====

    /// Let the GPU finish one frame
    pub fn advance_gpu_frame(&self) {
        self.gpu_frame.fetch_add(1, Ordering::AcqRel);
    }

    /// GPU frames finished so far
    pub fn gpu_frame(&self) -> u64 {
        self.gpu_frame.load(Ordering::Acquire)
    }

    // ===== INTERNAL =====

    fn record(&mut self, command: NullCommand) {
        #[cfg(feature = "command-trace")]
        engine_trace!("lumen::null", "{:?}", command);
        self.commands.push(command);
    }

    fn state(&mut self, kind: StateKind, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.stats.states_created += 1;
        self.record(NullCommand::CreateState { kind, id });
        Ok(Arc::new(NullStateObject { kind, id }))
    }
}

impl Default for NullRenderBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for NullRenderBackend {
    fn caps(&self) -> &BackendCaps {
        &self.caps
    }

    fn create_blend_state(&mut self, _desc: &BlendStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state(StateKind::Blend, id)
    }

    fn create_rasterizer_state(&mut self, _desc: &RasterizerStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state(StateKind::Rasterizer, id)
    }

    fn create_depth_stencil_state(&mut self, _desc: &DepthStencilStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state(StateKind::DepthStencil, id)
    }

    fn create_sampler_state(&mut self, _desc: &SamplerStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state(StateKind::Sampler, id)
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        let buffer = Arc::new(NullBuffer::new(&desc.name, desc.size, desc.usage));
        self.buffers.push(buffer.clone());
        self.stats.buffers_created += 1;
        self.record(NullCommand::CreateBuffer { name: desc.name.clone(), size: desc.size });
        Ok(buffer)
    }

    fn create_graphics_pipeline(&mut self, info: &GraphicsPipelineCreateInfo<'_>) -> Result<Arc<dyn BackendPipeline>> {
        if self.fail_pipelines {
            self.stats.failures += 1;
            return Err(engine_warn_err!("lumen::null", "Graphics pipeline '{}' rejected", info.name));
        }
        self.stats.pipelines_created += 1;
        self.record(NullCommand::CreateGraphicsPipeline {
            name: info.name.to_string(),
            stage_count: info.stages.len(),
        });
        Ok(Arc::new(NullPipeline {
            name: info.name.to_string(),
            compute: false,
            stage_count: info.stages.len(),
            num_sets: info.param_info.num_sets(),
        }))
    }

    fn create_compute_pipeline(&mut self, info: &ComputePipelineCreateInfo<'_>) -> Result<Arc<dyn BackendPipeline>> {
        if self.fail_pipelines {
            self.stats.failures += 1;
            return Err(engine_warn_err!("lumen::null", "Compute pipeline '{}' rejected", info.name));
        }
        self.stats.pipelines_created += 1;
        self.record(NullCommand::CreateComputePipeline { name: info.name.to_string() });
        Ok(Arc::new(NullPipeline {
            name: info.name.to_string(),
            compute: true,
            stage_count: 1,
            num_sets: info.param_info.num_sets(),
        }))
    }

    fn create_query(&mut self, kind: QueryKind, device_idx: u32) -> Result<Box<dyn BackendQuery>> {
        self.stats.queries_created += 1;
        self.record(NullCommand::CreateQuery { kind, device_idx });
        Ok(Box::new(NullQuery::new(
            kind,
            device_idx,
            self.gpu_frame.clone(),
            self.query_latency,
            self.timer_elapsed_ms,
            self.occlusion_samples,
        )))
    }

    fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipelineStateCore) -> Result<()> {
        self.stats.binds += 1;
        self.record(NullCommand::BindGraphicsPipeline { name: pipeline.name().to_string() });
        Ok(())
    }

    fn bind_compute_pipeline(&mut self, pipeline: &ComputePipelineStateCore) -> Result<()> {
        self.stats.binds += 1;
        self.record(NullCommand::BindComputePipeline { name: pipeline.name().to_string() });
        Ok(())
    }

    fn bind_gpu_params(&mut self, params: &GpuParamsCore) -> Result<()> {
        self.stats.binds += 1;
        self.record(NullCommand::BindGpuParams { resources: params.bound_resource_count() });
        Ok(())
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32, instance_count: u32) -> Result<()> {
        self.stats.draws += 1;
        self.record(NullCommand::Draw { vertex_offset, vertex_count, instance_count });
        Ok(())
    }

    fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()> {
        self.stats.dispatches += 1;
        self.record(NullCommand::Dispatch { x: group_count_x, y: group_count_y, z: group_count_z });
        Ok(())
    }
}
