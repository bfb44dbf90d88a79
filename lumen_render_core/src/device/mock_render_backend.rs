/// Mock render backend for unit tests (no GPU required)
///
/// Counts created objects, records commands as strings, keeps buffer contents
/// in memory and completes queries when the test advances the GPU frame.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use rustc_hash::FxHashMap;
use crate::config::RenderCoreConfig;
use crate::context::RenderContext;
use crate::core_thread::CoreThread;
use crate::device::{
    BackendCaps, BackendPipeline, BackendQuery, BackendStateObject, BufferDesc, CompiledProgram,
    ComputePipelineCreateInfo, GpuBuffer, GpuProgramCompiler, GpuTexture,
    GraphicsPipelineCreateInfo, MatrixOrder, QueryKind, QueryResult, RenderBackend, TextureInfo,
};
use crate::error::Result;
use crate::program::{GpuParamDesc, GpuProgramDesc};
use crate::params::GpuParamsCore;
use crate::pipeline::{ComputePipelineStateCore, GraphicsPipelineStateCore};
use crate::state::{BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc};
use crate::engine_bail;

// ============================================================================
// Mock State Object
// ============================================================================

#[derive(Debug)]
pub struct MockStateObject {
    pub kind: &'static str,
    pub id: u32,
}

impl BackendStateObject for MockStateObject {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub name: String,
    pub data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            data: Mutex::new(vec![0; size as usize]),
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap().clone()
    }
}

impl GpuBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            engine_bail!("lumen::MockBuffer", "write of {} bytes at {} overflows {}", data.len(), offset, bytes.len());
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub name: String,
    pub info: TextureInfo,
}

impl MockTexture {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            info: TextureInfo { width, height, mip_levels: 1, array_layers: 1 },
        }
    }
}

impl GpuTexture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Pipeline
// ============================================================================

#[derive(Debug)]
pub struct MockPipeline {
    pub name: String,
    pub stage_count: usize,
}

impl BackendPipeline for MockPipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Query
// ============================================================================

#[derive(Debug)]
pub struct MockQuery {
    kind: QueryKind,
    gpu_frame: Arc<AtomicU64>,
    /// GPU frame at which the query completes (None until end())
    ready_at: Option<u64>,
}

impl BackendQuery for MockQuery {
    fn begin(&mut self) {
        self.ready_at = None;
    }

    fn end(&mut self) {
        self.ready_at = Some(self.gpu_frame.load(Ordering::SeqCst) + 1);
    }

    fn is_ready(&self) -> bool {
        self.ready_at
            .is_some_and(|frame| self.gpu_frame.load(Ordering::SeqCst) >= frame)
    }

    fn result(&self) -> QueryResult {
        match self.kind {
            QueryKind::Event => QueryResult::Event,
            QueryKind::Timer => QueryResult::Timer { elapsed_ms: 1.0 },
            QueryKind::Occlusion { binary: true } => QueryResult::Occlusion { num_samples: 1 },
            QueryKind::Occlusion { binary: false } => QueryResult::Occlusion { num_samples: 64 },
        }
    }
}

// ============================================================================
// Mock Render Backend
// ============================================================================

pub struct MockRenderBackend {
    caps: BackendCaps,
    pub commands: Vec<String>,
    pub states_created: u32,
    pub buffers: Vec<Arc<MockBuffer>>,
    pub pipelines_created: u32,
    pub queries_created: u32,
    /// Make pipeline creation fail
    pub fail_pipelines: bool,
    gpu_frame: Arc<AtomicU64>,
}

impl MockRenderBackend {
    pub fn new() -> Self {
        Self::with_matrix_order(MatrixOrder::ColumnMajor)
    }

    pub fn with_matrix_order(matrix_order: MatrixOrder) -> Self {
        Self {
            caps: BackendCaps {
                name: "mock".to_string(),
                matrix_order,
                ..BackendCaps::default()
            },
            commands: Vec::new(),
            states_created: 0,
            buffers: Vec::new(),
            pipelines_created: 0,
            queries_created: 0,
            fail_pipelines: false,
            gpu_frame: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wrap for sharing, keeping a concrete handle for inspection
    pub fn shared() -> (Arc<Mutex<MockRenderBackend>>, Arc<Mutex<dyn RenderBackend>>) {
        let mock = Arc::new(Mutex::new(Self::new()));
        let backend: Arc<Mutex<dyn RenderBackend>> = mock.clone();
        (mock, backend)
    }

    /// Let the GPU finish one frame (completes queries ended before)
    pub fn advance_gpu_frame(&self) {
        self.gpu_frame.fetch_add(1, Ordering::SeqCst);
    }

    fn state(&mut self, kind: &'static str, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.states_created += 1;
        self.commands.push(format!("create_{}_state:{}", kind, id));
        Ok(Arc::new(MockStateObject { kind, id }))
    }
}

impl RenderBackend for MockRenderBackend {
    fn caps(&self) -> &BackendCaps {
        &self.caps
    }

    fn create_blend_state(&mut self, _desc: &BlendStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state("blend", id)
    }

    fn create_rasterizer_state(&mut self, _desc: &RasterizerStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state("rasterizer", id)
    }

    fn create_depth_stencil_state(&mut self, _desc: &DepthStencilStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state("depth_stencil", id)
    }

    fn create_sampler_state(&mut self, _desc: &SamplerStateDesc, id: u32) -> Result<Arc<dyn BackendStateObject>> {
        self.state("sampler", id)
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        let buffer = Arc::new(MockBuffer::new(&desc.name, desc.size));
        self.buffers.push(buffer.clone());
        self.commands.push(format!("create_buffer:{}", desc.size));
        Ok(buffer)
    }

    fn create_graphics_pipeline(&mut self, info: &GraphicsPipelineCreateInfo<'_>) -> Result<Arc<dyn BackendPipeline>> {
        if self.fail_pipelines {
            engine_bail!("lumen::MockRenderBackend", "pipeline '{}' rejected", info.name);
        }
        self.pipelines_created += 1;
        self.commands.push(format!("create_graphics_pipeline:{}", info.name));
        Ok(Arc::new(MockPipeline { name: info.name.to_string(), stage_count: info.stages.len() }))
    }

    fn create_compute_pipeline(&mut self, info: &ComputePipelineCreateInfo<'_>) -> Result<Arc<dyn BackendPipeline>> {
        if self.fail_pipelines {
            engine_bail!("lumen::MockRenderBackend", "pipeline '{}' rejected", info.name);
        }
        self.pipelines_created += 1;
        self.commands.push(format!("create_compute_pipeline:{}", info.name));
        Ok(Arc::new(MockPipeline { name: info.name.to_string(), stage_count: 1 }))
    }

    fn create_query(&mut self, kind: QueryKind, device_idx: u32) -> Result<Box<dyn BackendQuery>> {
        self.queries_created += 1;
        self.commands.push(format!("create_query:{:?}:{}", kind, device_idx));
        Ok(Box::new(MockQuery { kind, gpu_frame: self.gpu_frame.clone(), ready_at: None }))
    }

    fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipelineStateCore) -> Result<()> {
        self.commands.push(format!("bind_graphics_pipeline:{}", pipeline.name()));
        Ok(())
    }

    fn bind_compute_pipeline(&mut self, pipeline: &ComputePipelineStateCore) -> Result<()> {
        self.commands.push(format!("bind_compute_pipeline:{}", pipeline.name()));
        Ok(())
    }

    fn bind_gpu_params(&mut self, params: &GpuParamsCore) -> Result<()> {
        self.commands.push(format!("bind_gpu_params:{}", params.bound_resource_count()));
        Ok(())
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32, instance_count: u32) -> Result<()> {
        self.commands.push(format!("draw:{}:{}:{}", vertex_offset, vertex_count, instance_count));
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.commands.push(format!("dispatch:{}:{}:{}", x, y, z));
        Ok(())
    }
}

// ============================================================================
// Mock Program Compiler
// ============================================================================

/// Compiles language "mock"; reflection output is registered per program name
///
/// A source containing "error" fails to compile.
#[derive(Default)]
pub struct MockProgramCompiler {
    reflections: FxHashMap<String, GpuParamDesc>,
}

impl MockProgramCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reflection returned for the program named `name`
    pub fn with_program(mut self, name: &str, desc: GpuParamDesc) -> Self {
        self.reflections.insert(name.to_string(), desc);
        self
    }
}

impl GpuProgramCompiler for MockProgramCompiler {
    fn compile(&self, desc: &GpuProgramDesc) -> CompiledProgram {
        if desc.source.contains("error") {
            return CompiledProgram::failed(format!("{}: syntax error", desc.name));
        }
        let reflection = self.reflections.get(&desc.name).cloned().unwrap_or_default();
        CompiledProgram::compiled(desc.source.as_bytes().to_vec(), reflection)
    }

    fn is_language_supported(&self, language: &str) -> bool {
        language == "mock"
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Mock backend, context and core thread wired together
pub fn mock_context(
    config: RenderCoreConfig,
    compiler: Option<MockProgramCompiler>,
) -> (Arc<Mutex<MockRenderBackend>>, RenderContext, CoreThread) {
    let (mock, backend) = MockRenderBackend::shared();
    let compiler = compiler.map(|c| Arc::new(c) as Arc<dyn GpuProgramCompiler>);
    let context = RenderContext::new(config, backend, compiler).unwrap();
    let core = context.create_core_thread().unwrap();
    (mock, context, core)
}

/// Submit a frame and apply it on the core thread
pub fn run_frame(context: &RenderContext, core: &mut CoreThread) {
    context.end_frame();
    core.process_pending();
}
