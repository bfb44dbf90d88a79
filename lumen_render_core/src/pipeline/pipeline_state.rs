/// Graphics and compute pipeline states
///
/// A pipeline proxy is built from cached render states and compiled programs.
/// Missing render states resolve to the `RenderStateManager` defaults. Its core
/// object creates the backend pipeline when it is initialized on the render
/// thread; a backend failure is kept as the pipeline's creation error and the
/// pipeline is skipped at bind time.

use std::any::Any;
use std::sync::{Arc, Weak};
use crate::context::RenderContext;
use crate::core_thread::{
    AsyncOp, CoreContext, CoreObject, CoreObjectId, CoreObjectLink, CoreSyncSource, FrameAlloc,
    SyncBlob, SyncData,
};
use crate::device::{
    BackendPipeline, ComputePipelineCreateInfo, GpuProgramType, GraphicsPipelineCreateInfo,
    PipelineStage,
};
use crate::error::{Error, Result};
use crate::pipeline::GpuPipelineParamInfo;
use crate::program::{CompiledGpuProgram, GpuParamDesc, GpuProgram};
use crate::state::{BlendState, DepthStencilState, RasterizerState};
use crate::utils::lock;
use crate::{engine_debug, engine_warn};

/// Backend pipeline creation outcome
type CreateStatus = std::result::Result<(), String>;

fn stage_of(compiled: &CompiledGpuProgram) -> PipelineStage<'_> {
    PipelineStage {
        program_type: compiled.program_type(),
        entry_point: compiled.entry_point(),
        bytecode: compiled.bytecode(),
    }
}

fn check_program_type(program: &GpuProgram, expected: GpuProgramType) -> Result<()> {
    if program.program_type() != expected {
        return Err(Error::InvalidParameter(format!(
            "program '{}' is a {} program, attached as {}",
            program.name(), program.program_type().name(), expected.name()
        )));
    }
    Ok(())
}

// ============================================================================
// GRAPHICS
// ============================================================================

/// Graphics pipeline creation descriptor
#[derive(Clone, Default)]
pub struct GraphicsPipelineStateDesc {
    /// Debug name
    pub name: String,
    pub blend_state: Option<Arc<BlendState>>,
    pub rasterizer_state: Option<Arc<RasterizerState>>,
    pub depth_stencil_state: Option<Arc<DepthStencilState>>,
    pub vertex_program: Option<Arc<GpuProgram>>,
    pub fragment_program: Option<Arc<GpuProgram>>,
    pub geometry_program: Option<Arc<GpuProgram>>,
    pub hull_program: Option<Arc<GpuProgram>>,
    pub domain_program: Option<Arc<GpuProgram>>,
}

impl GraphicsPipelineStateDesc {
    /// Descriptor with vertex and fragment programs and default states
    pub fn new(name: &str, vertex: Arc<GpuProgram>, fragment: Arc<GpuProgram>) -> Self {
        Self {
            name: name.to_string(),
            vertex_program: Some(vertex),
            fragment_program: Some(fragment),
            ..Default::default()
        }
    }

    fn programs(&self) -> [(GpuProgramType, Option<&Arc<GpuProgram>>); 5] {
        [
            (GpuProgramType::Vertex, self.vertex_program.as_ref()),
            (GpuProgramType::Fragment, self.fragment_program.as_ref()),
            (GpuProgramType::Geometry, self.geometry_program.as_ref()),
            (GpuProgramType::Hull, self.hull_program.as_ref()),
            (GpuProgramType::Domain, self.domain_program.as_ref()),
        ]
    }
}

/// Graphics pipeline proxy
pub struct GraphicsPipelineState {
    name: String,
    blend_state: Arc<BlendState>,
    rasterizer_state: Arc<RasterizerState>,
    depth_stencil_state: Arc<DepthStencilState>,
    programs: [Option<Arc<GpuProgram>>; GpuProgramType::COUNT],
    param_info: Arc<GpuPipelineParamInfo>,
    status: AsyncOp<CreateStatus>,
    link: CoreObjectLink,
}

impl GraphicsPipelineState {
    /// Create the pipeline and queue its backend creation for the next frame
    ///
    /// # Errors
    ///
    /// - `Error::InvalidParameter` if there is no vertex program, a program is
    ///   attached to the wrong stage, or the backend lacks the stage
    /// - `Error::NotCompiled` if an attached program is not compiled
    /// - default state creation errors
    pub fn new(desc: GraphicsPipelineStateDesc, context: &RenderContext) -> Result<Arc<Self>> {
        if desc.vertex_program.is_none() {
            return Err(Error::InvalidParameter(format!(
                "graphics pipeline '{}' has no vertex program", desc.name
            )));
        }

        let caps = context.caps();
        let mut programs: [Option<Arc<GpuProgram>>; GpuProgramType::COUNT] = Default::default();
        let mut param_descs: [Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT] = Default::default();
        let mut stages = Vec::new();
        for (program_type, program) in desc.programs() {
            let Some(program) = program else { continue };
            check_program_type(program, program_type)?;
            let unsupported = match program_type {
                GpuProgramType::Geometry => !caps.supports_geometry,
                GpuProgramType::Hull | GpuProgramType::Domain => !caps.supports_tessellation,
                _ => false,
            };
            if unsupported {
                return Err(Error::InvalidParameter(format!(
                    "backend '{}' has no {} programs", caps.name, program_type.name()
                )));
            }
            let compiled = program.require_compiled()?;
            param_descs[program_type.index()] = Some(compiled.param_desc().clone());
            programs[program_type.index()] = Some(program.clone());
            stages.push(compiled);
        }

        let states = context.render_states();
        let blend_state = match desc.blend_state {
            Some(state) => state,
            None => states.default_blend_state()?,
        };
        let rasterizer_state = match desc.rasterizer_state {
            Some(state) => state,
            None => states.default_rasterizer_state()?,
        };
        let depth_stencil_state = match desc.depth_stencil_state {
            Some(state) => state,
            None => states.default_depth_stencil_state()?,
        };

        let param_info = Arc::new(GpuPipelineParamInfo::build(&param_descs, context.config().debug_checks));
        if param_info.num_sets() > caps.max_bound_sets {
            engine_warn!("lumen::GraphicsPipelineState",
                "'{}' uses {} sets, backend '{}' binds at most {}",
                desc.name, param_info.num_sets(), caps.name, caps.max_bound_sets);
        }

        let status = AsyncOp::new();
        let pipeline = Arc::new_cyclic(|weak: &Weak<GraphicsPipelineState>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            GraphicsPipelineState {
                name: desc.name.clone(),
                blend_state: blend_state.clone(),
                rasterizer_state: rasterizer_state.clone(),
                depth_stencil_state: depth_stencil_state.clone(),
                programs,
                param_info: param_info.clone(),
                status: status.clone(),
                link: CoreObjectLink::new(context.core_objects(), source, "GraphicsPipelineState"),
            }
        });

        let name = desc.name;
        pipeline.link.initialize(move || Box::new(GraphicsPipelineStateCore {
            name,
            blend_state,
            rasterizer_state,
            depth_stencil_state,
            stages,
            param_info,
            status,
            pipeline: None,
        }));
        Ok(pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core_id(&self) -> CoreObjectId {
        self.link.id()
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }

    pub fn blend_state(&self) -> &Arc<BlendState> {
        &self.blend_state
    }

    pub fn rasterizer_state(&self) -> &Arc<RasterizerState> {
        &self.rasterizer_state
    }

    pub fn depth_stencil_state(&self) -> &Arc<DepthStencilState> {
        &self.depth_stencil_state
    }

    /// Program attached to `program_type`
    pub fn program(&self, program_type: GpuProgramType) -> Option<&Arc<GpuProgram>> {
        self.programs[program_type.index()].as_ref()
    }

    /// True once the render thread attempted backend creation
    pub fn has_completed(&self) -> bool {
        self.status.has_completed()
    }

    /// True if the backend pipeline exists
    pub fn is_created(&self) -> bool {
        matches!(self.status.try_value(), Some(Ok(())))
    }

    /// Backend message of a failed creation
    pub fn creation_error(&self) -> Option<String> {
        self.status.try_value()?.err()
    }

    /// Wait for backend creation; returns true on success
    pub fn block_until_created(&self) -> bool {
        self.status.block_until_complete().is_ok()
    }
}

impl CoreSyncSource for GraphicsPipelineState {
    fn sync_to_core(&self, _dirty_flags: u32, _alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        None
    }
}

/// Render-thread half of a graphics pipeline
pub struct GraphicsPipelineStateCore {
    name: String,
    blend_state: Arc<BlendState>,
    rasterizer_state: Arc<RasterizerState>,
    depth_stencil_state: Arc<DepthStencilState>,
    stages: Vec<Arc<CompiledGpuProgram>>,
    param_info: Arc<GpuPipelineParamInfo>,
    status: AsyncOp<CreateStatus>,
    pipeline: Option<Arc<dyn BackendPipeline>>,
}

impl GraphicsPipelineStateCore {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_created(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Backend pipeline (None if creation failed)
    pub fn backend_pipeline(&self) -> Option<&Arc<dyn BackendPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }

    pub fn blend_state(&self) -> &Arc<BlendState> {
        &self.blend_state
    }

    pub fn rasterizer_state(&self) -> &Arc<RasterizerState> {
        &self.rasterizer_state
    }

    pub fn depth_stencil_state(&self) -> &Arc<DepthStencilState> {
        &self.depth_stencil_state
    }
}

impl CoreObject for GraphicsPipelineStateCore {
    fn initialize(&mut self, ctx: &CoreContext) -> Result<()> {
        let stages: Vec<PipelineStage<'_>> = self.stages.iter().map(|c| stage_of(c)).collect();
        let info = GraphicsPipelineCreateInfo {
            name: &self.name,
            blend_state: &self.blend_state,
            rasterizer_state: &self.rasterizer_state,
            depth_stencil_state: &self.depth_stencil_state,
            stages: &stages,
            param_info: &self.param_info,
        };
        let created = lock(ctx.backend()).create_graphics_pipeline(&info);
        match created {
            Ok(pipeline) => {
                engine_debug!("lumen::GraphicsPipelineState", "'{}' created ({} stages)",
                    self.name, self.stages.len());
                self.pipeline = Some(pipeline);
                self.status.complete(Ok(()));
                Ok(())
            }
            Err(err) => {
                self.status.complete(Err(err.to_string()));
                Err(err)
            }
        }
    }

    fn sync_to_core(&mut self, _data: SyncData<'_>, _ctx: &CoreContext) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ============================================================================
// COMPUTE
// ============================================================================

/// Compute pipeline proxy
pub struct ComputePipelineState {
    program: Arc<GpuProgram>,
    param_info: Arc<GpuPipelineParamInfo>,
    status: AsyncOp<CreateStatus>,
    link: CoreObjectLink,
}

impl ComputePipelineState {
    /// Create the pipeline (named after its program)
    ///
    /// # Errors
    ///
    /// - `Error::InvalidParameter` if `program` is not a compute program or the
    ///   backend has no compute support
    /// - `Error::NotCompiled` if `program` is not compiled
    pub fn new(program: Arc<GpuProgram>, context: &RenderContext) -> Result<Arc<Self>> {
        check_program_type(&program, GpuProgramType::Compute)?;
        if !context.caps().supports_compute {
            return Err(Error::InvalidParameter(format!(
                "backend '{}' has no compute programs", context.caps().name
            )));
        }
        let compiled = program.require_compiled()?;

        let mut param_descs: [Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT] = Default::default();
        param_descs[GpuProgramType::Compute.index()] = Some(compiled.param_desc().clone());
        let param_info = Arc::new(GpuPipelineParamInfo::build(&param_descs, context.config().debug_checks));

        let status = AsyncOp::new();
        let pipeline = Arc::new_cyclic(|weak: &Weak<ComputePipelineState>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            ComputePipelineState {
                program: program.clone(),
                param_info: param_info.clone(),
                status: status.clone(),
                link: CoreObjectLink::new(context.core_objects(), source, "ComputePipelineState"),
            }
        });

        let name = program.name().to_string();
        pipeline.link.initialize(move || Box::new(ComputePipelineStateCore {
            name,
            program: compiled,
            param_info,
            status,
            pipeline: None,
        }));
        Ok(pipeline)
    }

    pub fn name(&self) -> &str {
        self.program.name()
    }

    pub fn core_id(&self) -> CoreObjectId {
        self.link.id()
    }

    pub fn program(&self) -> &Arc<GpuProgram> {
        &self.program
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }

    pub fn has_completed(&self) -> bool {
        self.status.has_completed()
    }

    pub fn is_created(&self) -> bool {
        matches!(self.status.try_value(), Some(Ok(())))
    }

    pub fn creation_error(&self) -> Option<String> {
        self.status.try_value()?.err()
    }

    pub fn block_until_created(&self) -> bool {
        self.status.block_until_complete().is_ok()
    }
}

impl CoreSyncSource for ComputePipelineState {
    fn sync_to_core(&self, _dirty_flags: u32, _alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        None
    }
}

/// Render-thread half of a compute pipeline
pub struct ComputePipelineStateCore {
    name: String,
    program: Arc<CompiledGpuProgram>,
    param_info: Arc<GpuPipelineParamInfo>,
    status: AsyncOp<CreateStatus>,
    pipeline: Option<Arc<dyn BackendPipeline>>,
}

impl ComputePipelineStateCore {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_created(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn backend_pipeline(&self) -> Option<&Arc<dyn BackendPipeline>> {
        self.pipeline.as_ref()
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }
}

impl CoreObject for ComputePipelineStateCore {
    fn initialize(&mut self, ctx: &CoreContext) -> Result<()> {
        let info = ComputePipelineCreateInfo {
            name: &self.name,
            stage: stage_of(&self.program),
            param_info: &self.param_info,
        };
        let created = lock(ctx.backend()).create_compute_pipeline(&info);
        match created {
            Ok(pipeline) => {
                engine_debug!("lumen::ComputePipelineState", "'{}' created", self.name);
                self.pipeline = Some(pipeline);
                self.status.complete(Ok(()));
                Ok(())
            }
            Err(err) => {
                self.status.complete(Err(err.to_string()));
                Err(err)
            }
        }
    }

    fn sync_to_core(&mut self, _data: SyncData<'_>, _ctx: &CoreContext) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "pipeline_state_tests.rs"]
mod tests;
