/// Backend pipeline contract

use std::any::Any;
use std::fmt::Debug;
use crate::device::GpuProgramType;
use crate::pipeline::GpuPipelineParamInfo;
use crate::state::{BlendState, RasterizerState, DepthStencilState};

/// Backend pipeline handle
pub trait BackendPipeline: Send + Sync + Debug {
    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}

/// One compiled program attached to a pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineStage<'a> {
    pub program_type: GpuProgramType,
    pub entry_point: &'a str,
    pub bytecode: &'a [u8],
}

/// Everything a backend needs to build a graphics pipeline
#[derive(Debug, Clone, Copy)]
pub struct GraphicsPipelineCreateInfo<'a> {
    pub name: &'a str,
    pub blend_state: &'a BlendState,
    pub rasterizer_state: &'a RasterizerState,
    pub depth_stencil_state: &'a DepthStencilState,
    /// Attached stages, in `GpuProgramType` order
    pub stages: &'a [PipelineStage<'a>],
    /// Flattened parameter layout of the pipeline
    pub param_info: &'a GpuPipelineParamInfo,
}

/// Everything a backend needs to build a compute pipeline
#[derive(Debug, Clone, Copy)]
pub struct ComputePipelineCreateInfo<'a> {
    pub name: &'a str,
    pub stage: PipelineStage<'a>,
    pub param_info: &'a GpuPipelineParamInfo,
}
