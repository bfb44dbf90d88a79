/// Pipeline states and their flattened parameter layout
///
/// A pipeline combines cached render states with compiled programs. Its
/// `GpuPipelineParamInfo` maps every `(set, slot)` binding the programs declare
/// to one sequential index per category, which parameter tables use to index
/// their arrays.

mod pipeline_param_info;
mod pipeline_state;

pub use pipeline_param_info::{GpuPipelineParamInfo, ParamType, INVALID_SLOT};
pub use pipeline_state::{
    GraphicsPipelineStateDesc, GraphicsPipelineState, GraphicsPipelineStateCore,
    ComputePipelineState, ComputePipelineStateCore,
};
