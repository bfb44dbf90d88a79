/// Parameter binding tables
///
/// `GpuParams` holds everything a pipeline's programs read: param blocks,
/// textures, load-store textures, buffers and samplers, each in an array
/// indexed by the pipeline's sequential slot. Data parameters are written into
/// the bound `GpuParamBlockBuffer` through typed `GpuDataParam` handles.

mod param_block_buffer;
mod data_param;
mod gpu_params;

pub use param_block_buffer::{GpuParamBlockBuffer, GpuParamBlockBufferCore};
pub use data_param::{GpuDataParamType, GpuDataParam};
pub use gpu_params::{GpuParams, GpuParamsCore};
