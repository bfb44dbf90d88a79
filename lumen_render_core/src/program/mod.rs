/// GPU programs and their reflected parameters
///
/// A `GpuProgram` is compiled on the render thread through the context's
/// `GpuProgramCompiler`; the compiler's reflection output is a `GpuParamDesc`
/// listing every named parameter the program reads, grouped by category.

mod param_desc;
mod gpu_program;

pub use param_desc::{
    GpuParamDataType, GpuParamObjectType, GpuParamDataDesc, GpuParamObjectDesc,
    GpuParamBlockDesc, GpuParamDesc,
};
pub use gpu_program::{GpuProgramDesc, GpuProgram, GpuProgramCore, CompiledGpuProgram};
