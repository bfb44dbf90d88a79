/// Program compiler contract

use crate::program::{GpuParamDesc, GpuProgramDesc};

/// Output of a compilation
///
/// Compilation failure is data, not an error: `success == false` with the
/// compiler's messages in `error_message`.
#[derive(Debug, Clone, Default)]
pub struct CompiledProgram {
    /// Backend bytecode (empty on failure)
    pub bytecode: Vec<u8>,
    /// Reflected parameters (None on failure)
    pub param_desc: Option<GpuParamDesc>,
    pub success: bool,
    pub error_message: String,
}

impl CompiledProgram {
    /// Successful compilation result
    pub fn compiled(bytecode: Vec<u8>, param_desc: GpuParamDesc) -> Self {
        Self {
            bytecode,
            param_desc: Some(param_desc),
            success: true,
            error_message: String::new(),
        }
    }

    /// Failed compilation result
    pub fn failed(error_message: impl Into<String>) -> Self {
        Self {
            bytecode: Vec::new(),
            param_desc: None,
            success: false,
            error_message: error_message.into(),
        }
    }
}

/// Turns program source into bytecode and reflected parameter descriptors
///
/// Called on the render thread, once per `GpuProgram`.
pub trait GpuProgramCompiler: Send + Sync {
    /// Compile one program
    fn compile(&self, desc: &GpuProgramDesc) -> CompiledProgram;

    /// True if `language` can be compiled
    fn is_language_supported(&self, language: &str) -> bool;
}
