/// GpuProgram - a program stage compiled on the render thread
///
/// Creating a `GpuProgram` queues its core object; the core object compiles the
/// source through the context's `GpuProgramCompiler` when it is initialized on
/// the render thread. The proxy polls or waits on the shared status. A missing
/// compiler, an unsupported language or a compile error all end as a failed
/// status with a message, never as a panic.

use std::any::Any;
use std::sync::{Arc, Weak};
use crate::context::RenderContext;
use crate::core_thread::{
    AsyncOp, CoreContext, CoreObject, CoreObjectId, CoreObjectLink, CoreSyncSource, FrameAlloc,
    SyncBlob, SyncData,
};
use crate::device::GpuProgramType;
use crate::error::{Error, Result};
use crate::program::GpuParamDesc;
use crate::engine_debug;

/// Program creation descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProgramDesc {
    /// Debug name
    pub name: String,
    pub program_type: GpuProgramType,
    /// Source language, checked with `GpuProgramCompiler::is_language_supported`
    pub language: String,
    pub source: String,
    pub entry_point: String,
}

impl GpuProgramDesc {
    /// Descriptor with entry point "main"
    pub fn new(name: &str, program_type: GpuProgramType, language: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            program_type,
            language: language.to_string(),
            source: source.to_string(),
            entry_point: "main".to_string(),
        }
    }

    pub fn with_entry_point(mut self, entry_point: &str) -> Self {
        self.entry_point = entry_point.to_string();
        self
    }
}

/// Output of a successful compilation
#[derive(Debug)]
pub struct CompiledGpuProgram {
    program_type: GpuProgramType,
    entry_point: String,
    bytecode: Vec<u8>,
    param_desc: Arc<GpuParamDesc>,
}

impl CompiledGpuProgram {
    pub fn program_type(&self) -> GpuProgramType {
        self.program_type
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Reflected parameters
    pub fn param_desc(&self) -> &Arc<GpuParamDesc> {
        &self.param_desc
    }
}

/// Compilation outcome: the compiled program or the compiler's message
type CompileStatus = std::result::Result<Arc<CompiledGpuProgram>, String>;

// ===== PROXY =====

/// Program proxy
pub struct GpuProgram {
    desc: GpuProgramDesc,
    status: AsyncOp<CompileStatus>,
    link: CoreObjectLink,
}

impl GpuProgram {
    /// Create the program and queue its compilation for the next frame
    pub fn new(desc: GpuProgramDesc, context: &RenderContext) -> Arc<Self> {
        let status = AsyncOp::new();
        let program = Arc::new_cyclic(|weak: &Weak<GpuProgram>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            GpuProgram {
                desc: desc.clone(),
                status: status.clone(),
                link: CoreObjectLink::new(context.core_objects(), source, "GpuProgram"),
            }
        });
        program.link.initialize(move || Box::new(GpuProgramCore { desc, status, compiled: None }));
        program
    }

    pub fn desc(&self) -> &GpuProgramDesc {
        &self.desc
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn program_type(&self) -> GpuProgramType {
        self.desc.program_type
    }

    pub fn core_id(&self) -> CoreObjectId {
        self.link.id()
    }

    /// True once compilation finished, successfully or not
    pub fn has_completed(&self) -> bool {
        self.status.has_completed()
    }

    /// True if compilation finished successfully
    pub fn is_compiled(&self) -> bool {
        matches!(self.status.try_value(), Some(Ok(_)))
    }

    /// Compiler message of a failed compilation
    pub fn compile_error_message(&self) -> Option<String> {
        match self.status.try_value() {
            Some(Err(message)) => Some(message),
            _ => None,
        }
    }

    /// Compiled program (None until compiled)
    pub fn compiled(&self) -> Option<Arc<CompiledGpuProgram>> {
        self.status.try_value()?.ok()
    }

    /// Reflected parameters (None until compiled)
    pub fn param_desc(&self) -> Option<Arc<GpuParamDesc>> {
        self.compiled().map(|compiled| compiled.param_desc.clone())
    }

    /// Wait for compilation; returns true on success
    ///
    /// # Panics
    ///
    /// When called on the core thread before compilation finished.
    pub fn block_until_compiled(&self) -> bool {
        self.status.block_until_complete().is_ok()
    }

    /// Compiled program, or `Error::NotCompiled` naming the program
    pub(crate) fn require_compiled(&self) -> Result<Arc<CompiledGpuProgram>> {
        match self.status.try_value() {
            Some(Ok(compiled)) => Ok(compiled),
            Some(Err(message)) => Err(Error::NotCompiled(format!(
                "program '{}' failed to compile: {}", self.desc.name, message
            ))),
            None => Err(Error::NotCompiled(format!(
                "program '{}' is still compiling", self.desc.name
            ))),
        }
    }
}

impl CoreSyncSource for GpuProgram {
    fn sync_to_core(&self, _dirty_flags: u32, _alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        None
    }
}

impl std::fmt::Debug for GpuProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuProgram")
            .field("name", &self.desc.name)
            .field("program_type", &self.desc.program_type)
            .field("compiled", &self.is_compiled())
            .finish()
    }
}

// ===== CORE =====

/// Render-thread half of a program
pub struct GpuProgramCore {
    desc: GpuProgramDesc,
    status: AsyncOp<CompileStatus>,
    compiled: Option<Arc<CompiledGpuProgram>>,
}

impl GpuProgramCore {
    pub fn compiled(&self) -> Option<&Arc<CompiledGpuProgram>> {
        self.compiled.as_ref()
    }

    fn compile(&self, ctx: &CoreContext) -> CompileStatus {
        let Some(compiler) = ctx.compiler() else {
            return Err("no program compiler installed".to_string());
        };
        if !compiler.is_language_supported(&self.desc.language) {
            return Err(format!("language '{}' is not supported", self.desc.language));
        }
        let output = compiler.compile(&self.desc);
        if !output.success {
            return Err(output.error_message);
        }
        Ok(Arc::new(CompiledGpuProgram {
            program_type: self.desc.program_type,
            entry_point: self.desc.entry_point.clone(),
            bytecode: output.bytecode,
            param_desc: Arc::new(output.param_desc.unwrap_or_default()),
        }))
    }
}

impl CoreObject for GpuProgramCore {
    fn initialize(&mut self, ctx: &CoreContext) -> Result<()> {
        let status = self.compile(ctx);
        let outcome = match &status {
            Ok(compiled) => {
                engine_debug!("lumen::GpuProgram", "'{}' compiled ({} bytes)",
                    self.desc.name, compiled.bytecode.len());
                self.compiled = Some(compiled.clone());
                Ok(())
            }
            Err(message) => Err(Error::NotCompiled(format!("'{}': {}", self.desc.name, message))),
        };
        self.status.complete(status);
        outcome
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
#[path = "gpu_program_tests.rs"]
mod tests;
