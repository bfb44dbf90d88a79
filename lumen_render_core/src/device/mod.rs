/// Backend collaborator contracts
///
/// The render core never talks to a graphics API. Everything it needs from one is
/// expressed here as traits: the `RenderBackend` that creates state objects,
/// buffers, pipelines and queries and executes draws, and the
/// `GpuProgramCompiler` that turns source code into bytecode plus reflected
/// parameter descriptors. Backend handles are opaque to the core.

mod program_type;
mod caps;
mod buffer;
mod texture;
mod query;
mod pipeline;
mod compiler;
mod render_backend;

pub use program_type::GpuProgramType;
pub use caps::{BackendCaps, MatrixOrder};
pub use buffer::{GpuBuffer, BufferDesc, BufferUsage};
pub use texture::{GpuTexture, TextureInfo, TextureSurface};
pub use query::{BackendQuery, QueryKind, QueryResult};
pub use pipeline::{
    BackendPipeline, PipelineStage, GraphicsPipelineCreateInfo, ComputePipelineCreateInfo,
};
pub use compiler::{GpuProgramCompiler, CompiledProgram};
pub use render_backend::{RenderBackend, BackendStateObject};

#[cfg(test)]
pub(crate) mod mock_render_backend;

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
