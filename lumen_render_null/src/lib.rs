/*!
# Lumen Render Null

Headless backend for the Lumen render core.

Implements `RenderBackend` without a GPU: every call is recorded as a
`NullCommand`, buffers keep their bytes in memory, and queries complete a
configurable number of GPU frames after they end. Meant for tests, tools and
servers that need the full render core without a device.

`NullProgramCompiler` compiles the "null" program language, a list of
reflection directives, so pipelines and parameter tables can be built from
plain text.
*/

mod null_backend;
mod null_resources;
mod null_compiler;
mod stats;

pub use null_backend::{NullCommand, NullRenderBackend};
pub use null_resources::{NullBuffer, NullPipeline, NullQuery, NullStateObject, NullTexture};
pub use null_compiler::{NullProgramCompiler, NULL_LANGUAGE};
pub use stats::{CommandStats, print_command_stats_report};
