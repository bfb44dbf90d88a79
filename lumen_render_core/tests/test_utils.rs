#![allow(dead_code)]
//! Test utilities - null-backed render context for integration tests
//!
//! Every test gets its own `NullRenderBackend`, `RenderContext` and
//! `CoreThread`. Nothing is shared between tests, so they can run in
//! parallel (except the ones touching the global logger).

use std::sync::{Arc, Mutex};
use lumen_render_core::lumen::{RenderContext, RenderCoreConfig};
use lumen_render_core::lumen::core::CoreThread;
use lumen_render_core::lumen::device::GpuProgramCompiler;
use lumen_render_null::{NullProgramCompiler, NullRenderBackend};

/// Null backend, context (with the null program compiler) and core thread
pub fn null_context(config: RenderCoreConfig) -> (Arc<Mutex<NullRenderBackend>>, RenderContext, CoreThread) {
    null_context_with(config, NullRenderBackend::new())
}

/// Same as `null_context`, with a preconfigured backend
pub fn null_context_with(
    config: RenderCoreConfig,
    backend: NullRenderBackend,
) -> (Arc<Mutex<NullRenderBackend>>, RenderContext, CoreThread) {
    let (null, backend) = backend.into_shared();
    let compiler: Arc<dyn GpuProgramCompiler> = Arc::new(NullProgramCompiler::new());
    let context = RenderContext::new(config, backend, Some(compiler))
        .expect("Failed to create RenderContext for tests");
    let core = context.create_core_thread()
        .expect("Failed to create CoreThread for tests");
    (null, context, core)
}

/// Sync point followed by the core thread applying the packet
pub fn run_frame(context: &RenderContext, core: &mut CoreThread) {
    context.end_frame();
    core.process_pending();
}
