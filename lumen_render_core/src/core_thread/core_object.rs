/// Core object contracts

use std::any::Any;
use std::sync::{Arc, Mutex};
use slotmap::new_key_type;
use crate::config::RenderCoreConfig;
use crate::core_thread::{FrameAlloc, SyncBlob, SyncData};
use crate::device::{GpuProgramCompiler, RenderBackend};
use crate::error::Result;

new_key_type! {
    /// Identifies one proxy/core pair
    pub struct CoreObjectId;
}

/// What core objects may use on the render thread
#[derive(Clone)]
pub struct CoreContext {
    backend: Arc<Mutex<dyn RenderBackend>>,
    compiler: Option<Arc<dyn GpuProgramCompiler>>,
    config: Arc<RenderCoreConfig>,
}

impl CoreContext {
    pub fn new(
        backend: Arc<Mutex<dyn RenderBackend>>,
        compiler: Option<Arc<dyn GpuProgramCompiler>>,
        config: Arc<RenderCoreConfig>,
    ) -> Self {
        Self { backend, compiler, config }
    }

    /// Shared backend
    pub fn backend(&self) -> &Arc<Mutex<dyn RenderBackend>> {
        &self.backend
    }

    /// Program compiler, if one was installed
    pub fn compiler(&self) -> Option<&Arc<dyn GpuProgramCompiler>> {
        self.compiler.as_ref()
    }

    pub fn config(&self) -> &RenderCoreConfig {
        &self.config
    }
}

/// Render-thread half of a proxy/core pair
///
/// Built by the factory passed to `CoreObjectLink::initialize`, on the render
/// thread, then only ever touched there.
pub trait CoreObject: Send + 'static {
    /// Create backend resources
    ///
    /// A failure is logged; the object stays alive and reports its own status.
    fn initialize(&mut self, _ctx: &CoreContext) -> Result<()> {
        Ok(())
    }

    /// Apply the proxy's latest snapshot
    fn sync_to_core(&mut self, data: SyncData<'_>, ctx: &CoreContext);

    /// Release backend resources (the proxy is gone)
    fn destroy(&mut self, _ctx: &CoreContext) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Proxy half of a proxy/core pair
pub trait CoreSyncSource: Send + Sync {
    /// Snapshot the state selected by `dirty_flags` into the frame arena
    ///
    /// Returning `None` skips the core object's `sync_to_core` this frame.
    fn sync_to_core(&self, dirty_flags: u32, alloc: &mut FrameAlloc) -> Option<SyncBlob>;
}
