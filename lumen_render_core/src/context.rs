/// RenderContext - explicit owner of the render core managers
///
/// Holds the configuration, the shared backend, the optional program compiler
/// and the managers every proxy needs: the `CoreObjectManager` (proxy/core
/// sync), the `ResourceListenerManager` and the `RenderStateManager`. There is
/// no global instance; engine code creates one context and passes it around.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use crate::config::RenderCoreConfig;
use crate::core_thread::{CoreContext, CoreObjectManager, CoreThread};
use crate::device::{BackendCaps, GpuProgramCompiler, RenderBackend};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::resource::ResourceListenerManager;
use crate::state::RenderStateManager;
use crate::utils::lock;
use crate::{engine_info, engine_trace};

/// Render core context
pub struct RenderContext {
    config: Arc<RenderCoreConfig>,
    backend: Arc<Mutex<dyn RenderBackend>>,
    compiler: Option<Arc<dyn GpuProgramCompiler>>,
    caps: BackendCaps,
    core_objects: Arc<CoreObjectManager>,
    resource_listeners: Arc<ResourceListenerManager>,
    render_states: Arc<RenderStateManager>,
    core_thread_created: AtomicBool,
}

impl RenderContext {
    /// Create a context
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if `config` is invalid.
    pub fn new(
        config: RenderCoreConfig,
        backend: Arc<Mutex<dyn RenderBackend>>,
        compiler: Option<Arc<dyn GpuProgramCompiler>>,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(severity) = config.log_min_severity {
            Engine::set_min_severity(severity);
        }

        let caps = lock(&backend).caps().clone();
        let config = Arc::new(config);
        let core_objects = CoreObjectManager::new(&config);
        let render_states = Arc::new(RenderStateManager::new(backend.clone(), &config));

        engine_info!("lumen::RenderContext",
            "Render core ready (backend '{}', compiler: {})",
            caps.name, if compiler.is_some() { "yes" } else { "no" });

        Ok(Self {
            config,
            backend,
            compiler,
            caps,
            core_objects,
            resource_listeners: Arc::new(ResourceListenerManager::new()),
            render_states,
            core_thread_created: AtomicBool::new(false),
        })
    }

    /// Render-thread half of the context
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if it was already created.
    pub fn create_core_thread(&self) -> Result<CoreThread> {
        if self.core_thread_created.swap(true, Ordering::SeqCst) {
            return Err(Error::InitializationFailed("core thread already created".to_string()));
        }
        let receiver = self.core_objects.take_receiver().ok_or_else(|| {
            Error::InitializationFailed("core sync channel already taken".to_string())
        })?;
        let context = CoreContext::new(self.backend.clone(), self.compiler.clone(), self.config.clone());
        Ok(CoreThread::new(receiver, context))
    }

    /// Frame boundary on the proxy side
    ///
    /// Delivers resource events (which may dirty parameter tables), then ships
    /// the frame to the core thread. Returns the frame index.
    pub fn end_frame(&self) -> u64 {
        self.resource_listeners.update();
        let frame = self.core_objects.sync_to_core();
        engine_trace!("lumen::RenderContext", "Frame {} submitted", frame);
        frame
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &RenderCoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<Mutex<dyn RenderBackend>> {
        &self.backend
    }

    pub fn compiler(&self) -> Option<&Arc<dyn GpuProgramCompiler>> {
        self.compiler.as_ref()
    }

    /// Backend capabilities captured at creation
    pub fn caps(&self) -> &BackendCaps {
        &self.caps
    }

    pub fn core_objects(&self) -> &Arc<CoreObjectManager> {
        &self.core_objects
    }

    pub fn resource_listeners(&self) -> &Arc<ResourceListenerManager> {
        &self.resource_listeners
    }

    pub fn render_states(&self) -> &Arc<RenderStateManager> {
        &self.render_states
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
