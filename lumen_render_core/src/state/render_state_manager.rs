/// RenderStateManager - one state cache per category plus lazy defaults
///
/// An explicit context object (owned by `RenderContext`), not a global. Backend
/// state objects are created through the shared `RenderBackend`; the cache
/// lock is never held while the backend runs.

use std::sync::{Arc, Mutex};
use crate::config::RenderCoreConfig;
use crate::device::RenderBackend;
use crate::error::Result;
use crate::state::descriptor::{
    BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc,
};
use crate::state::state_cache::{
    BlendState, DepthStencilState, RasterizerState, SamplerState, StateCache,
};
use crate::utils::lock;
use crate::engine_info;

/// Owner of the blend, rasterizer, depth-stencil and sampler caches
pub struct RenderStateManager {
    backend: Arc<Mutex<dyn RenderBackend>>,
    blend: StateCache<BlendStateDesc>,
    rasterizer: StateCache<RasterizerStateDesc>,
    depth_stencil: StateCache<DepthStencilStateDesc>,
    sampler: StateCache<SamplerStateDesc>,
    default_blend: Mutex<Option<Arc<BlendState>>>,
    default_rasterizer: Mutex<Option<Arc<RasterizerState>>>,
    default_depth_stencil: Mutex<Option<Arc<DepthStencilState>>>,
    default_sampler: Mutex<Option<Arc<SamplerState>>>,
}

impl RenderStateManager {
    /// Create a manager whose caches hand out `config.max_state_ids` ids each
    pub fn new(backend: Arc<Mutex<dyn RenderBackend>>, config: &RenderCoreConfig) -> Self {
        engine_info!("lumen::RenderStateManager",
            "State caches ready ({} ids per category)", config.max_state_ids);
        Self {
            backend,
            blend: StateCache::new(config.max_state_ids),
            rasterizer: StateCache::new(config.max_state_ids),
            depth_stencil: StateCache::new(config.max_state_ids),
            sampler: StateCache::new(config.max_state_ids),
            default_blend: Mutex::new(None),
            default_rasterizer: Mutex::new(None),
            default_depth_stencil: Mutex::new(None),
            default_sampler: Mutex::new(None),
        }
    }

    // ===== GET OR CREATE =====

    /// Shared blend state for `desc`
    pub fn blend_state(&self, desc: &BlendStateDesc) -> Result<Arc<BlendState>> {
        self.blend.get_or_create(desc, |desc, id| {
            lock(&self.backend).create_blend_state(desc, id)
        })
    }

    /// Shared rasterizer state for `desc`
    pub fn rasterizer_state(&self, desc: &RasterizerStateDesc) -> Result<Arc<RasterizerState>> {
        self.rasterizer.get_or_create(desc, |desc, id| {
            lock(&self.backend).create_rasterizer_state(desc, id)
        })
    }

    /// Shared depth-stencil state for `desc`
    pub fn depth_stencil_state(&self, desc: &DepthStencilStateDesc) -> Result<Arc<DepthStencilState>> {
        self.depth_stencil.get_or_create(desc, |desc, id| {
            lock(&self.backend).create_depth_stencil_state(desc, id)
        })
    }

    /// Shared sampler state for `desc`
    pub fn sampler_state(&self, desc: &SamplerStateDesc) -> Result<Arc<SamplerState>> {
        self.sampler.get_or_create(desc, |desc, id| {
            lock(&self.backend).create_sampler_state(desc, id)
        })
    }

    // ===== DEFAULTS =====

    /// Default blend state (created on first use, kept for the manager's lifetime)
    pub fn default_blend_state(&self) -> Result<Arc<BlendState>> {
        let mut slot = lock(&self.default_blend);
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let state = self.blend_state(&BlendStateDesc::default())?;
        *slot = Some(state.clone());
        Ok(state)
    }

    /// Default rasterizer state
    pub fn default_rasterizer_state(&self) -> Result<Arc<RasterizerState>> {
        let mut slot = lock(&self.default_rasterizer);
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let state = self.rasterizer_state(&RasterizerStateDesc::default())?;
        *slot = Some(state.clone());
        Ok(state)
    }

    /// Default depth-stencil state
    pub fn default_depth_stencil_state(&self) -> Result<Arc<DepthStencilState>> {
        let mut slot = lock(&self.default_depth_stencil);
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let state = self.depth_stencil_state(&DepthStencilStateDesc::default())?;
        *slot = Some(state.clone());
        Ok(state)
    }

    /// Default sampler state
    pub fn default_sampler_state(&self) -> Result<Arc<SamplerState>> {
        let mut slot = lock(&self.default_sampler);
        if let Some(state) = slot.as_ref() {
            return Ok(state.clone());
        }
        let state = self.sampler_state(&SamplerStateDesc::default())?;
        *slot = Some(state.clone());
        Ok(state)
    }

    // ===== CACHE ACCESS =====

    pub fn blend_cache(&self) -> &StateCache<BlendStateDesc> {
        &self.blend
    }

    pub fn rasterizer_cache(&self) -> &StateCache<RasterizerStateDesc> {
        &self.rasterizer
    }

    pub fn depth_stencil_cache(&self) -> &StateCache<DepthStencilStateDesc> {
        &self.depth_stencil
    }

    pub fn sampler_cache(&self) -> &StateCache<SamplerStateDesc> {
        &self.sampler
    }

    /// Flush every cache (defaults are kept and stay valid)
    pub fn clear(&self) {
        self.blend.clear();
        self.rasterizer.clear();
        self.depth_stencil.clear();
        self.sampler.clear();
    }
}

#[cfg(test)]
#[path = "render_state_manager_tests.rs"]
mod tests;
