/// GpuParams - parameter binding table of one pipeline
///
/// Every category is an array indexed by the pipeline's sequential slot
/// (`GpuPipelineParamInfo::sequential_slot`). Setters are addressed either by
/// `(set, slot)` or by name through the layout. Any change marks the whole
/// table dirty; the next sync point ships a snapshot of every binding to the
/// `GpuParamsCore` the backend binds.
///
/// Textures and buffers are `AsyncResource`s. The table registers itself with
/// the `ResourceListenerManager` when it first binds one, and a load or change
/// of a bound resource marks it dirty so the core side picks up the new GPU
/// object. A table belongs to one pipeline layout and is not shared.

use std::any::Any;
use std::sync::{Arc, Mutex, Weak};
use bytemuck::{Pod, Zeroable};
use crate::context::RenderContext;
use crate::core_thread::{
    CoreContext, CoreObject, CoreObjectId, CoreObjectLink, CoreSyncSource, FrameAlloc, SyncBlob,
    SyncData, SyncResource,
};
use crate::device::{GpuBuffer, GpuProgramType, GpuTexture, MatrixOrder, TextureSurface};
use crate::params::param_block_buffer::GpuBufferCell;
use crate::params::{GpuDataParam, GpuDataParamType, GpuParamBlockBuffer};
use crate::pipeline::{
    ComputePipelineState, GpuPipelineParamInfo, GraphicsPipelineState, ParamType, INVALID_SLOT,
};
use crate::resource::{
    BufferResource, ListenerKey, ResourceId, ResourceListener, ResourceListenerManager,
    TextureResource,
};
use crate::state::SamplerState;
use crate::utils::lock;
use crate::{engine_error, engine_trace, engine_warn};

/// Dirty flag: some binding changed
const TABLE_DIRTY: u32 = 1;

/// Leading element counts of a table sync payload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
struct GpuParamsHeader {
    num_param_blocks: u32,
    num_textures: u32,
    num_load_store_textures: u32,
    num_buffers: u32,
    num_samplers: u32,
}

impl GpuParamsHeader {
    fn of(info: &GpuPipelineParamInfo) -> Self {
        Self {
            num_param_blocks: info.num_elements(ParamType::ParamBlock),
            num_textures: info.num_elements(ParamType::Texture),
            num_load_store_textures: info.num_elements(ParamType::LoadStoreTexture),
            num_buffers: info.num_elements(ParamType::Buffer),
            num_samplers: info.num_elements(ParamType::SamplerState),
        }
    }

    /// Payload size: the header, then one surface per texture and load-store texture
    fn payload_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + (self.num_textures + self.num_load_store_textures) as usize
                * std::mem::size_of::<TextureSurface>()
    }

    fn num_resources(&self) -> usize {
        (self.num_param_blocks + self.num_textures + self.num_load_store_textures
            + self.num_buffers + self.num_samplers) as usize
    }
}

// ============================================================================
// PROXY
// ============================================================================

struct TableState {
    param_blocks: Vec<Option<Arc<GpuParamBlockBuffer>>>,
    textures: Vec<Option<Arc<TextureResource>>>,
    texture_surfaces: Vec<TextureSurface>,
    load_store_textures: Vec<Option<Arc<TextureResource>>>,
    load_store_surfaces: Vec<TextureSurface>,
    buffers: Vec<Option<Arc<BufferResource>>>,
    samplers: Vec<Option<Arc<SamplerState>>>,
    listener_key: Option<ListenerKey>,
}

/// Parameter binding table proxy
pub struct GpuParams {
    param_info: Arc<GpuPipelineParamInfo>,
    transpose_matrices: bool,
    state: Mutex<TableState>,
    listeners: Arc<ResourceListenerManager>,
    weak_self: Weak<GpuParams>,
    link: CoreObjectLink,
}

impl GpuParams {
    /// Empty table for the layout `param_info`
    pub fn new(param_info: Arc<GpuPipelineParamInfo>, context: &RenderContext) -> Arc<Self> {
        let count = |category: ParamType| param_info.num_elements(category) as usize;
        let state = TableState {
            param_blocks: vec![None; count(ParamType::ParamBlock)],
            textures: vec![None; count(ParamType::Texture)],
            texture_surfaces: vec![TextureSurface::COMPLETE; count(ParamType::Texture)],
            load_store_textures: vec![None; count(ParamType::LoadStoreTexture)],
            load_store_surfaces: vec![TextureSurface::COMPLETE; count(ParamType::LoadStoreTexture)],
            buffers: vec![None; count(ParamType::Buffer)],
            samplers: vec![None; count(ParamType::SamplerState)],
            listener_key: None,
        };

        let params = Arc::new_cyclic(|weak: &Weak<GpuParams>| {
            let source: Weak<dyn CoreSyncSource> = weak.clone();
            GpuParams {
                param_info: param_info.clone(),
                transpose_matrices: context.caps().matrix_order == MatrixOrder::RowMajor,
                state: Mutex::new(state),
                listeners: context.resource_listeners().clone(),
                weak_self: weak.clone(),
                link: CoreObjectLink::new(context.core_objects(), source, "GpuParams"),
            }
        });
        params.link.initialize(move || Box::new(GpuParamsCore::new(param_info)));
        params
    }

    /// Empty table for a graphics pipeline
    pub fn for_graphics(pipeline: &GraphicsPipelineState, context: &RenderContext) -> Arc<Self> {
        Self::new(pipeline.param_info().clone(), context)
    }

    /// Empty table for a compute pipeline
    pub fn for_compute(pipeline: &ComputePipelineState, context: &RenderContext) -> Arc<Self> {
        Self::new(pipeline.param_info().clone(), context)
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }

    pub fn core_id(&self) -> CoreObjectId {
        self.link.id()
    }

    pub(crate) fn debug_checks(&self) -> bool {
        self.param_info.debug_checks()
    }

    fn slot(&self, category: ParamType, set: u32, slot: u32) -> Option<usize> {
        match self.param_info.sequential_slot(category, set, slot) {
            INVALID_SLOT => None,
            index => Some(index as usize),
        }
    }

    fn mark_dirty(&self) {
        self.link.mark_core_dirty(TABLE_DIRTY);
    }

    /// Register with the listener manager on first use, or ask it to
    /// re-query the bound resources
    fn track_resources(&self, state: &mut TableState) {
        match state.listener_key {
            Some(key) => self.listeners.mark_listener_dirty(key),
            None => {
                let listener: Weak<dyn ResourceListener> = self.weak_self.clone();
                state.listener_key = Some(self.listeners.register_listener(listener));
            }
        }
    }

    // ===== SETTERS BY (SET, SLOT) =====

    /// Bind a param block (None unbinds)
    pub fn set_param_block_buffer(&self, set: u32, slot: u32, buffer: Option<Arc<GpuParamBlockBuffer>>) {
        let Some(index) = self.slot(ParamType::ParamBlock, set, slot) else { return };
        lock(&self.state).param_blocks[index] = buffer;
        self.mark_dirty();
    }

    /// Bind a sampled texture
    pub fn set_texture(&self, set: u32, slot: u32, texture: Option<Arc<TextureResource>>, surface: TextureSurface) {
        let Some(index) = self.slot(ParamType::Texture, set, slot) else { return };
        {
            let mut state = lock(&self.state);
            state.textures[index] = texture;
            state.texture_surfaces[index] = surface;
            self.track_resources(&mut state);
        }
        self.mark_dirty();
    }

    /// Bind a load-store texture
    pub fn set_load_store_texture(&self, set: u32, slot: u32, texture: Option<Arc<TextureResource>>, surface: TextureSurface) {
        let Some(index) = self.slot(ParamType::LoadStoreTexture, set, slot) else { return };
        {
            let mut state = lock(&self.state);
            state.load_store_textures[index] = texture;
            state.load_store_surfaces[index] = surface;
            self.track_resources(&mut state);
        }
        self.mark_dirty();
    }

    /// Bind a buffer
    pub fn set_buffer(&self, set: u32, slot: u32, buffer: Option<Arc<BufferResource>>) {
        let Some(index) = self.slot(ParamType::Buffer, set, slot) else { return };
        {
            let mut state = lock(&self.state);
            state.buffers[index] = buffer;
            self.track_resources(&mut state);
        }
        self.mark_dirty();
    }

    /// Bind a sampler state
    pub fn set_sampler_state(&self, set: u32, slot: u32, sampler: Option<Arc<SamplerState>>) {
        let Some(index) = self.slot(ParamType::SamplerState, set, slot) else { return };
        lock(&self.state).samplers[index] = sampler;
        self.mark_dirty();
    }

    // ===== SETTERS BY NAME =====

    fn named(&self, program_type: GpuProgramType, category: ParamType, name: &str) -> Option<(u32, u32)> {
        let binding = self.param_info.binding_by_name(program_type, category, name);
        if binding.is_none() && self.debug_checks() {
            engine_warn!("lumen::GpuParams", "No {} named '{}' in the {} program",
                category.name(), name, program_type.name());
        }
        binding
    }

    /// Bind a param block in every stage that declares `name`
    ///
    /// Stages declaring the same block name are expected to agree on its
    /// layout. Returns false if no stage declares it.
    pub fn set_param_block_buffer_by_name(&self, name: &str, buffer: Option<Arc<GpuParamBlockBuffer>>) -> bool {
        let mut found = false;
        for program_type in self.param_info.program_types() {
            if let Some((set, slot)) = self.param_info.binding_by_name(program_type, ParamType::ParamBlock, name) {
                self.set_param_block_buffer(set, slot, buffer.clone());
                found = true;
            }
        }
        if !found && self.debug_checks() {
            engine_warn!("lumen::GpuParams", "No param block named '{}'", name);
        }
        found
    }

    pub fn set_texture_by_name(
        &self,
        program_type: GpuProgramType,
        name: &str,
        texture: Option<Arc<TextureResource>>,
        surface: TextureSurface,
    ) -> bool {
        let Some((set, slot)) = self.named(program_type, ParamType::Texture, name) else { return false };
        self.set_texture(set, slot, texture, surface);
        true
    }

    pub fn set_load_store_texture_by_name(
        &self,
        program_type: GpuProgramType,
        name: &str,
        texture: Option<Arc<TextureResource>>,
        surface: TextureSurface,
    ) -> bool {
        let Some((set, slot)) = self.named(program_type, ParamType::LoadStoreTexture, name) else { return false };
        self.set_load_store_texture(set, slot, texture, surface);
        true
    }

    pub fn set_buffer_by_name(&self, program_type: GpuProgramType, name: &str, buffer: Option<Arc<BufferResource>>) -> bool {
        let Some((set, slot)) = self.named(program_type, ParamType::Buffer, name) else { return false };
        self.set_buffer(set, slot, buffer);
        true
    }

    pub fn set_sampler_state_by_name(&self, program_type: GpuProgramType, name: &str, sampler: Option<Arc<SamplerState>>) -> bool {
        let Some((set, slot)) = self.named(program_type, ParamType::SamplerState, name) else { return false };
        self.set_sampler_state(set, slot, sampler);
        true
    }

    // ===== GETTERS =====

    pub fn param_block_buffer(&self, set: u32, slot: u32) -> Option<Arc<GpuParamBlockBuffer>> {
        let index = self.slot(ParamType::ParamBlock, set, slot)?;
        lock(&self.state).param_blocks[index].clone()
    }

    pub fn texture(&self, set: u32, slot: u32) -> Option<Arc<TextureResource>> {
        let index = self.slot(ParamType::Texture, set, slot)?;
        lock(&self.state).textures[index].clone()
    }

    pub fn texture_surface(&self, set: u32, slot: u32) -> Option<TextureSurface> {
        let index = self.slot(ParamType::Texture, set, slot)?;
        Some(lock(&self.state).texture_surfaces[index])
    }

    pub fn load_store_texture(&self, set: u32, slot: u32) -> Option<Arc<TextureResource>> {
        let index = self.slot(ParamType::LoadStoreTexture, set, slot)?;
        lock(&self.state).load_store_textures[index].clone()
    }

    pub fn load_store_surface(&self, set: u32, slot: u32) -> Option<TextureSurface> {
        let index = self.slot(ParamType::LoadStoreTexture, set, slot)?;
        Some(lock(&self.state).load_store_surfaces[index])
    }

    pub fn buffer(&self, set: u32, slot: u32) -> Option<Arc<BufferResource>> {
        let index = self.slot(ParamType::Buffer, set, slot)?;
        lock(&self.state).buffers[index].clone()
    }

    pub fn sampler_state(&self, set: u32, slot: u32) -> Option<Arc<SamplerState>> {
        let index = self.slot(ParamType::SamplerState, set, slot)?;
        lock(&self.state).samplers[index].clone()
    }

    // ===== NAME QUERIES =====

    pub fn has_param(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info
            .param_desc(program_type)
            .is_some_and(|desc| desc.params.contains_key(name))
    }

    pub fn has_param_block(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info.binding_by_name(program_type, ParamType::ParamBlock, name).is_some()
    }

    pub fn has_texture(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info.binding_by_name(program_type, ParamType::Texture, name).is_some()
    }

    pub fn has_load_store_texture(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info.binding_by_name(program_type, ParamType::LoadStoreTexture, name).is_some()
    }

    pub fn has_buffer(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info.binding_by_name(program_type, ParamType::Buffer, name).is_some()
    }

    pub fn has_sampler_state(&self, program_type: GpuProgramType, name: &str) -> bool {
        self.param_info.binding_by_name(program_type, ParamType::SamplerState, name).is_some()
    }

    // ===== DATA PARAMETERS =====

    /// Typed handle on the data parameter `name` of the `program_type` stage
    ///
    /// None if the stage has no such parameter or its reflected type is not
    /// `T` (logged when debug checks are on).
    pub fn data_param<T: GpuDataParamType>(self: &Arc<Self>, program_type: GpuProgramType, name: &str) -> Option<GpuDataParam<T>> {
        let desc = self.param_info.param_desc(program_type)?.params.get(name)?.clone();
        if desc.param_type != T::TYPE {
            if self.debug_checks() {
                engine_error!("lumen::GpuParams", "'{}' is {:?}, requested as {:?}",
                    name, desc.param_type, T::TYPE);
            }
            return None;
        }
        Some(GpuDataParam::new(self.clone(), desc, self.transpose_matrices))
    }

    // ===== SYNC =====

    fn snapshot(&self, alloc: &mut FrameAlloc) -> SyncBlob {
        let state = lock(&self.state);
        let header = GpuParamsHeader::of(&self.param_info);

        let mut bytes = Vec::with_capacity(header.payload_size());
        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        bytes.extend_from_slice(bytemuck::cast_slice(&state.texture_surfaces));
        bytes.extend_from_slice(bytemuck::cast_slice(&state.load_store_surfaces));

        let texture = |resource: &Option<Arc<TextureResource>>| {
            match resource.as_ref().and_then(|r| r.gpu()) {
                Some(gpu) => SyncResource::Texture(gpu),
                None => SyncResource::Empty,
            }
        };

        let mut resources = Vec::with_capacity(header.num_resources());
        resources.extend(state.param_blocks.iter().map(|block| match block {
            Some(block) => SyncResource::Shared(block.gpu_buffer_cell()),
            None => SyncResource::Empty,
        }));
        resources.extend(state.textures.iter().map(texture));
        resources.extend(state.load_store_textures.iter().map(texture));
        resources.extend(state.buffers.iter().map(|buffer| {
            match buffer.as_ref().and_then(|b| b.gpu()) {
                Some(gpu) => SyncResource::Buffer(gpu),
                None => SyncResource::Empty,
            }
        }));
        resources.extend(state.samplers.iter().map(|sampler| match sampler {
            Some(sampler) => SyncResource::Sampler(sampler.clone()),
            None => SyncResource::Empty,
        }));

        SyncBlob::from_bytes::<GpuParamsHeader>(alloc, &bytes).with_resources(resources)
    }
}

impl CoreSyncSource for GpuParams {
    fn sync_to_core(&self, _dirty_flags: u32, alloc: &mut FrameAlloc) -> Option<SyncBlob> {
        Some(self.snapshot(alloc))
    }
}

impl ResourceListener for GpuParams {
    fn listener_resources(&self, resources: &mut Vec<ResourceId>) {
        let state = lock(&self.state);
        let textures = state.textures.iter().chain(state.load_store_textures.iter());
        resources.extend(textures.flatten().map(|texture| texture.id()));
        resources.extend(state.buffers.iter().flatten().map(|buffer| buffer.id()));
    }

    fn notify_resource_loaded(&self, resource: ResourceId) {
        engine_trace!("lumen::GpuParams", "Resource {} loaded", resource.raw());
        self.mark_dirty();
    }

    fn notify_resource_changed(&self, resource: ResourceId) {
        engine_trace!("lumen::GpuParams", "Resource {} changed", resource.raw());
        self.mark_dirty();
    }
}

impl Drop for GpuParams {
    fn drop(&mut self) {
        let key = lock(&self.state).listener_key.take();
        if let Some(key) = key {
            self.listeners.unregister_listener(key);
        }
    }
}

// ============================================================================
// CORE
// ============================================================================

/// Render-thread parameter table consumed by `RenderBackend::bind_gpu_params`
///
/// Arrays are indexed by sequential slot, like the proxy's.
pub struct GpuParamsCore {
    param_info: Arc<GpuPipelineParamInfo>,
    header: GpuParamsHeader,
    param_blocks: Vec<Option<GpuBufferCell>>,
    textures: Vec<Option<Arc<dyn GpuTexture>>>,
    texture_surfaces: Vec<TextureSurface>,
    load_store_textures: Vec<Option<Arc<dyn GpuTexture>>>,
    load_store_surfaces: Vec<TextureSurface>,
    buffers: Vec<Option<Arc<dyn GpuBuffer>>>,
    samplers: Vec<Option<Arc<SamplerState>>>,
    sync_count: u64,
}

impl GpuParamsCore {
    fn new(param_info: Arc<GpuPipelineParamInfo>) -> Self {
        let header = GpuParamsHeader::of(&param_info);
        Self {
            param_info,
            header,
            param_blocks: vec![None; header.num_param_blocks as usize],
            textures: vec![None; header.num_textures as usize],
            texture_surfaces: vec![TextureSurface::COMPLETE; header.num_textures as usize],
            load_store_textures: vec![None; header.num_load_store_textures as usize],
            load_store_surfaces: vec![TextureSurface::COMPLETE; header.num_load_store_textures as usize],
            buffers: vec![None; header.num_buffers as usize],
            samplers: vec![None; header.num_samplers as usize],
            sync_count: 0,
        }
    }

    pub fn param_info(&self) -> &Arc<GpuPipelineParamInfo> {
        &self.param_info
    }

    /// Backend buffer of the param block at sequential index `index`
    pub fn param_block(&self, index: u32) -> Option<&Arc<dyn GpuBuffer>> {
        self.param_blocks.get(index as usize)?.as_ref()?.get()
    }

    pub fn texture(&self, index: u32) -> Option<&Arc<dyn GpuTexture>> {
        self.textures.get(index as usize)?.as_ref()
    }

    pub fn texture_surface(&self, index: u32) -> Option<TextureSurface> {
        self.texture_surfaces.get(index as usize).copied()
    }

    pub fn load_store_texture(&self, index: u32) -> Option<&Arc<dyn GpuTexture>> {
        self.load_store_textures.get(index as usize)?.as_ref()
    }

    pub fn load_store_surface(&self, index: u32) -> Option<TextureSurface> {
        self.load_store_surfaces.get(index as usize).copied()
    }

    pub fn buffer(&self, index: u32) -> Option<&Arc<dyn GpuBuffer>> {
        self.buffers.get(index as usize)?.as_ref()
    }

    pub fn sampler_state(&self, index: u32) -> Option<&Arc<SamplerState>> {
        self.samplers.get(index as usize)?.as_ref()
    }

    /// Number of bindings holding a backend object
    pub fn bound_resource_count(&self) -> usize {
        let blocks = (0..self.header.num_param_blocks).filter(|&i| self.param_block(i).is_some()).count();
        blocks
            + self.textures.iter().flatten().count()
            + self.load_store_textures.iter().flatten().count()
            + self.buffers.iter().flatten().count()
            + self.samplers.iter().flatten().count()
    }

    /// Number of snapshots applied
    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }
}

impl CoreObject for GpuParamsCore {
    fn sync_to_core(&mut self, data: SyncData<'_>, _ctx: &CoreContext) {
        let mut reader = data.expect_payload::<GpuParamsHeader>(self.header.payload_size());
        let header = reader.read::<GpuParamsHeader>();
        let resources = data.resources();
        if header != self.header || resources.len() != self.header.num_resources() {
            engine_error!("lumen::GpuParamsCore",
                "Snapshot does not match the layout: {:?} with {} resources, expected {:?}",
                header, resources.len(), self.header);
            return;
        }

        self.texture_surfaces = reader.read_vec(header.num_textures as usize);
        self.load_store_surfaces = reader.read_vec(header.num_load_store_textures as usize);

        let mut resources = resources.iter();
        for slot in self.param_blocks.iter_mut() {
            *slot = resources.next().and_then(|r| r.shared::<std::sync::OnceLock<Arc<dyn GpuBuffer>>>());
        }
        for slot in self.textures.iter_mut().chain(self.load_store_textures.iter_mut()) {
            *slot = resources.next().and_then(|r| r.texture().cloned());
        }
        for slot in self.buffers.iter_mut() {
            *slot = resources.next().and_then(|r| r.buffer().cloned());
        }
        for slot in self.samplers.iter_mut() {
            *slot = resources.next().and_then(|r| r.sampler().cloned());
        }
        self.sync_count += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "gpu_params_tests.rs"]
mod tests;
