/// CoreThread - render-thread owner of every core object
///
/// Not a thread by itself: the engine moves it onto its render thread and
/// calls `process_pending` (or `process_next_blocking`) once per frame, then
/// issues draws through the binding helpers.

use std::time::Duration;
use rustc_hash::FxHashMap;
use crate::core_thread::{
    CoreContext, CoreObject, CoreObjectId, CoreSyncPacket, CoreThreadGuard, SyncData,
};
use crate::error::{Error, Result};
use crate::params::{GpuParams, GpuParamsCore};
use crate::pipeline::{
    ComputePipelineState, ComputePipelineStateCore, GraphicsPipelineState,
    GraphicsPipelineStateCore,
};
use crate::utils::lock;
use crate::{engine_debug, engine_warn};

struct CoreSlot {
    object: Box<dyn CoreObject>,
    type_name: &'static str,
}

/// Render-thread side of the proxy/core model
pub struct CoreThread {
    receiver: flume::Receiver<CoreSyncPacket>,
    context: CoreContext,
    objects: FxHashMap<CoreObjectId, CoreSlot>,
    frames_processed: u64,
    last_frame: Option<u64>,
}

impl CoreThread {
    pub(crate) fn new(receiver: flume::Receiver<CoreSyncPacket>, context: CoreContext) -> Self {
        Self {
            receiver,
            context,
            objects: FxHashMap::default(),
            frames_processed: 0,
            last_frame: None,
        }
    }

    pub fn context(&self) -> &CoreContext {
        &self.context
    }

    // ===== PACKET PROCESSING =====

    /// Apply every packet already sent, without blocking
    ///
    /// Returns the number of packets applied.
    pub fn process_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(packet) = self.receiver.try_recv() {
            self.apply_packet(packet);
            count += 1;
        }
        count
    }

    /// Wait for the next packet and apply it
    ///
    /// Returns false once every sender is gone.
    pub fn process_next_blocking(&mut self) -> bool {
        match self.receiver.recv() {
            Ok(packet) => {
                self.apply_packet(packet);
                true
            }
            Err(_) => false,
        }
    }

    /// Wait at most `timeout` for the next packet and apply it
    pub fn process_next_timeout(&mut self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(packet) => {
                self.apply_packet(packet);
                true
            }
            Err(_) => false,
        }
    }

    fn apply_packet(&mut self, packet: CoreSyncPacket) {
        let _guard = CoreThreadGuard::enter();
        let CoreSyncPacket { frame, arena, inits, syncs, commands, destroys } = packet;

        if let Some(last) = self.last_frame {
            if frame != last + 1 {
                engine_warn!("lumen::CoreThread",
                    "Frame {} applied after frame {}", frame, last);
            }
        }

        // 1. Initializations
        for (id, type_name, factory) in inits {
            let mut object = factory();
            if let Err(err) = object.initialize(&self.context) {
                engine_warn!("lumen::CoreThread",
                    "{} failed to initialize: {}", type_name, err);
            }
            self.objects.insert(id, CoreSlot { object, type_name });
        }

        // 2. Syncs, in enqueue order
        for (id, blob) in &syncs {
            match self.objects.get_mut(id) {
                Some(slot) => slot.object.sync_to_core(SyncData::new(blob, &arena), &self.context),
                None => engine_warn!("lumen::CoreThread",
                    "Sync for unknown core object ({})", blob.type_name()),
            }
        }

        // 3. Commands
        for command in commands {
            command(self);
        }

        // 4. Destructions
        for id in destroys {
            if let Some(mut slot) = self.objects.remove(&id) {
                slot.object.destroy(&self.context);
                engine_debug!("lumen::CoreThread", "Destroyed {}", slot.type_name);
            }
        }

        self.frames_processed += 1;
        self.last_frame = Some(frame);
    }

    // ===== OBJECT ACCESS =====

    /// Core object of type `T` for `id`
    pub fn get<T: CoreObject>(&self, id: CoreObjectId) -> Option<&T> {
        self.objects.get(&id)?.object.as_any().downcast_ref::<T>()
    }

    /// Mutable core object of type `T` for `id`
    pub fn get_mut<T: CoreObject>(&mut self, id: CoreObjectId) -> Option<&mut T> {
        self.objects.get_mut(&id)?.object.as_any_mut().downcast_mut::<T>()
    }

    pub fn contains(&self, id: CoreObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of live core objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of packets applied
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    // ===== DRAW HELPERS =====

    fn core_of<T: CoreObject>(&self, id: CoreObjectId, what: &str) -> Result<&T> {
        self.get::<T>(id).ok_or_else(|| {
            Error::InvalidResource(format!("{} has no core object yet", what))
        })
    }

    /// Bind a graphics pipeline
    ///
    /// # Errors
    ///
    /// If the pipeline's core object does not exist yet, or its backend
    /// pipeline failed to build (the caller skips the draw).
    pub fn bind_graphics_pipeline(&mut self, pipeline: &GraphicsPipelineState) -> Result<()> {
        let _guard = CoreThreadGuard::enter();
        let core = self.core_of::<GraphicsPipelineStateCore>(pipeline.core_id(), "graphics pipeline")?;
        if !core.is_created() {
            return Err(Error::InvalidResource(format!(
                "graphics pipeline '{}' was not created", core.name()
            )));
        }
        lock(self.context.backend()).bind_graphics_pipeline(core)
    }

    /// Bind a compute pipeline
    pub fn bind_compute_pipeline(&mut self, pipeline: &ComputePipelineState) -> Result<()> {
        let _guard = CoreThreadGuard::enter();
        let core = self.core_of::<ComputePipelineStateCore>(pipeline.core_id(), "compute pipeline")?;
        if !core.is_created() {
            return Err(Error::InvalidResource(format!(
                "compute pipeline '{}' was not created", core.name()
            )));
        }
        lock(self.context.backend()).bind_compute_pipeline(core)
    }

    /// Bind a parameter table
    pub fn bind_gpu_params(&mut self, params: &GpuParams) -> Result<()> {
        let _guard = CoreThreadGuard::enter();
        let core = self.core_of::<GpuParamsCore>(params.core_id(), "gpu params")?;
        lock(self.context.backend()).bind_gpu_params(core)
    }

    pub fn draw(&mut self, vertex_offset: u32, vertex_count: u32, instance_count: u32) -> Result<()> {
        let _guard = CoreThreadGuard::enter();
        lock(self.context.backend()).draw(vertex_offset, vertex_count, instance_count)
    }

    pub fn dispatch(&mut self, group_count_x: u32, group_count_y: u32, group_count_z: u32) -> Result<()> {
        let _guard = CoreThreadGuard::enter();
        lock(self.context.backend()).dispatch(group_count_x, group_count_y, group_count_z)
    }
}

impl Drop for CoreThread {
    fn drop(&mut self) {
        for (_, mut slot) in self.objects.drain() {
            slot.object.destroy(&self.context);
        }
    }
}

#[cfg(test)]
#[path = "core_thread_tests.rs"]
mod tests;
