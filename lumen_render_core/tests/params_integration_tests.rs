//! Integration tests for parameter tables
//!
//! Programs are compiled by the null compiler, pipelines built by the null
//! backend, and resources loaded asynchronously: the tables must pick up
//! loads and replacements through the resource listeners.
//!
//! Run with: cargo test --test params_integration_tests

mod test_utils;

use std::sync::Arc;
use lumen_render_core::lumen::{RenderContext, RenderCoreConfig};
use lumen_render_core::lumen::core::CoreThread;
use lumen_render_core::lumen::device::{
    BufferUsage, GpuBuffer, GpuProgramType, GpuTexture, TextureSurface,
};
use lumen_render_core::lumen::params::{GpuParams, GpuParamsCore};
use lumen_render_core::lumen::pipeline::{
    ComputePipelineState, GraphicsPipelineState, GraphicsPipelineStateDesc, ParamType,
};
use lumen_render_core::lumen::program::{GpuProgram, GpuProgramDesc};
use lumen_render_core::lumen::resource::{BufferResource, TextureResource};
use lumen_render_null::{NullBuffer, NullCommand, NullTexture};
use test_utils::{null_context, run_frame};

// ============================================================================
// TEST PROGRAMS
// ============================================================================

const VERTEX: &str = "\
#block PerView 0 0 64
#param view_proj mat4 PerView 0
";

const FRAGMENT: &str = "\
#block PerView 0 0 64
#texture albedo 1 0
#texture normal 1 1
#sampler linear 1 2
";

const SIMULATE: &str = "\
#block Settings 0 0 16
#param dt float Settings 0
#buffer particles 0 1
#rwtexture density 0 2
";

fn graphics_pipeline(context: &RenderContext, core: &mut CoreThread) -> Arc<GraphicsPipelineState> {
    let vs = GpuProgram::new(GpuProgramDesc::new("vs", GpuProgramType::Vertex, "null", VERTEX), context);
    let fs = GpuProgram::new(GpuProgramDesc::new("fs", GpuProgramType::Fragment, "null", FRAGMENT), context);
    run_frame(context, core);
    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("lit", vs, fs), context).unwrap();
    run_frame(context, core);
    assert!(pipeline.is_created());
    pipeline
}

fn compute_pipeline(context: &RenderContext, core: &mut CoreThread) -> Arc<ComputePipelineState> {
    let cs = GpuProgram::new(GpuProgramDesc::new("simulate", GpuProgramType::Compute, "null", SIMULATE), context);
    run_frame(context, core);
    let pipeline = ComputePipelineState::new(cs, context).unwrap();
    run_frame(context, core);
    assert!(pipeline.is_created());
    pipeline
}

fn texture(name: &str, size: u32) -> Arc<dyn GpuTexture> {
    Arc::new(NullTexture::new(name, size, size))
}

fn core_table<'a>(core: &'a CoreThread, params: &GpuParams) -> &'a GpuParamsCore {
    core.get::<GpuParamsCore>(params.core_id()).unwrap()
}

// ============================================================================
// ASYNC RESOURCES
// ============================================================================

#[test]
fn test_integration_texture_bound_before_load() {
    let (_null, context, mut core) = null_context(RenderCoreConfig::default());
    let pipeline = graphics_pipeline(&context, &mut core);
    let params = GpuParams::for_graphics(&pipeline, &context);
    let albedo_idx = pipeline.param_info().sequential_slot(ParamType::Texture, 1, 0);

    let albedo = TextureResource::new_loading("albedo.png");
    assert!(params.set_texture_by_name(GpuProgramType::Fragment, "albedo", Some(albedo.clone()), TextureSurface::COMPLETE));
    run_frame(&context, &mut core);
    assert!(core_table(&core, &params).texture(albedo_idx).is_none());

    // Loader thread finishes, the table is re-synced on the next frame
    albedo.complete_load(texture("albedo.png", 512), context.resource_listeners());
    run_frame(&context, &mut core);

    let bound = core_table(&core, &params).texture(albedo_idx).unwrap();
    assert_eq!(bound.info().width, 512);
}

#[test]
fn test_integration_replaced_texture_reaches_every_table() {
    let (_null, context, mut core) = null_context(RenderCoreConfig::default());
    let pipeline = graphics_pipeline(&context, &mut core);
    let first = GpuParams::for_graphics(&pipeline, &context);
    let second = GpuParams::for_graphics(&pipeline, &context);
    let normal_idx = pipeline.param_info().sequential_slot(ParamType::Texture, 1, 1);

    let normal = TextureResource::new_loaded("normal.png", texture("normal.png", 64));
    first.set_texture(1, 1, Some(normal.clone()), TextureSurface::COMPLETE);
    second.set_texture(1, 1, Some(normal.clone()), TextureSurface::COMPLETE);
    run_frame(&context, &mut core);
    assert_eq!(context.resource_listeners().dependent_count(normal.id()), 2);

    normal.replace(texture("normal.png", 128), context.resource_listeners());
    run_frame(&context, &mut core);

    for params in [&first, &second] {
        let table = core_table(&core, params);
        assert_eq!(table.texture(normal_idx).unwrap().info().width, 128);
        assert_eq!(table.sync_count(), 2);
    }
}

#[test]
fn test_integration_unrelated_resource_does_not_resync() {
    let (_null, context, mut core) = null_context(RenderCoreConfig::default());
    let pipeline = graphics_pipeline(&context, &mut core);
    let params = GpuParams::for_graphics(&pipeline, &context);
    params.set_texture(1, 0, Some(TextureResource::new_loaded("a", texture("a", 4))), TextureSurface::COMPLETE);
    run_frame(&context, &mut core);

    let other = TextureResource::new_loaded("b", texture("b", 4));
    other.replace(texture("b", 8), context.resource_listeners());
    run_frame(&context, &mut core);

    assert_eq!(core_table(&core, &params).sync_count(), 1);
}

#[test]
fn test_integration_sampler_from_state_cache() {
    let (_null, context, mut core) = null_context(RenderCoreConfig::default());
    let pipeline = graphics_pipeline(&context, &mut core);
    let params = GpuParams::for_graphics(&pipeline, &context);
    let sampler = context.render_states().default_sampler_state().unwrap();

    assert!(params.set_sampler_state_by_name(GpuProgramType::Fragment, "linear", Some(sampler.clone())));
    run_frame(&context, &mut core);

    let idx = pipeline.param_info().sequential_slot(ParamType::SamplerState, 1, 2);
    let bound = core_table(&core, &params).sampler_state(idx).unwrap();
    assert!(Arc::ptr_eq(bound, &sampler));
}

// ============================================================================
// COMPUTE
// ============================================================================

#[test]
fn test_integration_compute_dispatch_with_buffers() {
    let (null, context, mut core) = null_context(RenderCoreConfig::default());
    let pipeline = compute_pipeline(&context, &mut core);
    let params = GpuParams::for_compute(&pipeline, &context);

    let particles: Arc<dyn GpuBuffer> = Arc::new(NullBuffer::new("particles", 4096, BufferUsage::Storage));
    let density = TextureResource::new_loaded("density", texture("density", 32));
    assert!(params.set_buffer_by_name(GpuProgramType::Compute, "particles",
        Some(BufferResource::new_loaded("particles", particles))));
    assert!(params.set_load_store_texture_by_name(GpuProgramType::Compute, "density",
        Some(density), TextureSurface::single(0, 0)));
    run_frame(&context, &mut core);

    let table = core_table(&core, &params);
    let rw_idx = pipeline.param_info().sequential_slot(ParamType::LoadStoreTexture, 0, 2);
    assert_eq!(table.load_store_surface(rw_idx), Some(TextureSurface::single(0, 0)));
    assert_eq!(table.bound_resource_count(), 2);

    core.bind_compute_pipeline(&pipeline).unwrap();
    core.bind_gpu_params(&params).unwrap();
    core.dispatch(8, 8, 1).unwrap();

    let null = null.lock().unwrap();
    assert_eq!(null.commands().last(), Some(&NullCommand::Dispatch { x: 8, y: 8, z: 1 }));
    assert_eq!(null.stats().dispatches, 1);
}
