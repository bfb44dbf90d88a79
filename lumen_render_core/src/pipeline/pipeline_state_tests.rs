//! Unit tests for pipeline_state.rs

use std::sync::Arc;
use crate::config::RenderCoreConfig;
use crate::context::RenderContext;
use crate::core_thread::CoreThread;
use crate::device::mock_render_backend::{mock_context, run_frame, MockProgramCompiler, MockRenderBackend};
use crate::device::GpuProgramType;
use crate::error::Error;
use crate::pipeline::{
    ComputePipelineState, GraphicsPipelineState, GraphicsPipelineStateCore,
    GraphicsPipelineStateDesc, ParamType,
};
use crate::program::{GpuParamDesc, GpuProgram, GpuProgramDesc};
use crate::state::{CullMode, RasterizerStateDesc};
use std::sync::Mutex;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn setup() -> (Arc<Mutex<MockRenderBackend>>, RenderContext, CoreThread) {
    let compiler = MockProgramCompiler::new()
        .with_program("vs", GpuParamDesc::new().add_param_block("PerObject", 0, 0, 64).add_texture("height", 0, 2))
        .with_program("fs", GpuParamDesc::new().add_texture("height", 0, 2).add_sampler("linear", 0, 3))
        .with_program("cs", GpuParamDesc::new().add_load_store_texture("output", 0, 0));
    mock_context(RenderCoreConfig::default(), Some(compiler))
}

fn program(context: &RenderContext, name: &str, program_type: GpuProgramType, source: &str) -> Arc<GpuProgram> {
    GpuProgram::new(GpuProgramDesc::new(name, program_type, "mock", source), context)
}

fn compiled_pair(context: &RenderContext, core: &mut CoreThread) -> (Arc<GpuProgram>, Arc<GpuProgram>) {
    let vs = program(context, "vs", GpuProgramType::Vertex, "vs");
    let fs = program(context, "fs", GpuProgramType::Fragment, "fs");
    run_frame(context, core);
    (vs, fs)
}

// ============================================================================
// GRAPHICS
// ============================================================================

#[test]
fn test_graphics_pipeline_created_on_core_thread() {
    let (mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);

    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("opaque", vs, fs), &context).unwrap();
    assert!(!pipeline.has_completed());

    run_frame(&context, &mut core);

    assert!(pipeline.is_created());
    assert!(pipeline.creation_error().is_none());
    assert!(mock.lock().unwrap().commands.contains(&"create_graphics_pipeline:opaque".to_string()));
    let core_pipeline = core.get::<GraphicsPipelineStateCore>(pipeline.core_id()).unwrap();
    assert!(core_pipeline.is_created());
    assert_eq!(core_pipeline.name(), "opaque");
}

#[test]
fn test_layout_merges_stages() {
    let (_mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);

    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", vs, fs), &context).unwrap();
    let info = pipeline.param_info();

    assert_eq!(info.num_elements(ParamType::Texture), 1);
    assert_eq!(info.num_elements(ParamType::ParamBlock), 1);
    assert_eq!(info.num_elements(ParamType::SamplerState), 1);
    assert!(pipeline.program(GpuProgramType::Geometry).is_none());
    assert_eq!(pipeline.program(GpuProgramType::Fragment).unwrap().name(), "fs");
}

#[test]
fn test_missing_states_use_defaults() {
    let (_mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);

    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", vs, fs), &context).unwrap();
    let default_blend = context.render_states().default_blend_state().unwrap();

    assert!(Arc::ptr_eq(pipeline.blend_state(), &default_blend));
    assert_eq!(pipeline.rasterizer_state().desc().cull_mode, CullMode::Back);
}

#[test]
fn test_explicit_state_kept() {
    let (_mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);
    let wireframe = context.render_states().rasterizer_state(&RasterizerStateDesc {
        cull_mode: CullMode::None,
        ..Default::default()
    }).unwrap();

    let desc = GraphicsPipelineStateDesc {
        rasterizer_state: Some(wireframe.clone()),
        ..GraphicsPipelineStateDesc::new("p", vs, fs)
    };
    let pipeline = GraphicsPipelineState::new(desc, &context).unwrap();

    assert!(Arc::ptr_eq(pipeline.rasterizer_state(), &wireframe));
}

#[test]
fn test_uncompiled_program_rejected() {
    let (_mock, context, _core) = setup();
    let vs = program(&context, "vs", GpuProgramType::Vertex, "vs");
    let fs = program(&context, "fs", GpuProgramType::Fragment, "fs");

    let result = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", vs, fs), &context);
    assert!(matches!(result, Err(Error::NotCompiled(_))));
}

#[test]
fn test_failed_program_rejected() {
    let (_mock, context, mut core) = setup();
    let vs = program(&context, "vs", GpuProgramType::Vertex, "error");
    let fs = program(&context, "fs", GpuProgramType::Fragment, "fs");
    run_frame(&context, &mut core);

    let result = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", vs, fs), &context);
    assert!(matches!(result, Err(Error::NotCompiled(message)) if message.contains("failed to compile")));
}

#[test]
fn test_wrong_stage_rejected() {
    let (_mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);

    let result = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", fs, vs), &context);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_missing_vertex_program_rejected() {
    let (_mock, context, _core) = setup();

    let result = GraphicsPipelineState::new(GraphicsPipelineStateDesc::default(), &context);
    assert!(matches!(result, Err(Error::InvalidParameter(_))));
}

#[test]
fn test_backend_failure_is_creation_error() {
    let (mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);
    mock.lock().unwrap().fail_pipelines = true;

    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("broken", vs, fs), &context).unwrap();
    run_frame(&context, &mut core);

    assert!(pipeline.has_completed());
    assert!(!pipeline.is_created());
    assert!(pipeline.creation_error().unwrap().contains("broken"));
    assert!(!pipeline.block_until_created());
    assert!(core.bind_graphics_pipeline(&pipeline).is_err());
}

#[test]
fn test_bind_before_core_exists_fails() {
    let (_mock, context, mut core) = setup();
    let (vs, fs) = compiled_pair(&context, &mut core);

    let pipeline = GraphicsPipelineState::new(GraphicsPipelineStateDesc::new("p", vs, fs), &context).unwrap();

    assert!(matches!(core.bind_graphics_pipeline(&pipeline), Err(Error::InvalidResource(_))));
}

// ============================================================================
// COMPUTE
// ============================================================================

#[test]
fn test_compute_pipeline() {
    let (mock, context, mut core) = setup();
    let cs = program(&context, "cs", GpuProgramType::Compute, "cs");
    run_frame(&context, &mut core);

    let pipeline = ComputePipelineState::new(cs, &context).unwrap();
    run_frame(&context, &mut core);

    assert!(pipeline.is_created());
    assert_eq!(pipeline.name(), "cs");
    assert_eq!(pipeline.param_info().num_elements(ParamType::LoadStoreTexture), 1);
    core.bind_compute_pipeline(&pipeline).unwrap();
    core.dispatch(8, 8, 1).unwrap();

    let commands = mock.lock().unwrap().commands.clone();
    assert!(commands.contains(&"bind_compute_pipeline:cs".to_string()));
    assert_eq!(commands.last().unwrap(), "dispatch:8:8:1");
}

#[test]
fn test_compute_requires_compute_program() {
    let (_mock, context, mut core) = setup();
    let (vs, _fs) = compiled_pair(&context, &mut core);

    assert!(matches!(ComputePipelineState::new(vs, &context), Err(Error::InvalidParameter(_))));
}
