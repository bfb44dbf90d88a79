//! Unit tests for the device contracts and the mock backend

use crate::device::mock_render_backend::{MockBuffer, MockRenderBackend};
use crate::device::*;

// ============================================================================
// PROGRAM TYPES
// ============================================================================

#[test]
fn test_program_type_indices_are_dense() {
    for (i, program_type) in GpuProgramType::ALL.iter().enumerate() {
        assert_eq!(program_type.index(), i);
    }
    assert_eq!(GpuProgramType::ALL.len(), GpuProgramType::COUNT);
    assert!(GpuProgramType::Hull.is_graphics());
    assert!(!GpuProgramType::Compute.is_graphics());
    assert_eq!(GpuProgramType::Fragment.name(), "fragment");
}

// ============================================================================
// DESCRIPTORS
// ============================================================================

#[test]
fn test_texture_surface_complete() {
    assert_eq!(TextureSurface::default(), TextureSurface::COMPLETE);
    let single = TextureSurface::single(2, 1);
    assert_eq!(single.num_mip_levels, 1);
    assert_eq!(bytemuck::bytes_of(&single).len(), 16);
}

#[test]
fn test_backend_caps_default() {
    let caps = BackendCaps::default();
    assert_eq!(caps.matrix_order, MatrixOrder::ColumnMajor);
    assert!(caps.supports_compute);
}

#[test]
fn test_compiled_program_constructors() {
    let ok = CompiledProgram::compiled(vec![1, 2, 3], Default::default());
    assert!(ok.success);
    assert!(ok.param_desc.is_some());

    let failed = CompiledProgram::failed("line 3: unknown directive");
    assert!(!failed.success);
    assert!(failed.bytecode.is_empty());
    assert!(failed.param_desc.is_none());
    assert!(failed.error_message.contains("line 3"));
}

// ============================================================================
// MOCK BACKEND
// ============================================================================

#[test]
fn test_mock_buffer_write_bounds() {
    let buffer = MockBuffer::new("params", 8);
    assert!(buffer.write(4, &[1, 2, 3, 4]).is_ok());
    assert_eq!(buffer.contents(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    assert!(buffer.write(6, &[1, 2, 3]).is_err());
}

#[test]
fn test_mock_query_completes_after_gpu_frame() {
    let mut backend = MockRenderBackend::new();
    let mut query = backend.create_query(QueryKind::Timer, 0).unwrap();
    assert!(!query.is_ready());

    query.begin();
    query.end();
    assert!(!query.is_ready());

    backend.advance_gpu_frame();
    assert!(query.is_ready());
    assert_eq!(query.result(), QueryResult::Timer { elapsed_ms: 1.0 });
}

#[test]
fn test_mock_records_commands() {
    let mut backend = MockRenderBackend::new();
    backend.draw(0, 3, 1).unwrap();
    backend.dispatch(8, 8, 1).unwrap();
    assert_eq!(backend.commands, vec!["draw:0:3:1", "dispatch:8:8:1"]);
}
