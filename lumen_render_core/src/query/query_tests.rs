//! Unit tests for query.rs

use std::sync::{Arc, Mutex};
use crate::device::mock_render_backend::MockRenderBackend;
use crate::query::{QueryManager, QueryState};

fn setup() -> (Arc<Mutex<MockRenderBackend>>, QueryManager) {
    let (mock, backend) = MockRenderBackend::shared();
    (mock, QueryManager::new(backend))
}

#[test]
fn test_timer_state_machine() {
    let (mock, mut manager) = setup();
    let query = manager.create_timer_query(0).unwrap();
    assert_eq!(query.state(), QueryState::Idle);

    query.begin();
    assert_eq!(query.state(), QueryState::Active);
    query.end();
    assert_eq!(query.state(), QueryState::Pending);
    assert!(!query.is_ready());
    assert!(query.elapsed_ms().is_none());

    mock.lock().unwrap().advance_gpu_frame();

    assert!(query.is_ready());
    assert_eq!(query.state(), QueryState::Ready);
    assert_eq!(query.elapsed_ms(), Some(1.0));
    assert!(query.num_samples().is_none());
}

#[test]
fn test_event_query_pending_on_begin() {
    let (mock, mut manager) = setup();
    let query = manager.create_event_query(0).unwrap();

    query.begin();
    assert_eq!(query.state(), QueryState::Pending);

    mock.lock().unwrap().advance_gpu_frame();
    assert!(query.is_ready());
}

#[test]
fn test_occlusion_results() {
    let (mock, mut manager) = setup();
    let precise = manager.create_occlusion_query(false, 0).unwrap();
    let binary = manager.create_occlusion_query(true, 0).unwrap();
    for query in [&precise, &binary] {
        query.begin();
        query.end();
    }

    mock.lock().unwrap().advance_gpu_frame();

    assert_eq!(precise.num_samples(), Some(64));
    assert_eq!(binary.num_samples(), Some(1));
}

#[test]
fn test_end_without_begin_ignored() {
    let (_mock, mut manager) = setup();
    let query = manager.create_timer_query(0).unwrap();

    query.end();

    assert_eq!(query.state(), QueryState::Idle);
}

#[test]
fn test_begin_while_in_flight_ignored() {
    let (_mock, mut manager) = setup();
    let query = manager.create_timer_query(0).unwrap();
    query.begin();
    query.end();

    query.begin();

    assert_eq!(query.state(), QueryState::Pending);
}

#[test]
fn test_query_can_be_reused() {
    let (mock, mut manager) = setup();
    let query = manager.create_timer_query(0).unwrap();
    query.begin();
    query.end();
    mock.lock().unwrap().advance_gpu_frame();
    manager.update();
    assert_eq!(query.state(), QueryState::Finalized);

    query.begin();

    assert_eq!(query.state(), QueryState::Active);
    assert!(query.elapsed_ms().is_none());
}
