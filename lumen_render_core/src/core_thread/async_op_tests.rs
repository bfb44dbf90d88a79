//! Unit tests for async_op.rs

use std::thread;
use std::time::Duration;
use crate::core_thread::async_op::{AsyncOp, CoreThreadGuard, is_core_thread};

#[test]
fn test_pending_then_complete() {
    let op = AsyncOp::<u32>::new();
    assert!(!op.has_completed());
    assert_eq!(op.try_value(), None);

    op.complete(7);
    assert!(op.has_completed());
    assert_eq!(op.try_value(), Some(7));
    assert_eq!(op.block_until_complete(), 7);
}

#[test]
fn test_second_completion_is_ignored() {
    let op = AsyncOp::completed("first");
    op.complete("second");
    assert_eq!(op.try_value(), Some("first"));
}

#[test]
fn test_block_until_complete_wakes_on_other_thread() {
    let op = AsyncOp::<String>::new();
    let producer = op.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        producer.complete("compiled".to_string());
    });

    assert_eq!(op.block_until_complete(), "compiled");
    handle.join().unwrap();
}

#[test]
fn test_timeout_returns_none_when_pending() {
    let op = AsyncOp::<u8>::new();
    assert_eq!(op.block_until_complete_timeout(Duration::from_millis(5)), None);
    op.complete(1);
    assert_eq!(op.block_until_complete_timeout(Duration::from_millis(5)), Some(1));
}

#[test]
fn test_core_thread_guard_scopes_flag() {
    assert!(!is_core_thread());
    {
        let _guard = CoreThreadGuard::enter();
        assert!(is_core_thread());
        {
            let _inner = CoreThreadGuard::enter();
            assert!(is_core_thread());
        }
        assert!(is_core_thread());
    }
    assert!(!is_core_thread());
}

#[test]
fn test_completed_value_readable_on_core_thread() {
    let op = AsyncOp::completed(3u32);
    let _guard = CoreThreadGuard::enter();
    assert_eq!(op.block_until_complete(), 3);
}

#[test]
#[should_panic(expected = "core thread")]
fn test_blocking_on_core_thread_panics() {
    let op = AsyncOp::<u32>::new();
    let _guard = CoreThreadGuard::enter();
    op.block_until_complete();
}
