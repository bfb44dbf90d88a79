//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("blend state creation failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("blend state creation failed"));
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(format!("{}", err), "Out of GPU memory");
}

#[test]
fn test_invalid_parameter_display() {
    let err = Error::InvalidParameter("gWorld not found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid parameter"));
    assert!(display.contains("gWorld"));
}

#[test]
fn test_state_ids_exhausted_display() {
    let err = Error::StateIdsExhausted { kind: "blend", max: 1024 };
    let display = format!("{}", err);
    assert!(display.contains("blend"));
    assert!(display.contains("1024"));
}

#[test]
fn test_not_compiled_display() {
    let err = Error::NotCompiled("vs_main".to_string());
    assert!(format!("{}", err).contains("vs_main"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::OutOfMemory;
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::InitializationFailed("init".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::OutOfMemory);
}

#[test]
fn test_error_debug() {
    let debug = format!("{:?}", Error::InvalidResource("tex".to_string()));
    assert!(debug.contains("InvalidResource"));
}

// ============================================================================
// RESULT TYPE
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::OutOfMemory)
    }
    fn outer() -> Result<u32> {
        let value = inner()?;
        Ok(value + 1)
    }
    assert_eq!(outer(), Err(Error::OutOfMemory));
}

#[test]
fn test_engine_err_macro_builds_backend_error() {
    let err = crate::engine_err!("lumen::test", "code {}", 7);
    assert_eq!(err, Error::BackendError("code 7".to_string()));
}

#[test]
fn test_engine_bail_macro_returns_early() {
    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("lumen::test", "bailing with {}", flag);
        }
        Ok(1)
    }
    assert!(fails(true).is_err());
    assert_eq!(fails(false), Ok(1));
}
