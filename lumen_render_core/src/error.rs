//! Error types for the Lumen render core
//!
//! This module defines the error types used throughout the render core,
//! including backend creation failures, state cache limits and parameter lookups.
//!
//! Structural (programmer) errors such as a sync blob size mismatch are not
//! represented here: they are logged and then panic. Not-ready conditions are
//! status accessors, and lookup misses are `Option`s.

use std::fmt;

/// Result type for render core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Render core errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (creation failure, unsupported feature, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (buffer, texture, program, etc.)
    InvalidResource(String),

    /// Initialization failed (context, core thread, configuration)
    InitializationFailed(String),

    /// Invalid parameter (unknown name, out of range write, type mismatch)
    InvalidParameter(String),

    /// The dense id namespace of a state category is exhausted
    StateIdsExhausted {
        /// State category ("blend", "rasterizer", ...)
        kind: &'static str,
        /// Maximum number of ids for the category
        max: u32,
    },

    /// A GPU program was used before it finished compiling (or failed to)
    NotCompiled(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::StateIdsExhausted { kind, max } => {
                write!(f, "State ids exhausted: {} states limited to {} ids", kind, max)
            }
            Error::NotCompiled(msg) => write!(f, "Program not compiled: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
