/// Backend buffer contract

use std::any::Any;
use std::fmt::Debug;
use crate::error::Result;

/// How a buffer is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Parameter (uniform/constant) block
    Uniform,
    /// Generic read/write buffer
    Storage,
    /// Vertex data
    Vertex,
    /// Index data
    Index,
}

/// Buffer creation descriptor
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Debug name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Binding usage
    pub usage: BufferUsage,
}

/// Backend buffer handle
pub trait GpuBuffer: Send + Sync + Debug {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Upload `data` at byte `offset`
    ///
    /// # Errors
    ///
    /// Returns an error if `offset + data.len()` exceeds the buffer size.
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
