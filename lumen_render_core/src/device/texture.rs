/// Backend texture contract

use std::any::Any;
use std::fmt::Debug;
use bytemuck::{Pod, Zeroable};

/// Texture dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
}

/// Sub-range of a texture bound to a parameter slot
///
/// A count of 0 means "every remaining mip level / face".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct TextureSurface {
    pub mip_level: u32,
    pub num_mip_levels: u32,
    pub face: u32,
    pub num_faces: u32,
}

impl TextureSurface {
    /// The whole texture
    pub const COMPLETE: TextureSurface = TextureSurface {
        mip_level: 0,
        num_mip_levels: 0,
        face: 0,
        num_faces: 0,
    };

    /// A single mip level of a single face (typical load-store binding)
    pub fn single(mip_level: u32, face: u32) -> Self {
        Self { mip_level, num_mip_levels: 1, face, num_faces: 1 }
    }
}

impl Default for TextureSurface {
    fn default() -> Self {
        Self::COMPLETE
    }
}

/// Backend texture handle
pub trait GpuTexture: Send + Sync + Debug {
    /// Texture dimensions
    fn info(&self) -> &TextureInfo;

    /// Downcast hook for backends
    fn as_any(&self) -> &dyn Any;
}
