/// Immutable render states and their content-addressed cache
///
/// State descriptors are hashed over a canonical byte encoding; equal
/// descriptors resolve to one shared backend object carrying a small dense id.

mod descriptor_hash;
mod descriptor;
mod state_cache;
mod render_state_manager;

pub use descriptor_hash::{
    CanonicalWriter, FieldInfo, FieldType, StateDescriptor, StateKind, hash_canonical,
};
pub use descriptor::{
    CompareOp, StencilOp, BlendFactor, BlendOp, CullMode, FrontFace, PolygonMode,
    FilterMode, AddressMode, BorderColor, ColorWriteMask,
    RenderTargetBlendDesc, BlendStateDesc, RasterizerStateDesc,
    StencilFaceDesc, DepthStencilStateDesc, SamplerStateDesc,
    MAX_RENDER_TARGETS,
};
pub use state_cache::{
    StateCache, StateCacheStats, CachedState, StateKey,
    BlendState, RasterizerState, DepthStencilState, SamplerState,
};
pub use render_state_manager::RenderStateManager;
