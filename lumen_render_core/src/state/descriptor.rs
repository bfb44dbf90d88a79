/// Render state descriptors
///
/// Plain fixed-layout structs, immutable once handed to the cache. Defaults
/// follow the usual graphics API defaults (opaque, back-face culled, depth test
/// less, trilinear wrap sampling).

use std::mem::offset_of;
use bitflags::bitflags;
use crate::state::descriptor_hash::{
    CanonicalWriter, FieldInfo, FieldType, StateDescriptor, StateKind,
};

/// Number of blend render target slots
pub const MAX_RENDER_TARGETS: usize = 8;

// ===== RASTERIZATION ENUMS =====

/// Face culling mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    #[default]
    Back,
}

/// Front face winding order
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise vertices define front face
    #[default]
    CounterClockwise,
    /// Clockwise vertices define front face
    Clockwise,
}

/// Polygon rendering mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Fill polygons
    #[default]
    Fill,
    /// Draw edges only (wireframe)
    Line,
    /// Draw vertices only
    Point,
}

// ===== DEPTH/STENCIL ENUMS =====

/// Comparison operator for depth, stencil and sampler comparison
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareOp {
    /// Never pass
    Never,
    /// Pass if value < reference
    #[default]
    Less,
    /// Pass if value == reference
    Equal,
    /// Pass if value <= reference
    LessOrEqual,
    /// Pass if value > reference
    Greater,
    /// Pass if value != reference
    NotEqual,
    /// Pass if value >= reference
    GreaterOrEqual,
    /// Always pass
    Always,
}

/// Stencil operation
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    /// Keep current value
    #[default]
    Keep,
    /// Set to zero
    Zero,
    /// Replace with reference value
    Replace,
    /// Increment and clamp to max
    IncrementAndClamp,
    /// Decrement and clamp to zero
    DecrementAndClamp,
    /// Bitwise invert
    Invert,
    /// Increment and wrap around
    IncrementAndWrap,
    /// Decrement and wrap around
    DecrementAndWrap,
}

// ===== COLOR BLEND ENUMS =====

/// Blend factor for color blending equations
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    SrcAlphaSaturate,
}

/// Blend operation
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    /// result = src * srcFactor + dst * dstFactor
    #[default]
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

bitflags! {
    /// Color channels written by a render target
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
        const ALL = Self::RED.bits() | Self::GREEN.bits() | Self::BLUE.bits() | Self::ALPHA.bits();
    }
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

// ===== SAMPLER ENUMS =====

/// Texel filtering
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
    Anisotropic,
}

/// Texture coordinate addressing outside [0, 1]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    Wrap,
    Mirror,
    Clamp,
    Border,
    MirrorOnce,
}

/// Border color used with `AddressMode::Border`
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderColor {
    #[default]
    TransparentBlack,
    OpaqueBlack,
    OpaqueWhite,
}

// ===== BLEND STATE =====

/// Blending of one render target
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTargetBlendDesc {
    /// Enable blending
    pub blend_enable: bool,
    /// Source color blend factor
    pub src_blend: BlendFactor,
    /// Destination color blend factor
    pub dst_blend: BlendFactor,
    /// Color blend operation
    pub blend_op: BlendOp,
    /// Source alpha blend factor
    pub src_blend_alpha: BlendFactor,
    /// Destination alpha blend factor
    pub dst_blend_alpha: BlendFactor,
    /// Alpha blend operation
    pub blend_op_alpha: BlendOp,
    /// Color write mask
    pub write_mask: ColorWriteMask,
}

impl RenderTargetBlendDesc {
    /// Classic `src * a + dst * (1 - a)` blending
    pub fn alpha_blend() -> Self {
        Self {
            blend_enable: true,
            src_blend: BlendFactor::SrcAlpha,
            dst_blend: BlendFactor::OneMinusSrcAlpha,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::OneMinusSrcAlpha,
            blend_op_alpha: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }

    /// `src + dst` blending
    pub fn additive() -> Self {
        Self {
            blend_enable: true,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::One,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::One,
            blend_op_alpha: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }

    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_bool(self.blend_enable);
        writer.write_u32(self.src_blend as u32);
        writer.write_u32(self.dst_blend as u32);
        writer.write_u32(self.blend_op as u32);
        writer.write_u32(self.src_blend_alpha as u32);
        writer.write_u32(self.dst_blend_alpha as u32);
        writer.write_u32(self.blend_op_alpha as u32);
        writer.write_u8(self.write_mask.bits());
    }
}

impl Default for RenderTargetBlendDesc {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOp::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Output merger blending state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlendStateDesc {
    /// Enable alpha-to-coverage
    pub alpha_to_coverage: bool,
    /// Use every `render_targets` entry (otherwise only entry 0 applies)
    pub independent_blend: bool,
    /// Per render target blending
    pub render_targets: [RenderTargetBlendDesc; MAX_RENDER_TARGETS],
}

impl BlendStateDesc {
    /// Same blending on every render target
    pub fn uniform(target: RenderTargetBlendDesc) -> Self {
        Self {
            alpha_to_coverage: false,
            independent_blend: false,
            render_targets: [target; MAX_RENDER_TARGETS],
        }
    }

    /// Alpha blending on every render target
    pub fn alpha_blended() -> Self {
        Self::uniform(RenderTargetBlendDesc::alpha_blend())
    }
}

impl StateDescriptor for BlendStateDesc {
    const KIND: StateKind = StateKind::Blend;

    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_bool(self.alpha_to_coverage);
        writer.write_bool(self.independent_blend);
        for target in &self.render_targets {
            target.write_canonical(writer);
        }
    }

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("alpha_to_coverage", offset_of!(BlendStateDesc, alpha_to_coverage), FieldType::Bool),
            FieldInfo::new("independent_blend", offset_of!(BlendStateDesc, independent_blend), FieldType::Bool),
            FieldInfo::new("render_targets", offset_of!(BlendStateDesc, render_targets), FieldType::Array),
        ];
        FIELDS
    }
}

// ===== RASTERIZER STATE =====

/// Rasterization fixed-function state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerStateDesc {
    /// Polygon rendering mode
    pub polygon_mode: PolygonMode,
    /// Face culling mode
    pub cull_mode: CullMode,
    /// Front face winding order
    pub front_face: FrontFace,
    /// Constant depth offset
    pub depth_bias: f32,
    /// Maximum depth bias clamp
    pub depth_bias_clamp: f32,
    /// Slope-based depth offset
    pub slope_scaled_depth_bias: f32,
    pub depth_clip_enable: bool,
    pub scissor_enable: bool,
    pub multisample_enable: bool,
    pub antialiased_line_enable: bool,
}

impl Default for RasterizerStateDesc {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
            depth_bias: 0.0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: true,
            antialiased_line_enable: false,
        }
    }
}

impl StateDescriptor for RasterizerStateDesc {
    const KIND: StateKind = StateKind::Rasterizer;

    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_u32(self.polygon_mode as u32);
        writer.write_u32(self.cull_mode as u32);
        writer.write_u32(self.front_face as u32);
        writer.write_f32(self.depth_bias);
        writer.write_f32(self.depth_bias_clamp);
        writer.write_f32(self.slope_scaled_depth_bias);
        writer.write_bool(self.depth_clip_enable);
        writer.write_bool(self.scissor_enable);
        writer.write_bool(self.multisample_enable);
        writer.write_bool(self.antialiased_line_enable);
    }

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("polygon_mode", offset_of!(RasterizerStateDesc, polygon_mode), FieldType::Enum),
            FieldInfo::new("cull_mode", offset_of!(RasterizerStateDesc, cull_mode), FieldType::Enum),
            FieldInfo::new("front_face", offset_of!(RasterizerStateDesc, front_face), FieldType::Enum),
            FieldInfo::new("depth_bias", offset_of!(RasterizerStateDesc, depth_bias), FieldType::F32),
            FieldInfo::new("depth_bias_clamp", offset_of!(RasterizerStateDesc, depth_bias_clamp), FieldType::F32),
            FieldInfo::new("slope_scaled_depth_bias", offset_of!(RasterizerStateDesc, slope_scaled_depth_bias), FieldType::F32),
            FieldInfo::new("depth_clip_enable", offset_of!(RasterizerStateDesc, depth_clip_enable), FieldType::Bool),
            FieldInfo::new("scissor_enable", offset_of!(RasterizerStateDesc, scissor_enable), FieldType::Bool),
            FieldInfo::new("multisample_enable", offset_of!(RasterizerStateDesc, multisample_enable), FieldType::Bool),
            FieldInfo::new("antialiased_line_enable", offset_of!(RasterizerStateDesc, antialiased_line_enable), FieldType::Bool),
        ];
        FIELDS
    }
}

// ===== DEPTH/STENCIL STATE =====

/// Stencil operations for one face
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceDesc {
    /// Action on stencil test fail
    pub fail_op: StencilOp,
    /// Action on stencil pass + depth fail
    pub depth_fail_op: StencilOp,
    /// Action on stencil pass + depth pass
    pub pass_op: StencilOp,
    /// Comparison operator
    pub compare: CompareOp,
}

impl StencilFaceDesc {
    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_u32(self.fail_op as u32);
        writer.write_u32(self.depth_fail_op as u32);
        writer.write_u32(self.pass_op as u32);
        writer.write_u32(self.compare as u32);
    }
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            compare: CompareOp::Always,
        }
    }
}

/// Depth and stencil testing state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDesc {
    /// Enable depth testing
    pub depth_read_enable: bool,
    /// Enable writing to depth buffer
    pub depth_write_enable: bool,
    /// Depth comparison operator
    pub depth_compare: CompareOp,
    /// Enable stencil testing
    pub stencil_enable: bool,
    /// Bits of stencil buffer read for compare
    pub stencil_read_mask: u8,
    /// Bits of stencil buffer written
    pub stencil_write_mask: u8,
    /// Stencil operations for front faces
    pub front: StencilFaceDesc,
    /// Stencil operations for back faces
    pub back: StencilFaceDesc,
}

impl DepthStencilStateDesc {
    /// No depth or stencil testing
    pub fn disabled() -> Self {
        Self {
            depth_read_enable: false,
            depth_write_enable: false,
            depth_compare: CompareOp::Always,
            ..Self::default()
        }
    }
}

impl Default for DepthStencilStateDesc {
    fn default() -> Self {
        Self {
            depth_read_enable: true,
            depth_write_enable: true,
            depth_compare: CompareOp::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}

impl StateDescriptor for DepthStencilStateDesc {
    const KIND: StateKind = StateKind::DepthStencil;

    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_bool(self.depth_read_enable);
        writer.write_bool(self.depth_write_enable);
        writer.write_u32(self.depth_compare as u32);
        writer.write_bool(self.stencil_enable);
        writer.write_u8(self.stencil_read_mask);
        writer.write_u8(self.stencil_write_mask);
        self.front.write_canonical(writer);
        self.back.write_canonical(writer);
    }

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("depth_read_enable", offset_of!(DepthStencilStateDesc, depth_read_enable), FieldType::Bool),
            FieldInfo::new("depth_write_enable", offset_of!(DepthStencilStateDesc, depth_write_enable), FieldType::Bool),
            FieldInfo::new("depth_compare", offset_of!(DepthStencilStateDesc, depth_compare), FieldType::Enum),
            FieldInfo::new("stencil_enable", offset_of!(DepthStencilStateDesc, stencil_enable), FieldType::Bool),
            FieldInfo::new("stencil_read_mask", offset_of!(DepthStencilStateDesc, stencil_read_mask), FieldType::U8),
            FieldInfo::new("stencil_write_mask", offset_of!(DepthStencilStateDesc, stencil_write_mask), FieldType::U8),
            FieldInfo::new("front", offset_of!(DepthStencilStateDesc, front), FieldType::Struct),
            FieldInfo::new("back", offset_of!(DepthStencilStateDesc, back), FieldType::Struct),
        ];
        FIELDS
    }
}

// ===== SAMPLER STATE =====

/// Texture sampling state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerStateDesc {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mip_filter: FilterMode,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    /// Used with `FilterMode::Anisotropic` (1..=16)
    pub max_anisotropy: u32,
    /// Comparison sampler when set (shadow maps)
    pub comparison: Option<CompareOp>,
    pub mip_min: f32,
    pub mip_max: f32,
    pub mip_bias: f32,
    pub border_color: BorderColor,
}

impl SamplerStateDesc {
    /// Linear filtering, clamped coordinates
    pub fn linear_clamp() -> Self {
        Self {
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
            address_w: AddressMode::Clamp,
            ..Self::default()
        }
    }

    /// Nearest filtering, wrapped coordinates
    pub fn nearest_wrap() -> Self {
        Self {
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            mip_filter: FilterMode::Nearest,
            ..Self::default()
        }
    }
}

impl Default for SamplerStateDesc {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mip_filter: FilterMode::Linear,
            address_u: AddressMode::Wrap,
            address_v: AddressMode::Wrap,
            address_w: AddressMode::Wrap,
            max_anisotropy: 1,
            comparison: None,
            mip_min: 0.0,
            mip_max: f32::MAX,
            mip_bias: 0.0,
            border_color: BorderColor::TransparentBlack,
        }
    }
}

impl StateDescriptor for SamplerStateDesc {
    const KIND: StateKind = StateKind::Sampler;

    fn write_canonical(&self, writer: &mut CanonicalWriter) {
        writer.write_u32(self.min_filter as u32);
        writer.write_u32(self.mag_filter as u32);
        writer.write_u32(self.mip_filter as u32);
        writer.write_u32(self.address_u as u32);
        writer.write_u32(self.address_v as u32);
        writer.write_u32(self.address_w as u32);
        writer.write_u32(self.max_anisotropy);
        // 0 = no comparison, otherwise discriminant + 1
        writer.write_u32(self.comparison.map_or(0, |op| op as u32 + 1));
        writer.write_f32(self.mip_min);
        writer.write_f32(self.mip_max);
        writer.write_f32(self.mip_bias);
        writer.write_u32(self.border_color as u32);
    }

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("min_filter", offset_of!(SamplerStateDesc, min_filter), FieldType::Enum),
            FieldInfo::new("mag_filter", offset_of!(SamplerStateDesc, mag_filter), FieldType::Enum),
            FieldInfo::new("mip_filter", offset_of!(SamplerStateDesc, mip_filter), FieldType::Enum),
            FieldInfo::new("address_u", offset_of!(SamplerStateDesc, address_u), FieldType::Enum),
            FieldInfo::new("address_v", offset_of!(SamplerStateDesc, address_v), FieldType::Enum),
            FieldInfo::new("address_w", offset_of!(SamplerStateDesc, address_w), FieldType::Enum),
            FieldInfo::new("max_anisotropy", offset_of!(SamplerStateDesc, max_anisotropy), FieldType::U32),
            FieldInfo::new("comparison", offset_of!(SamplerStateDesc, comparison), FieldType::Enum),
            FieldInfo::new("mip_min", offset_of!(SamplerStateDesc, mip_min), FieldType::F32),
            FieldInfo::new("mip_max", offset_of!(SamplerStateDesc, mip_max), FieldType::F32),
            FieldInfo::new("mip_bias", offset_of!(SamplerStateDesc, mip_bias), FieldType::F32),
            FieldInfo::new("border_color", offset_of!(SamplerStateDesc, border_color), FieldType::Enum),
        ];
        FIELDS
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
