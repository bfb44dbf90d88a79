/// Reflected parameter descriptors of one program stage
///
/// Names are unique within a stage. Every category is a `BTreeMap` keyed by
/// name, so iteration order never depends on insertion order.

use std::collections::BTreeMap;
use std::mem::offset_of;
use crate::pipeline::ParamType;
use crate::state::{FieldInfo, FieldType};

// ===== DATA PARAMETERS =====

/// Type of a data parameter stored in a param block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuParamDataType {
    Float1,
    Float2,
    Float3,
    Float4,
    Int1,
    Int2,
    Int3,
    Int4,
    UInt1,
    UInt2,
    UInt3,
    UInt4,
    /// Three columns padded to 16 bytes each
    Matrix3x3,
    Matrix4x4,
    /// Stored as a 4-byte integer
    Bool,
    /// Opaque struct, size given by `GpuParamDataDesc::element_size`
    Struct,
}

impl GpuParamDataType {
    /// Size of one element in a param block (0 for `Struct`)
    pub fn size_bytes(self) -> u32 {
        match self {
            GpuParamDataType::Float1 | GpuParamDataType::Int1 | GpuParamDataType::UInt1 => 4,
            GpuParamDataType::Float2 | GpuParamDataType::Int2 | GpuParamDataType::UInt2 => 8,
            GpuParamDataType::Float3 | GpuParamDataType::Int3 | GpuParamDataType::UInt3 => 12,
            GpuParamDataType::Float4 | GpuParamDataType::Int4 | GpuParamDataType::UInt4 => 16,
            GpuParamDataType::Matrix3x3 => 48,
            GpuParamDataType::Matrix4x4 => 64,
            GpuParamDataType::Bool => 4,
            GpuParamDataType::Struct => 0,
        }
    }

    /// True for matrix types
    pub fn is_matrix(self) -> bool {
        matches!(self, GpuParamDataType::Matrix3x3 | GpuParamDataType::Matrix4x4)
    }
}

/// One data parameter inside a param block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuParamDataDesc {
    pub name: String,
    pub param_type: GpuParamDataType,
    /// Size of one element in bytes
    pub element_size: u32,
    /// 1 for non-array parameters
    pub array_size: u32,
    /// Distance between array elements in bytes
    pub array_element_stride: u32,
    /// Set of the param block holding the parameter
    pub param_block_set: u32,
    /// Slot of the param block holding the parameter
    pub param_block_slot: u32,
    /// Byte offset inside the param block
    pub gpu_mem_offset: u32,
}

impl GpuParamDataDesc {
    /// Non-array parameter of a built-in type
    pub fn new(name: &str, param_type: GpuParamDataType, block_set: u32, block_slot: u32, offset: u32) -> Self {
        let size = param_type.size_bytes();
        Self {
            name: name.to_string(),
            param_type,
            element_size: size,
            array_size: 1,
            array_element_stride: size,
            param_block_set: block_set,
            param_block_slot: block_slot,
            gpu_mem_offset: offset,
        }
    }

    /// Turn the parameter into an array of `array_size` elements `stride` bytes apart
    pub fn with_array(mut self, array_size: u32, stride: u32) -> Self {
        self.array_size = array_size;
        self.array_element_stride = stride;
        self
    }

    /// Bytes covered in the param block
    ///
    /// Widened to u64 so any reflected array size and stride fit.
    pub fn byte_span(&self) -> u64 {
        if self.array_size == 0 {
            return 0;
        }
        (self.array_size as u64 - 1) * self.array_element_stride as u64 + self.element_size as u64
    }

    pub fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("name", offset_of!(GpuParamDataDesc, name), FieldType::String),
            FieldInfo::new("param_type", offset_of!(GpuParamDataDesc, param_type), FieldType::Enum),
            FieldInfo::new("element_size", offset_of!(GpuParamDataDesc, element_size), FieldType::U32),
            FieldInfo::new("array_size", offset_of!(GpuParamDataDesc, array_size), FieldType::U32),
            FieldInfo::new("array_element_stride", offset_of!(GpuParamDataDesc, array_element_stride), FieldType::U32),
            FieldInfo::new("param_block_set", offset_of!(GpuParamDataDesc, param_block_set), FieldType::U32),
            FieldInfo::new("param_block_slot", offset_of!(GpuParamDataDesc, param_block_slot), FieldType::U32),
            FieldInfo::new("gpu_mem_offset", offset_of!(GpuParamDataDesc, gpu_mem_offset), FieldType::U32),
        ];
        FIELDS
    }
}

// ===== OBJECT PARAMETERS =====

/// Type of a texture, buffer or sampler parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuParamObjectType {
    Sampler,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
    RwTexture1D,
    RwTexture2D,
    RwTexture3D,
    ByteBuffer,
    StructuredBuffer,
    RwByteBuffer,
    RwStructuredBuffer,
}

impl GpuParamObjectType {
    /// Binding category the object type belongs to
    pub fn category(self) -> ParamType {
        match self {
            GpuParamObjectType::Sampler => ParamType::SamplerState,
            GpuParamObjectType::Texture1D
            | GpuParamObjectType::Texture2D
            | GpuParamObjectType::Texture3D
            | GpuParamObjectType::TextureCube => ParamType::Texture,
            GpuParamObjectType::RwTexture1D
            | GpuParamObjectType::RwTexture2D
            | GpuParamObjectType::RwTexture3D => ParamType::LoadStoreTexture,
            GpuParamObjectType::ByteBuffer
            | GpuParamObjectType::StructuredBuffer
            | GpuParamObjectType::RwByteBuffer
            | GpuParamObjectType::RwStructuredBuffer => ParamType::Buffer,
        }
    }
}

/// Texture, buffer or sampler parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuParamObjectDesc {
    pub name: String,
    pub object_type: GpuParamObjectType,
    pub set: u32,
    pub slot: u32,
}

impl GpuParamObjectDesc {
    pub fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("name", offset_of!(GpuParamObjectDesc, name), FieldType::String),
            FieldInfo::new("object_type", offset_of!(GpuParamObjectDesc, object_type), FieldType::Enum),
            FieldInfo::new("set", offset_of!(GpuParamObjectDesc, set), FieldType::U32),
            FieldInfo::new("slot", offset_of!(GpuParamObjectDesc, slot), FieldType::U32),
        ];
        FIELDS
    }
}

/// Param (uniform) block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuParamBlockDesc {
    pub name: String,
    pub set: u32,
    pub slot: u32,
    /// Size in bytes
    pub block_size: u32,
    /// Block may be bound from a buffer shared with other tables
    pub is_shareable: bool,
}

impl GpuParamBlockDesc {
    pub fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("name", offset_of!(GpuParamBlockDesc, name), FieldType::String),
            FieldInfo::new("set", offset_of!(GpuParamBlockDesc, set), FieldType::U32),
            FieldInfo::new("slot", offset_of!(GpuParamBlockDesc, slot), FieldType::U32),
            FieldInfo::new("block_size", offset_of!(GpuParamBlockDesc, block_size), FieldType::U32),
            FieldInfo::new("is_shareable", offset_of!(GpuParamBlockDesc, is_shareable), FieldType::Bool),
        ];
        FIELDS
    }
}

// ===== STAGE DESCRIPTOR =====

/// Every parameter of one program stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuParamDesc {
    pub params: BTreeMap<String, GpuParamDataDesc>,
    pub param_blocks: BTreeMap<String, GpuParamBlockDesc>,
    pub textures: BTreeMap<String, GpuParamObjectDesc>,
    pub load_store_textures: BTreeMap<String, GpuParamObjectDesc>,
    pub buffers: BTreeMap<String, GpuParamObjectDesc>,
    pub samplers: BTreeMap<String, GpuParamObjectDesc>,
}

impl GpuParamDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a param block
    pub fn add_param_block(mut self, name: &str, set: u32, slot: u32, block_size: u32) -> Self {
        self.param_blocks.insert(name.to_string(), GpuParamBlockDesc {
            name: name.to_string(),
            set,
            slot,
            block_size,
            is_shareable: true,
        });
        self
    }

    /// Add a data parameter (its block is added separately)
    pub fn add_param(mut self, param: GpuParamDataDesc) -> Self {
        self.params.insert(param.name.clone(), param);
        self
    }

    /// Add a texture, buffer or sampler; the category follows `object_type`
    pub fn add_object(mut self, name: &str, object_type: GpuParamObjectType, set: u32, slot: u32) -> Self {
        let desc = GpuParamObjectDesc { name: name.to_string(), object_type, set, slot };
        if let Some(map) = self.objects_mut(object_type.category()) {
            map.insert(name.to_string(), desc);
        }
        self
    }

    pub fn add_texture(self, name: &str, set: u32, slot: u32) -> Self {
        self.add_object(name, GpuParamObjectType::Texture2D, set, slot)
    }

    pub fn add_load_store_texture(self, name: &str, set: u32, slot: u32) -> Self {
        self.add_object(name, GpuParamObjectType::RwTexture2D, set, slot)
    }

    pub fn add_buffer(self, name: &str, set: u32, slot: u32) -> Self {
        self.add_object(name, GpuParamObjectType::StructuredBuffer, set, slot)
    }

    pub fn add_sampler(self, name: &str, set: u32, slot: u32) -> Self {
        self.add_object(name, GpuParamObjectType::Sampler, set, slot)
    }

    /// Object map of a category (None for `ParamBlock`)
    pub fn objects(&self, category: ParamType) -> Option<&BTreeMap<String, GpuParamObjectDesc>> {
        match category {
            ParamType::ParamBlock => None,
            ParamType::Texture => Some(&self.textures),
            ParamType::LoadStoreTexture => Some(&self.load_store_textures),
            ParamType::Buffer => Some(&self.buffers),
            ParamType::SamplerState => Some(&self.samplers),
        }
    }

    fn objects_mut(&mut self, category: ParamType) -> Option<&mut BTreeMap<String, GpuParamObjectDesc>> {
        match category {
            ParamType::ParamBlock => None,
            ParamType::Texture => Some(&mut self.textures),
            ParamType::LoadStoreTexture => Some(&mut self.load_store_textures),
            ParamType::Buffer => Some(&mut self.buffers),
            ParamType::SamplerState => Some(&mut self.samplers),
        }
    }

    /// `(name, set, slot)` of every binding of a category, in name order
    pub fn bindings(&self, category: ParamType) -> Vec<(&str, u32, u32)> {
        match self.objects(category) {
            Some(map) => map.values().map(|o| (o.name.as_str(), o.set, o.slot)).collect(),
            None => self.param_blocks.values().map(|b| (b.name.as_str(), b.set, b.slot)).collect(),
        }
    }

    /// `(set, slot)` of the binding named `name`
    pub fn find_binding(&self, category: ParamType, name: &str) -> Option<(u32, u32)> {
        match self.objects(category) {
            Some(map) => map.get(name).map(|o| (o.set, o.slot)),
            None => self.param_blocks.get(name).map(|b| (b.set, b.slot)),
        }
    }

    /// True if the stage declares nothing
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
            && self.param_blocks.is_empty()
            && self.textures.is_empty()
            && self.load_store_textures.is_empty()
            && self.buffers.is_empty()
            && self.samplers.is_empty()
    }

    pub fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("params", offset_of!(GpuParamDesc, params), FieldType::Map),
            FieldInfo::new("param_blocks", offset_of!(GpuParamDesc, param_blocks), FieldType::Map),
            FieldInfo::new("textures", offset_of!(GpuParamDesc, textures), FieldType::Map),
            FieldInfo::new("load_store_textures", offset_of!(GpuParamDesc, load_store_textures), FieldType::Map),
            FieldInfo::new("buffers", offset_of!(GpuParamDesc, buffers), FieldType::Map),
            FieldInfo::new("samplers", offset_of!(GpuParamDesc, samplers), FieldType::Map),
        ];
        FIELDS
    }
}

#[cfg(test)]
#[path = "param_desc_tests.rs"]
mod tests;
