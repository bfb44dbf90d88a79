/// Canonical encoding and content hash of state descriptors
///
/// Descriptors are never hashed through their in-memory representation: each
/// one writes its fields, one at a time, into a `CanonicalWriter`. The
/// resulting byte string contains no padding, so two descriptors with equal
/// fields always produce equal bytes and equal hashes, and cache equality is a
/// plain byte comparison.
///
/// Encoding:
/// - `bool` and `u8`: one byte
/// - `u32` and enums (by discriminant): 4 bytes little endian
/// - `f32`: its bit pattern, 4 bytes little endian (so `0.0 != -0.0`)

use std::fmt::Debug;
use std::hash::Hasher;
use rustc_hash::FxHasher;

/// State category, one cache per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Blend,
    Rasterizer,
    DepthStencil,
    Sampler,
}

impl StateKind {
    /// Category name (for logs and errors)
    pub fn name(self) -> &'static str {
        match self {
            StateKind::Blend => "blend",
            StateKind::Rasterizer => "rasterizer",
            StateKind::DepthStencil => "depth-stencil",
            StateKind::Sampler => "sampler",
        }
    }
}

/// Field type exposed to serialization/reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    U8,
    U32,
    F32,
    /// `#[repr(u32)]` enum stored by discriminant
    Enum,
    /// Bit flags stored as their raw bits
    Flags,
    /// Nested descriptor struct
    Struct,
    /// Fixed-size array of nested structs
    Array,
    /// Owned UTF-8 string
    String,
    /// Name-keyed map of nested structs
    Map,
}

/// Plain field description of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    /// Byte offset inside the `#[repr(C)]` struct
    pub offset: usize,
    pub field_type: FieldType,
}

impl FieldInfo {
    pub const fn new(name: &'static str, offset: usize, field_type: FieldType) -> Self {
        Self { name, offset, field_type }
    }
}

/// Byte sink for canonical encodings
#[derive(Debug, Default)]
pub struct CanonicalWriter {
    bytes: Vec<u8>,
}

impl CanonicalWriter {
    pub fn new() -> Self {
        Self { bytes: Vec::with_capacity(64) }
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bytes.push(value as u8);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_bits().to_le_bytes());
    }

    /// Encoded bytes so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Hash of a canonical byte string (stable across runs and processes)
pub fn hash_canonical(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_usize(bytes.len());
    hasher.write(bytes);
    hasher.finish()
}

/// A fixed-layout, immutable render state descriptor
pub trait StateDescriptor: Clone + Debug + Send + Sync + 'static {
    /// Cache category
    const KIND: StateKind;

    /// Write every field, in declaration order
    fn write_canonical(&self, writer: &mut CanonicalWriter);

    /// Field list for serialization/reflection
    fn fields() -> &'static [FieldInfo];

    /// Canonical (padding-free) byte encoding
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut writer = CanonicalWriter::new();
        self.write_canonical(&mut writer);
        writer.into_bytes()
    }

    /// 64-bit content hash of the canonical encoding
    fn content_hash(&self) -> u64 {
        hash_canonical(&self.canonical_bytes())
    }
}

#[cfg(test)]
#[path = "descriptor_hash_tests.rs"]
mod tests;
