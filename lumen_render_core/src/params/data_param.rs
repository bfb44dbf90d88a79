/// Typed handles on data parameters
///
/// A `GpuDataParam<T>` resolves its param block through the owning `GpuParams`
/// on every call, so rebinding the block is picked up. Whether matrices are
/// transposed is decided once, when the handle is created, from the type and
/// the backend's `MatrixOrder`.

use std::marker::PhantomData;
use std::sync::Arc;
use bytemuck::Pod;
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::params::GpuParams;
use crate::program::{GpuParamDataDesc, GpuParamDataType};
use crate::{engine_error, engine_warn};

/// Value type that can be written into a param block
pub trait GpuDataParamType: Copy + Default + Send + Sync + 'static {
    /// Matching reflected type
    const TYPE: GpuParamDataType;

    /// Matrices are transposed for row-major backends
    const IS_MATRIX: bool = false;

    /// Write the GPU representation into `dst` (`TYPE.size_bytes()` bytes)
    fn write_gpu(&self, dst: &mut [u8], transpose: bool);

    /// Read back the GPU representation written by `write_gpu`
    fn read_gpu(src: &[u8], transpose: bool) -> Self;
}

fn write_pod<P: Pod>(value: &P, dst: &mut [u8]) {
    let bytes = bytemuck::bytes_of(value);
    dst[..bytes.len()].copy_from_slice(bytes);
}

fn read_pod<P: Pod>(src: &[u8]) -> P {
    bytemuck::pod_read_unaligned(&src[..std::mem::size_of::<P>()])
}

macro_rules! impl_plain_data_param {
    ($ty:ty, $data_type:expr) => {
        impl GpuDataParamType for $ty {
            const TYPE: GpuParamDataType = $data_type;

            fn write_gpu(&self, dst: &mut [u8], _transpose: bool) {
                write_pod(self, dst);
            }

            fn read_gpu(src: &[u8], _transpose: bool) -> Self {
                read_pod(src)
            }
        }
    };
}

impl_plain_data_param!(f32, GpuParamDataType::Float1);
impl_plain_data_param!(i32, GpuParamDataType::Int1);
impl_plain_data_param!(u32, GpuParamDataType::UInt1);
impl_plain_data_param!(Vec2, GpuParamDataType::Float2);
impl_plain_data_param!(Vec3, GpuParamDataType::Float3);
impl_plain_data_param!(Vec4, GpuParamDataType::Float4);

impl GpuDataParamType for Mat3 {
    const TYPE: GpuParamDataType = GpuParamDataType::Matrix3x3;
    const IS_MATRIX: bool = true;

    /// Three columns, each padded to a `Vec4`
    fn write_gpu(&self, dst: &mut [u8], transpose: bool) {
        let m = if transpose { self.transpose() } else { *self };
        let padded = [m.x_axis.extend(0.0), m.y_axis.extend(0.0), m.z_axis.extend(0.0)];
        write_pod(&padded, dst);
    }

    fn read_gpu(src: &[u8], transpose: bool) -> Self {
        let padded: [Vec4; 3] = read_pod(src);
        let m = Mat3::from_cols(padded[0].truncate(), padded[1].truncate(), padded[2].truncate());
        if transpose { m.transpose() } else { m }
    }
}

impl GpuDataParamType for Mat4 {
    const TYPE: GpuParamDataType = GpuParamDataType::Matrix4x4;
    const IS_MATRIX: bool = true;

    fn write_gpu(&self, dst: &mut [u8], transpose: bool) {
        let m = if transpose { self.transpose() } else { *self };
        write_pod(&m, dst);
    }

    fn read_gpu(src: &[u8], transpose: bool) -> Self {
        let m: Mat4 = read_pod(src);
        if transpose { m.transpose() } else { m }
    }
}

/// Handle on one data parameter of a `GpuParams`
///
/// Obtained from `GpuParams::data_param`. Writes go to the param block bound
/// at the parameter's `(set, slot)`; with no block bound they are dropped.
pub struct GpuDataParam<T: GpuDataParamType> {
    params: Arc<GpuParams>,
    desc: GpuParamDataDesc,
    transpose: bool,
    _marker: PhantomData<T>,
}

impl<T: GpuDataParamType> GpuDataParam<T> {
    pub(crate) fn new(params: Arc<GpuParams>, desc: GpuParamDataDesc, transpose_matrices: bool) -> Self {
        Self {
            params,
            desc,
            transpose: T::IS_MATRIX && transpose_matrices,
            _marker: PhantomData,
        }
    }

    pub fn desc(&self) -> &GpuParamDataDesc {
        &self.desc
    }

    /// True if matrices written through this handle are transposed
    pub fn transposes(&self) -> bool {
        self.transpose
    }

    fn element_offset(&self, array_idx: u32) -> Option<u32> {
        if array_idx >= self.desc.array_size {
            if self.params.debug_checks() {
                engine_error!("lumen::GpuDataParam",
                    "'{}': array index {} out of range (size {})",
                    self.desc.name, array_idx, self.desc.array_size);
            }
            return None;
        }
        let offset = array_idx
            .checked_mul(self.desc.array_element_stride)
            .and_then(|delta| delta.checked_add(self.desc.gpu_mem_offset));
        if offset.is_none() {
            engine_error!("lumen::GpuDataParam",
                "'{}': offset of element {} does not fit in 32 bits", self.desc.name, array_idx);
        }
        offset
    }

    /// Write `value` at `array_idx`
    pub fn set(&self, value: T, array_idx: u32) {
        let Some(offset) = self.element_offset(array_idx) else { return };
        let Some(block) = self.params.param_block_buffer(self.desc.param_block_set, self.desc.param_block_slot) else {
            return;
        };
        let mut bytes = vec![0u8; T::TYPE.size_bytes() as usize];
        value.write_gpu(&mut bytes, self.transpose);
        if let Err(err) = block.write(offset, &bytes) {
            engine_warn!("lumen::GpuDataParam", "'{}' not written: {}", self.desc.name, err);
        }
    }

    /// Value at `array_idx` (default if out of range or no block is bound)
    pub fn get(&self, array_idx: u32) -> T {
        let Some(offset) = self.element_offset(array_idx) else { return T::default() };
        let Some(block) = self.params.param_block_buffer(self.desc.param_block_set, self.desc.param_block_slot) else {
            return T::default();
        };
        let mut bytes = vec![0u8; T::TYPE.size_bytes() as usize];
        match block.read(offset, &mut bytes) {
            Ok(()) => T::read_gpu(&bytes, self.transpose),
            Err(_) => T::default(),
        }
    }
}

#[cfg(test)]
#[path = "data_param_tests.rs"]
mod tests;
