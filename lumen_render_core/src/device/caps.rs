/// Matrix memory layout expected by the backend's programs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOrder {
    /// glam's native layout, written as-is
    ColumnMajor,
    /// Matrices are transposed when written to param blocks
    RowMajor,
}

/// Static capabilities reported by a backend
#[derive(Debug, Clone)]
pub struct BackendCaps {
    /// Backend name (for logs)
    pub name: String,
    /// Matrix layout of data parameters
    pub matrix_order: MatrixOrder,
    /// Maximum number of descriptor sets a pipeline may use
    pub max_bound_sets: u32,
    /// Geometry programs available
    pub supports_geometry: bool,
    /// Hull and domain programs available
    pub supports_tessellation: bool,
    /// Compute programs available
    pub supports_compute: bool,
}

impl Default for BackendCaps {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            matrix_order: MatrixOrder::ColumnMajor,
            max_bound_sets: 4,
            supports_geometry: true,
            supports_tessellation: true,
            supports_compute: true,
        }
    }
}
