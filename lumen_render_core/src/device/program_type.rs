/// GPU program stage
///
/// Used to index the per-stage parameter descriptors of a pipeline
/// (`[Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpuProgramType {
    Vertex,
    Fragment,
    Geometry,
    Hull,
    Domain,
    Compute,
}

impl GpuProgramType {
    /// Number of program stages
    pub const COUNT: usize = 6;

    /// All stages, in index order
    pub const ALL: [GpuProgramType; Self::COUNT] = [
        GpuProgramType::Vertex,
        GpuProgramType::Fragment,
        GpuProgramType::Geometry,
        GpuProgramType::Hull,
        GpuProgramType::Domain,
        GpuProgramType::Compute,
    ];

    /// Dense index of the stage (0..COUNT)
    pub fn index(self) -> usize {
        match self {
            GpuProgramType::Vertex => 0,
            GpuProgramType::Fragment => 1,
            GpuProgramType::Geometry => 2,
            GpuProgramType::Hull => 3,
            GpuProgramType::Domain => 4,
            GpuProgramType::Compute => 5,
        }
    }

    /// Human readable stage name
    pub fn name(self) -> &'static str {
        match self {
            GpuProgramType::Vertex => "vertex",
            GpuProgramType::Fragment => "fragment",
            GpuProgramType::Geometry => "geometry",
            GpuProgramType::Hull => "hull",
            GpuProgramType::Domain => "domain",
            GpuProgramType::Compute => "compute",
        }
    }

    /// True for the five stages of a graphics pipeline
    pub fn is_graphics(self) -> bool {
        self != GpuProgramType::Compute
    }
}
