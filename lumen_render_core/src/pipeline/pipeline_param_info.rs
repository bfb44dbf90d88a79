/// GpuPipelineParamInfo - flattened parameter layout of a pipeline
///
/// For each category, every `(set, slot)` declared by any stage is collected,
/// sorted, and given a sequential index in sorted order. A binding declared by
/// several stages (a texture read by both the vertex and the fragment program)
/// maps to a single index. Collection goes through ordered sets, so the layout
/// never depends on the order parameters were added to the descriptors.

use std::collections::BTreeSet;
use std::sync::Arc;
use crate::device::GpuProgramType;
use crate::program::GpuParamDesc;
use crate::{engine_error, engine_warn};

/// Sentinel returned for bindings the layout does not contain
pub const INVALID_SLOT: u32 = u32::MAX;

/// Binding category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamType {
    ParamBlock,
    Texture,
    LoadStoreTexture,
    Buffer,
    SamplerState,
}

impl ParamType {
    /// Number of categories
    pub const COUNT: usize = 5;

    /// All categories, in index order
    pub const ALL: [ParamType; Self::COUNT] = [
        ParamType::ParamBlock,
        ParamType::Texture,
        ParamType::LoadStoreTexture,
        ParamType::Buffer,
        ParamType::SamplerState,
    ];

    pub fn index(self) -> usize {
        match self {
            ParamType::ParamBlock => 0,
            ParamType::Texture => 1,
            ParamType::LoadStoreTexture => 2,
            ParamType::Buffer => 3,
            ParamType::SamplerState => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ParamType::ParamBlock => "param block",
            ParamType::Texture => "texture",
            ParamType::LoadStoreTexture => "load-store texture",
            ParamType::Buffer => "buffer",
            ParamType::SamplerState => "sampler state",
        }
    }
}

/// Sets and slots below these limits are looked up in a dense table
const DENSE_SET_LIMIT: u32 = 64;
const DENSE_SLOT_LIMIT: u32 = 1024;

/// Layout of one category
#[derive(Debug, Clone, Default)]
struct CategoryLayout {
    /// `slot_indices[set][slot]`: sequential index or `INVALID_SLOT`
    slot_indices: Vec<Vec<u32>>,
    /// Sequential index -> `(set, slot)`, sorted
    bindings: Vec<(u32, u32)>,
}

impl CategoryLayout {
    fn build(sorted: &BTreeSet<(u32, u32)>) -> Self {
        let mut layout = Self::default();
        for (index, &(set, slot)) in sorted.iter().enumerate() {
            layout.bindings.push((set, slot));
            if !Self::is_dense(set, slot) {
                continue;
            }
            let set_idx = set as usize;
            if layout.slot_indices.len() <= set_idx {
                layout.slot_indices.resize_with(set_idx + 1, Vec::new);
            }
            let slots = &mut layout.slot_indices[set_idx];
            if slots.len() <= slot as usize {
                slots.resize(slot as usize + 1, INVALID_SLOT);
            }
            slots[slot as usize] = index as u32;
        }
        layout
    }

    fn is_dense(set: u32, slot: u32) -> bool {
        set < DENSE_SET_LIMIT && slot < DENSE_SLOT_LIMIT
    }

    fn lookup(&self, set: u32, slot: u32) -> u32 {
        if !Self::is_dense(set, slot) {
            return self.bindings
                .binary_search(&(set, slot))
                .map_or(INVALID_SLOT, |index| index as u32);
        }
        self.slot_indices
            .get(set as usize)
            .and_then(|slots| slots.get(slot as usize))
            .copied()
            .unwrap_or(INVALID_SLOT)
    }
}

/// Flattened parameter layout of a pipeline
#[derive(Debug, Clone)]
pub struct GpuPipelineParamInfo {
    param_descs: [Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT],
    categories: [CategoryLayout; ParamType::COUNT],
    num_sets: u32,
    debug_checks: bool,
}

impl GpuPipelineParamInfo {
    /// Build the layout of the stages present in `param_descs` (indexed by
    /// `GpuProgramType::index`)
    ///
    /// With `debug_checks`, lookups of unknown bindings log at ERROR and a
    /// binding declared under different names by two stages logs a warning.
    pub fn build(
        param_descs: &[Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT],
        debug_checks: bool,
    ) -> Self {
        let mut sorted: [BTreeSet<(u32, u32)>; ParamType::COUNT] = Default::default();

        for desc in param_descs.iter().flatten() {
            for category in ParamType::ALL {
                for (_, set, slot) in desc.bindings(category) {
                    sorted[category.index()].insert((set, slot));
                }
            }
        }

        if debug_checks {
            Self::check_name_conflicts(param_descs);
        }

        let num_sets = sorted
            .iter()
            .filter_map(|bindings| bindings.iter().map(|&(set, _)| set).max())
            .max()
            .map_or(0, |max_set| max_set.saturating_add(1));

        Self {
            param_descs: param_descs.clone(),
            categories: std::array::from_fn(|i| CategoryLayout::build(&sorted[i])),
            num_sets,
            debug_checks,
        }
    }

    fn check_name_conflicts(param_descs: &[Option<Arc<GpuParamDesc>>; GpuProgramType::COUNT]) {
        for category in ParamType::ALL {
            let mut seen: Vec<(u32, u32, &str, GpuProgramType)> = Vec::new();
            for program_type in GpuProgramType::ALL {
                let Some(desc) = &param_descs[program_type.index()] else { continue };
                for (name, set, slot) in desc.bindings(category) {
                    if let Some(&(.., other_name, other_type)) = seen
                        .iter()
                        .find(|&&(s, sl, n, _)| s == set && sl == slot && n != name)
                    {
                        engine_warn!("lumen::GpuPipelineParamInfo",
                            "{} (set={}, slot={}) is '{}' in the {} program and '{}' in the {} program",
                            category.name(), set, slot, other_name, other_type.name(),
                            name, program_type.name());
                    }
                    seen.push((set, slot, name, program_type));
                }
            }
        }
    }

    /// Sequential index of `(set, slot)` in `category`, or `INVALID_SLOT`
    pub fn sequential_slot(&self, category: ParamType, set: u32, slot: u32) -> u32 {
        let index = self.categories[category.index()].lookup(set, slot);
        if index == INVALID_SLOT && self.debug_checks {
            engine_error!("lumen::GpuPipelineParamInfo",
                "No {} bound at set {} slot {} (pipeline uses {} sets)",
                category.name(), set, slot, self.num_sets);
        }
        index
    }

    /// `(set, slot)` of the sequential index `index` in `category`
    pub fn binding(&self, category: ParamType, index: u32) -> Option<(u32, u32)> {
        self.categories[category.index()].bindings.get(index as usize).copied()
    }

    /// `(set, slot)` of the parameter `name` declared by the `program_type` stage
    pub fn binding_by_name(
        &self,
        program_type: GpuProgramType,
        category: ParamType,
        name: &str,
    ) -> Option<(u32, u32)> {
        self.param_descs[program_type.index()]
            .as_ref()?
            .find_binding(category, name)
    }

    /// Number of sets (highest set used + 1)
    pub fn num_sets(&self) -> u32 {
        self.num_sets
    }

    /// Number of distinct bindings in `category`
    pub fn num_elements(&self, category: ParamType) -> u32 {
        self.categories[category.index()].bindings.len() as u32
    }

    /// Number of distinct bindings across all categories
    pub fn total_num_elements(&self) -> u32 {
        ParamType::ALL.iter().map(|&category| self.num_elements(category)).sum()
    }

    /// Parameters of one stage
    pub fn param_desc(&self, program_type: GpuProgramType) -> Option<&Arc<GpuParamDesc>> {
        self.param_descs[program_type.index()].as_ref()
    }

    /// Stages present in the pipeline
    pub fn program_types(&self) -> impl Iterator<Item = GpuProgramType> + '_ {
        GpuProgramType::ALL
            .into_iter()
            .filter(|program_type| self.param_descs[program_type.index()].is_some())
    }

    pub fn debug_checks(&self) -> bool {
        self.debug_checks
    }
}

#[cfg(test)]
#[path = "pipeline_param_info_tests.rs"]
mod tests;
