use std::hash::{DefaultHasher, Hash, Hasher};

use crate::common::AssetId;

/// Option bits stored in the low byte of the material flag word. The konst
/// bit is derived from the konst color list, not stored here.
pub const OPTION_TRANSPARENT: u32 = 0x10;
pub const OPTION_MASKED: u32 = 0x20;
pub const OPTION_SHADOW_OCCLUDER: u32 = 0x40;

pub(crate) const OPTION_MASK: u32 = 0x3F0;
pub(crate) const KONST_FLAG: u32 = 0x8;

/// One material record, reduced to the fields that survive a cook/load
/// cycle. The TEV stage configuration tail is carried as raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Material {
    pub options: u32,
    pub vertex_flags: u32,
    pub textures: Vec<AssetId>,
    pub konst_colors: Vec<u32>,
    pub blend_dst: u16,
    pub blend_src: u16,
    pub lighting_enabled: bool,
    pub echoes_unknown_a: u32,
    pub echoes_unknown_b: u32,
}

impl Material {
    /// Materials with equal parameters share a group index when cooked.
    pub fn hash_parameters(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialSet {
    pub materials: Vec<Material>,
}

impl MaterialSet {
    /// Deduplicated, sorted texture table the cooked set carries up front.
    pub fn texture_list(&self) -> Vec<AssetId> {
        let mut textures: Vec<AssetId> = self
            .materials
            .iter()
            .flat_map(|material| material.textures.iter().copied())
            .collect();
        textures.sort();
        textures.dedup();
        textures
    }
}
