use crate::common::{AssetId, Game};

pub const MLVL_MAGIC: u32 = 0xDEAFBABE;

/// 128-bit saved-state identifier attached to script layers from Corruption
/// onward.
pub type SavedStateId = [u8; 16];

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub game: Game,
    pub world_name: AssetId,
    /// Echoes only; the dark-world name table.
    pub dark_world_name: AssetId,
    pub temple_key_world_index: u32,
    pub save_world: AssetId,
    pub default_skybox: AssetId,
    pub map_world: AssetId,
    pub time_attack: Option<TimeAttackData>,
    pub memory_relays: Vec<MemoryRelay>,
    pub areas: Vec<AreaRecord>,
}

impl World {
    pub fn new(game: Game) -> Self {
        World {
            game,
            world_name: AssetId::invalid_for(game),
            dark_world_name: AssetId::invalid_for(game),
            temple_key_world_index: 0,
            save_world: AssetId::invalid_for(game),
            default_skybox: AssetId::invalid_for(game),
            map_world: AssetId::invalid_for(game),
            time_attack: None,
            memory_relays: Vec::new(),
            areas: Vec::new(),
        }
    }

    /// Direct references the world itself holds, before area expansion.
    pub fn header_dependencies(&self) -> Vec<AssetId> {
        [
            self.world_name,
            self.dark_world_name,
            self.save_world,
            self.default_skybox,
            self.map_world,
        ]
        .into_iter()
        .filter(AssetId::is_valid)
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeAttackData {
    pub act_number: String,
    pub bronze_time: f32,
    pub silver_time: f32,
    pub gold_time: f32,
    pub shiny_gold_time: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRelay {
    pub instance_id: u32,
    pub target_id: u32,
    pub message: u16,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaRecord {
    pub area_name: AssetId,
    /// Row-major 3x4 world transform.
    pub transform: [f32; 12],
    /// Axis-aligned bounds, min then max.
    pub bounds: [f32; 6],
    pub area_res_id: AssetId,
    pub area_id: AssetId,
    pub attached_area_indices: Vec<u16>,
    pub docks: Vec<Dock>,
    pub module_filenames: Vec<String>,
    pub module_layer_offsets: Vec<u32>,
    pub internal_name: String,
    pub layers: Vec<Layer>,
}

impl AreaRecord {
    pub fn new(game: Game) -> Self {
        AreaRecord {
            area_name: AssetId::invalid_for(game),
            transform: [0.0; 12],
            bounds: [0.0; 6],
            area_res_id: AssetId::invalid_for(game),
            area_id: AssetId::invalid_for(game),
            attached_area_indices: Vec::new(),
            docks: Vec::new(),
            module_filenames: Vec::new(),
            module_layer_offsets: Vec::new(),
            internal_name: String::new(),
            layers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dock {
    pub connecting: Vec<DockConnection>,
    pub coordinates: [[f32; 3]; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockConnection {
    pub area_index: u32,
    pub dock_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub name: String,
    pub active: bool,
    pub state_id: SavedStateId,
}
