use bitflags::bitflags;

use crate::common::Game;

pub const COLLISION_MAGIC: u32 = 0xDEAFBABE;

bitflags! {
    /// Surface properties, normalized across the per-title raw flag layouts.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct MaterialFlags: u64 {
        const UNKNOWN            = 1 << 0;
        const STONE              = 1 << 1;
        const METAL              = 1 << 2;
        const GRASS              = 1 << 3;
        const ICE                = 1 << 4;
        const METAL_GRATING      = 1 << 5;
        const PHAZON             = 1 << 6;
        const DIRT               = 1 << 7;
        const LAVA               = 1 << 8;
        const ALT_METAL          = 1 << 9;
        const SNOW               = 1 << 10;
        const SLOW_MUD           = 1 << 11;
        const MUD                = 1 << 12;
        const GLASS              = 1 << 13;
        const SHIELD             = 1 << 14;
        const SAND               = 1 << 15;
        const FABRIC             = 1 << 16;
        const MOTH_SEED_ORGANICS = 1 << 17;
        const WEB                = 1 << 18;
        const SHOOT_THRU         = 1 << 19;
        const CAMERA_THRU        = 1 << 20;
        const WOOD               = 1 << 21;
        const ORGANIC            = 1 << 22;
        const FLIPPED_TRI        = 1 << 23;
        const RUBBER             = 1 << 24;
        const SCAN_THRU          = 1 << 25;
        const AI_WALK_THRU       = 1 << 26;
        const CEILING            = 1 << 27;
        const WALL               = 1 << 28;
        const FLOOR              = 1 << 29;
        const AI_BLOCK           = 1 << 30;
        const JUMP_NOT_ALLOWED   = 1 << 31;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionMaterial {
    /// Flag word as stored on disk, 32 bits wide in the oldest layout.
    pub raw_flags: u64,
    pub flags: MaterialFlags,
}

/// Shared index buffers of a collision mesh. Edges are vertex index pairs
/// and triangles are edge index triples; the per-element material index
/// arrays run parallel to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionIndexData {
    pub materials: Vec<CollisionMaterial>,
    pub vertex_material_indices: Vec<u8>,
    pub edge_material_indices: Vec<u8>,
    pub triangle_material_indices: Vec<u8>,
    pub edge_indices: Vec<u16>,
    pub triangle_indices: Vec<u16>,
    pub vertices: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObbNode {
    pub transform: [f32; 12],
    pub radii: [f32; 3],
    pub kind: ObbNodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObbNodeKind {
    Branch {
        left: Box<ObbNode>,
        right: Box<ObbNode>,
    },
    Leaf {
        triangle_indices: Vec<u16>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollisionMesh {
    pub game: Game,
    /// Min and max corners of the bounding box.
    pub bounds: [f32; 6],
    pub index_data: CollisionIndexData,
    /// Standalone collision meshes carry an OBB tree; area collision does not.
    pub obb_tree: Option<ObbNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionMeshGroup {
    pub meshes: Vec<CollisionMesh>,
}
