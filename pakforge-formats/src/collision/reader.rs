use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::collision::types::{
    COLLISION_MAGIC, CollisionIndexData, CollisionMaterial, CollisionMesh, CollisionMeshGroup,
    MaterialFlags, ObbNode, ObbNodeKind,
};
use crate::common::{BinReader, Game};

pub fn version_for(version: u32) -> Result<Game, FormatError> {
    match version {
        0x2 | 0x3 => Ok(Game::Prime),
        0x4 => Ok(Game::Echoes),
        0x5 => Ok(Game::DkcReturns),
        _ => Err(FormatError::UnsupportedVersion { version }),
    }
}

/// Raw flag bit to normalized flag, for the oldest layout.
const PRIME_FLAG_BITS: &[(u64, MaterialFlags)] = &[
    (0x00000001, MaterialFlags::UNKNOWN),
    (0x00000002, MaterialFlags::STONE),
    (0x00000004, MaterialFlags::METAL),
    (0x00000008, MaterialFlags::GRASS),
    (0x00000010, MaterialFlags::ICE),
    (0x00000040, MaterialFlags::METAL_GRATING),
    (0x00000080, MaterialFlags::PHAZON),
    (0x00000100, MaterialFlags::DIRT),
    (0x00000200, MaterialFlags::LAVA),
    (0x00000800, MaterialFlags::SNOW),
    (0x00001000, MaterialFlags::SLOW_MUD),
    (0x00004000, MaterialFlags::MUD),
    (0x00008000, MaterialFlags::GLASS),
    (0x00010000, MaterialFlags::SHIELD),
    (0x00020000, MaterialFlags::SAND),
    (0x00040000, MaterialFlags::SHOOT_THRU),
    (0x00200000, MaterialFlags::CAMERA_THRU),
    (0x00400000, MaterialFlags::WOOD),
    (0x00800000, MaterialFlags::ORGANIC),
    (0x02000000, MaterialFlags::FLIPPED_TRI),
    (0x08000000, MaterialFlags::SCAN_THRU),
    (0x10000000, MaterialFlags::AI_WALK_THRU),
    (0x20000000, MaterialFlags::CEILING),
    (0x40000000, MaterialFlags::WALL),
    (0x80000000, MaterialFlags::FLOOR),
];

const ECHOES_FLAG_BITS: &[(u64, MaterialFlags)] = &[
    (0x00000001, MaterialFlags::UNKNOWN),
    (0x00000002, MaterialFlags::STONE),
    (0x00000004, MaterialFlags::METAL),
    (0x00000008, MaterialFlags::GRASS),
    (0x00000010, MaterialFlags::ICE),
    (0x00000040, MaterialFlags::METAL_GRATING),
    (0x00000080, MaterialFlags::PHAZON),
    (0x00000100, MaterialFlags::DIRT),
    (0x00000200, MaterialFlags::ALT_METAL),
    (0x00000400, MaterialFlags::GLASS),
    (0x00000800, MaterialFlags::SNOW),
    (0x00001000, MaterialFlags::FABRIC),
    (0x00010000, MaterialFlags::SHIELD),
    (0x00020000, MaterialFlags::SAND),
    (0x00040000, MaterialFlags::MOTH_SEED_ORGANICS),
    (0x00080000, MaterialFlags::WEB),
    (0x00100000, MaterialFlags::SHOOT_THRU),
    (0x00200000, MaterialFlags::CAMERA_THRU),
    (0x00400000, MaterialFlags::WOOD),
    (0x00800000, MaterialFlags::ORGANIC),
    (0x01000000, MaterialFlags::FLIPPED_TRI),
    (0x02000000, MaterialFlags::RUBBER),
    (0x08000000, MaterialFlags::SCAN_THRU),
    (0x10000000, MaterialFlags::AI_WALK_THRU),
    (0x20000000, MaterialFlags::CEILING),
    (0x40000000, MaterialFlags::WALL),
    (0x80000000, MaterialFlags::FLOOR),
    (0x0001000000000000, MaterialFlags::AI_BLOCK),
    (0x0400000000000000, MaterialFlags::JUMP_NOT_ALLOWED),
];

const RETURNS_FLAG_BITS: &[(u64, MaterialFlags)] = &[(0x10000000, MaterialFlags::FLIPPED_TRI)];

fn load_material<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<CollisionMaterial, FormatError> {
    let raw_flags = if game <= Game::Prime {
        u64::from(rdr.read_u32()?)
    } else {
        rdr.read_u64()?
    };

    let table = if game <= Game::Prime {
        PRIME_FLAG_BITS
    } else if game <= Game::Corruption {
        ECHOES_FLAG_BITS
    } else {
        RETURNS_FLAG_BITS
    };

    let mut flags = MaterialFlags::empty();
    for &(bit, flag) in table {
        if raw_flags & bit != 0 {
            flags |= flag;
        }
    }

    Ok(CollisionMaterial { raw_flags, flags })
}

fn load_indices<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<CollisionIndexData, FormatError> {
    let mut data = CollisionIndexData::default();

    let num_materials = rdr.read_u32()?;
    data.materials.reserve(num_materials as usize);
    for _ in 0..num_materials {
        data.materials.push(load_material(rdr, game)?);
    }

    let vertex_material_count = rdr.read_u32()?;
    data.vertex_material_indices = rdr.read_bytes(vertex_material_count as usize)?;
    let edge_material_count = rdr.read_u32()?;
    data.edge_material_indices = rdr.read_bytes(edge_material_count as usize)?;
    let tri_material_count = rdr.read_u32()?;
    data.triangle_material_indices = rdr.read_bytes(tri_material_count as usize)?;

    // Edge entries are vertex index pairs.
    let num_edges = rdr.read_u32()?;
    data.edge_indices.reserve(num_edges as usize * 2);
    for _ in 0..num_edges * 2 {
        data.edge_indices.push(rdr.read_u16()?);
    }

    let num_tris = rdr.read_u32()?;
    data.triangle_indices.reserve(num_tris as usize);
    for _ in 0..num_tris {
        data.triangle_indices.push(rdr.read_u16()?);
    }

    // Echoes adds a chunk of unknown 16-bit values here.
    if game >= Game::Echoes {
        let unknown_count = rdr.read_u32()?;
        rdr.skip(i64::from(unknown_count) * 2)?;
    }

    let num_vertices = rdr.read_u32()?;
    data.vertices.reserve(num_vertices as usize);
    for _ in 0..num_vertices {
        data.vertices.push(rdr.read_vec3()?);
    }

    Ok(data)
}

fn parse_obb_node<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<ObbNode, FormatError> {
    let mut transform = [0.0; 12];
    for value in &mut transform {
        *value = rdr.read_f32()?;
    }
    let radii = rdr.read_vec3()?;

    let kind = if rdr.read_bool()? {
        let num_tris = rdr.read_u32()?;
        let mut triangle_indices = Vec::with_capacity(num_tris as usize);
        for _ in 0..num_tris {
            triangle_indices.push(rdr.read_u16()?);
        }
        ObbNodeKind::Leaf { triangle_indices }
    } else {
        ObbNodeKind::Branch {
            left: Box::new(parse_obb_node(rdr)?),
            right: Box::new(parse_obb_node(rdr)?),
        }
    };

    Ok(ObbNode { transform, radii, kind })
}

fn bounds_from_vertices(vertices: &[[f32; 3]]) -> [f32; 6] {
    let mut bounds = [
        f32::INFINITY,
        f32::INFINITY,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
    ];
    for vert in vertices {
        for axis in 0..3 {
            bounds[axis] = bounds[axis].min(vert[axis]);
            bounds[axis + 3] = bounds[axis + 3].max(vert[axis]);
        }
    }
    bounds
}

/// Collision section of a cooked area. The octree that precedes the index
/// data has a known structure but nothing here needs it, so it is skipped.
pub fn load_area_collision<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<CollisionMeshGroup, FormatError> {
    // Unknown value and section size.
    rdr.skip(0x8)?;

    let magic = rdr.read_u32()?;
    if magic != COLLISION_MAGIC {
        return Err(FormatError::InvalidMagic { magic });
    }

    let game = version_for(rdr.read_u32()?)?;

    let mut bounds = [0.0; 6];
    for value in &mut bounds {
        *value = rdr.read_f32()?;
    }

    rdr.skip(0x4)?;
    let octree_size = rdr.read_u32()?;
    rdr.skip(i64::from(octree_size))?;

    let index_data = load_indices(rdr, game)?;

    Ok(CollisionMeshGroup {
        meshes: vec![CollisionMesh {
            game,
            bounds,
            index_data,
            obb_tree: None,
        }],
    })
}

pub fn load_dcln<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<CollisionMeshGroup, FormatError> {
    let mut group = CollisionMeshGroup::default();
    let num_meshes = rdr.read_u32()?;

    for _ in 0..num_meshes {
        let magic = rdr.read_u32()?;
        if magic != COLLISION_MAGIC {
            return Err(FormatError::InvalidMagic { magic });
        }

        let game = version_for(rdr.read_u32()?)?;

        // Only the newest layout stores the bounding box.
        let mut bounds = [0.0; 6];
        if game == Game::DkcReturns {
            for value in &mut bounds {
                *value = rdr.read_f32()?;
            }
        }

        rdr.skip(0x4)?;
        let index_data = load_indices(rdr, game)?;

        if game != Game::DkcReturns {
            bounds = bounds_from_vertices(&index_data.vertices);
        }

        let obb_tree = parse_obb_node(rdr)?;
        group.meshes.push(CollisionMesh {
            game,
            bounds,
            index_data,
            obb_tree: Some(obb_tree),
        });
    }

    Ok(group)
}

pub fn try_load_dcln<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<CollisionMeshGroup> {
    match load_dcln(rdr) {
        Ok(group) => Some(group),
        Err(err) => {
            error!("Failed to load DCLN: {err}");
            None
        }
    }
}
