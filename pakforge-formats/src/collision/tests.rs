use std::io::Cursor;

use crate::collision::reader::{load_area_collision, load_dcln, version_for};
use crate::collision::types::{MaterialFlags, ObbNodeKind};
use crate::common::{BinWriter, BinReader, Game};
use crate::FormatError;

fn write_prime_indices(out: &mut BinWriter<Cursor<&mut Vec<u8>>>) -> anyhow::Result<()> {
    // One material: stone floor.
    out.write_u32(1)?;
    out.write_u32(0x80000002)?;

    // Vertex, edge and triangle material indices.
    out.write_u32(3)?;
    out.write_bytes(&[0, 0, 0])?;
    out.write_u32(3)?;
    out.write_bytes(&[0, 0, 0])?;
    out.write_u32(1)?;
    out.write_bytes(&[0])?;

    // Three edges, one triangle.
    out.write_u32(3)?;
    for pair in [[0u16, 1], [1, 2], [2, 0]] {
        out.write_u16(pair[0])?;
        out.write_u16(pair[1])?;
    }
    out.write_u32(3)?;
    for edge in [0u16, 1, 2] {
        out.write_u16(edge)?;
    }

    out.write_u32(3)?;
    out.write_vec3([0.0, 0.0, 0.0])?;
    out.write_vec3([4.0, 0.0, 0.0])?;
    out.write_vec3([0.0, 2.0, -1.0])?;
    Ok(())
}

fn write_leaf_obb(out: &mut BinWriter<Cursor<&mut Vec<u8>>>) -> anyhow::Result<()> {
    for _ in 0..12 {
        out.write_f32(0.0)?;
    }
    out.write_vec3([2.0, 1.0, 0.5])?;
    out.write_bool(true)?;
    out.write_u32(1)?;
    out.write_u16(0)?;
    Ok(())
}

#[test]
fn version_map_matches_the_titles() {
    assert_eq!(version_for(0x2).unwrap(), Game::Prime);
    assert_eq!(version_for(0x3).unwrap(), Game::Prime);
    assert_eq!(version_for(0x4).unwrap(), Game::Echoes);
    assert_eq!(version_for(0x5).unwrap(), Game::DkcReturns);
    assert!(version_for(0x6).is_err());
}

#[test]
fn dcln_reads_mesh_and_obb_tree() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    {
        let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
        out.write_u32(1)?;
        out.write_u32(0xDEAFBABE)?;
        out.write_u32(0x3)?;
        out.write_u32(0)?;
        write_prime_indices(&mut out)?;
        write_leaf_obb(&mut out)?;
    }

    let group = load_dcln(&mut BinReader::big_endian(Cursor::new(bytes)))?;
    assert_eq!(group.meshes.len(), 1);

    let mesh = &group.meshes[0];
    assert_eq!(mesh.game, Game::Prime);
    assert_eq!(mesh.index_data.materials[0].raw_flags, 0x80000002);
    assert_eq!(
        mesh.index_data.materials[0].flags,
        MaterialFlags::STONE | MaterialFlags::FLOOR
    );
    assert_eq!(mesh.index_data.edge_indices.len(), 6);
    assert_eq!(mesh.index_data.triangle_indices, vec![0, 1, 2]);

    // The old layouts derive the bounding box from the vertices.
    assert_eq!(mesh.bounds, [0.0, 0.0, -1.0, 4.0, 2.0, 0.0]);

    let obb = mesh.obb_tree.as_ref().unwrap();
    assert_eq!(obb.radii, [2.0, 1.0, 0.5]);
    assert_eq!(
        obb.kind,
        ObbNodeKind::Leaf { triangle_indices: vec![0] }
    );
    Ok(())
}

#[test]
fn echoes_materials_use_wide_flag_words() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    {
        let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
        out.write_u32(1)?;
        out.write_u32(0xDEAFBABE)?;
        out.write_u32(0x4)?;
        out.write_u32(0)?;

        // One material with a flag in the upper word.
        out.write_u32(1)?;
        out.write_u64(0x0001000000000404)?;

        for _ in 0..3 {
            out.write_u32(0)?;
        }
        out.write_u32(0)?; // Edges
        out.write_u32(0)?; // Triangles
        out.write_u32(2)?; // Unknown chunk, skipped
        out.write_u16(0)?;
        out.write_u16(0)?;
        out.write_u32(1)?;
        out.write_vec3([1.0, 1.0, 1.0])?;

        write_leaf_obb(&mut out)?;
    }

    let group = load_dcln(&mut BinReader::big_endian(Cursor::new(bytes)))?;
    let material = group.meshes[0].index_data.materials[0];
    assert_eq!(
        material.flags,
        MaterialFlags::AI_BLOCK | MaterialFlags::GLASS | MaterialFlags::METAL
    );
    Ok(())
}

#[test]
fn area_collision_skips_the_octree() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    {
        let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
        out.write_u32(0)?; // Unknown
        out.write_u32(0)?; // Section size
        out.write_u32(0xDEAFBABE)?;
        out.write_u32(0x3)?;
        for value in [-4.0f32, -4.0, 0.0, 4.0, 4.0, 8.0] {
            out.write_f32(value)?;
        }
        out.write_u32(0)?;
        out.write_u32(6)?; // Octree size
        out.write_bytes(&[0xAA; 6])?;
        write_prime_indices(&mut out)?;
    }

    let group = load_area_collision(&mut BinReader::big_endian(Cursor::new(bytes)))?;
    let mesh = &group.meshes[0];
    assert_eq!(mesh.bounds, [-4.0, -4.0, 0.0, 4.0, 4.0, 8.0]);
    assert_eq!(mesh.index_data.vertices.len(), 3);
    assert!(mesh.obb_tree.is_none());
    Ok(())
}

#[test]
fn bad_magic_is_rejected() -> anyhow::Result<()> {
    let mut bytes = Vec::new();
    {
        let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
        out.write_u32(1)?;
        out.write_u32(0xDEADBEEF)?;
    }

    let result = load_dcln(&mut BinReader::big_endian(Cursor::new(bytes)));
    assert!(matches!(result, Err(FormatError::InvalidMagic { magic: 0xDEADBEEF })));
    Ok(())
}
