use std::io::Cursor;

use crate::common::{AssetId, BinReader, BinWriter, Game};
use crate::mat::cooker::cook_material_set;
use crate::mat::reader::load_material_set;
use crate::mat::types::{Material, MaterialSet, OPTION_TRANSPARENT};

fn lit_material(texture: u32) -> Material {
    Material {
        vertex_flags: 0x0000000F,
        textures: vec![AssetId::new_32(texture)],
        blend_dst: 1,
        blend_src: 4,
        lighting_enabled: true,
        ..Material::default()
    }
}

fn cook(set: &MaterialSet, game: Game) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    cook_material_set(set, game, &mut BinWriter::big_endian(Cursor::new(&mut bytes)))?;
    Ok(bytes)
}

#[test]
fn set_round_trips_through_prime_layout() -> anyhow::Result<()> {
    let set = MaterialSet {
        materials: vec![
            lit_material(0xAAAA0001),
            Material {
                options: OPTION_TRANSPARENT,
                konst_colors: vec![0xFF0000FF, 0x00FF00FF],
                textures: vec![AssetId::new_32(0xAAAA0002), AssetId::new_32(0xAAAA0001)],
                ..lit_material(0)
            },
        ],
    };

    let bytes = cook(&set, Game::Prime)?;
    let loaded = load_material_set(&mut BinReader::big_endian(Cursor::new(bytes)), Game::Prime)?;

    assert_eq!(loaded, set);
    Ok(())
}

#[test]
fn texture_table_is_sorted_and_deduplicated() -> anyhow::Result<()> {
    let set = MaterialSet {
        materials: vec![lit_material(0xBBBB0002), lit_material(0xBBBB0001), lit_material(0xBBBB0002)],
    };

    assert_eq!(
        set.texture_list(),
        vec![AssetId::new_32(0xBBBB0001), AssetId::new_32(0xBBBB0002)]
    );

    // First texture index in the cooked stream belongs to the first
    // material and points at the second table entry.
    let bytes = cook(&set, Game::Prime)?;
    let mut rdr = BinReader::big_endian(Cursor::new(bytes));
    assert_eq!(rdr.read_u32()?, 2);
    assert_eq!(rdr.read_u32()?, 0xBBBB0001);
    assert_eq!(rdr.read_u32()?, 0xBBBB0002);
    Ok(())
}

#[test]
fn identical_materials_share_a_group_index() -> anyhow::Result<()> {
    let set = MaterialSet {
        materials: vec![
            lit_material(0xCCCC0001),
            lit_material(0xCCCC0001),
            lit_material(0xCCCC0002),
        ],
    };

    let bytes = cook(&set, Game::Prime)?;
    let mut rdr = BinReader::big_endian(Cursor::new(bytes.clone()));

    // Walk to the offset table.
    let num_textures = rdr.read_u32()?;
    rdr.skip(i64::from(num_textures) * 4)?;
    let num_materials = rdr.read_u32()?;
    let mut end_offsets = Vec::new();
    for _ in 0..num_materials {
        end_offsets.push(rdr.read_u32()?);
    }
    let materials_start = rdr.tell()?;

    // Group index sits after flags, texture indices and vertex flags.
    let mut group_indices = Vec::new();
    let mut record_start = 0;
    for end_offset in end_offsets {
        rdr.seek(materials_start + u64::from(record_start))?;
        rdr.skip(4)?;
        let num_tex = rdr.read_u32()?;
        rdr.skip(i64::from(num_tex) * 4 + 4)?;
        group_indices.push(rdr.read_u32()?);
        record_start = end_offset;
    }

    assert_eq!(group_indices, vec![0, 0, 1]);
    Ok(())
}

#[test]
fn newer_layouts_are_empty_both_ways() -> anyhow::Result<()> {
    let set = MaterialSet { materials: vec![lit_material(1)] };
    let bytes = cook(&set, Game::Corruption)?;
    assert!(bytes.is_empty());

    let loaded = load_material_set(
        &mut BinReader::big_endian(Cursor::new(Vec::new())),
        Game::Corruption,
    )?;
    assert!(loaded.materials.is_empty());
    Ok(())
}
