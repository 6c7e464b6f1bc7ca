use std::io::{Seek, Write};

use crate::FormatError;
use crate::common::{BinWriter, Game};
use crate::mat::types::{KONST_FLAG, Material, MaterialSet};

fn base_flags(game: Game) -> u32 {
    if game <= Game::Prime { 0x1003 } else { 0x4002 }
}

fn write_material<W: Write + Seek>(
    material: &Material,
    game: Game,
    texture_list: &[crate::common::AssetId],
    group_index: u32,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    let has_konst = !material.konst_colors.is_empty();

    // One pass per texture; the flag word carries a bit per textured pass.
    let mut tex_flags = 0u32;
    let mut tex_indices = Vec::with_capacity(material.textures.len());
    for (pass, texture) in material.textures.iter().enumerate() {
        tex_flags |= 1 << pass;
        let index = texture_list
            .iter()
            .position(|id| id == texture)
            .ok_or(FormatError::Malformed { reason: "texture missing from set table" })?;
        tex_indices.push(index as u32);
    }

    let flags = base_flags(game)
        | if has_konst { KONST_FLAG } else { 0 }
        | (material.options & !KONST_FLAG)
        | (tex_flags << 16);
    out.write_u32(flags)?;

    out.write_u32(tex_indices.len() as u32)?;
    for index in &tex_indices {
        out.write_u32(*index)?;
    }

    let mut vertex_flags = material.vertex_flags;
    if game < Game::Echoes {
        vertex_flags &= 0x00FFFFFF;
    }
    out.write_u32(vertex_flags)?;

    if game == Game::Echoes {
        out.write_u32(material.echoes_unknown_a)?;
        out.write_u32(material.echoes_unknown_b)?;
    }

    out.write_u32(group_index)?;

    if has_konst {
        out.write_u32(material.konst_colors.len() as u32)?;
        for color in &material.konst_colors {
            out.write_u32(*color)?;
        }
    }

    out.write_u16(material.blend_dst)?;
    out.write_u16(material.blend_src)?;

    // Color channels.
    out.write_u32(1)?;
    out.write_u32(0x3000 | u32::from(material.lighting_enabled))?;

    Ok(())
}

/// Texture table, junk offset table, material records, then the offsets
/// patched with each record's end position. Identical materials are tied
/// together through a shared group index.
pub fn cook_material_set<W: Write + Seek>(
    set: &MaterialSet,
    game: Game,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    // The newer set layout is not supported for writing.
    if game > Game::Echoes {
        return Ok(());
    }

    let texture_list = set.texture_list();
    out.write_u32(texture_list.len() as u32)?;
    for texture in &texture_list {
        texture.write(out)?;
    }

    out.write_u32(set.materials.len() as u32)?;
    let offsets_start = out.tell()?;
    for _ in 0..set.materials.len() {
        out.write_u32(0)?;
    }

    let materials_start = out.tell()?;
    let mut end_offsets = Vec::with_capacity(set.materials.len());
    let mut group_hashes: Vec<u64> = Vec::new();

    for material in &set.materials {
        let hash = material.hash_parameters();
        let group_index = match group_hashes.iter().position(|&known| known == hash) {
            Some(index) => index,
            None => {
                group_hashes.push(hash);
                group_hashes.len() - 1
            }
        };

        write_material(material, game, &texture_list, group_index as u32, out)?;
        end_offsets.push((out.tell()? - materials_start) as u32);
    }

    let materials_end = out.tell()?;
    out.seek(offsets_start)?;
    for offset in end_offsets {
        out.write_u32(offset)?;
    }
    out.seek(materials_end)?;

    Ok(())
}
