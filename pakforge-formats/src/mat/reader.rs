use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game, IdWidth};
use crate::mat::types::{KONST_FLAG, Material, MaterialSet, OPTION_MASK};

fn load_material<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
    texture_list: &[AssetId],
) -> Result<Material, FormatError> {
    let flags = rdr.read_u32()?;
    let mut material = Material {
        options: flags & OPTION_MASK & !KONST_FLAG,
        ..Material::default()
    };

    let num_tex_indices = rdr.read_u32()?;
    material.textures.reserve(num_tex_indices as usize);
    for _ in 0..num_tex_indices {
        let index = rdr.read_u32()? as usize;
        let texture = texture_list
            .get(index)
            .copied()
            .ok_or(FormatError::Malformed { reason: "texture index out of range" })?;
        material.textures.push(texture);
    }

    material.vertex_flags = rdr.read_u32()?;

    if game == Game::Echoes {
        material.echoes_unknown_a = rdr.read_u32()?;
        material.echoes_unknown_b = rdr.read_u32()?;
    }

    rdr.read_u32()?; // Group index, recomputed on cook

    if flags & KONST_FLAG != 0 {
        let num_konst = rdr.read_u32()?;
        material.konst_colors.reserve(num_konst as usize);
        for _ in 0..num_konst {
            material.konst_colors.push(rdr.read_u32()?);
        }
    }

    material.blend_dst = rdr.read_u16()?;
    material.blend_src = rdr.read_u16()?;

    let num_channels = rdr.read_u32()?;
    for channel in 0..num_channels {
        let channel_flags = rdr.read_u32()?;
        if channel == 0 {
            material.lighting_enabled = channel_flags & 1 != 0;
        }
    }

    Ok(material)
}

/// Each record's end offset is stored relative to the start of the material
/// data, so trailing fields a record may carry are skipped by seeking.
pub fn load_material_set<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<MaterialSet, FormatError> {
    let mut set = MaterialSet::default();

    // The newer set layout is not understood yet.
    if game > Game::Echoes {
        return Ok(set);
    }

    let num_textures = rdr.read_u32()?;
    let mut texture_list = Vec::with_capacity(num_textures as usize);
    for _ in 0..num_textures {
        texture_list.push(AssetId::parse(rdr, IdWidth::K32)?);
    }

    let num_materials = rdr.read_u32()?;
    let mut end_offsets = Vec::with_capacity(num_materials as usize);
    for _ in 0..num_materials {
        end_offsets.push(rdr.read_u32()?);
    }

    let materials_start = rdr.tell()?;
    for end_offset in end_offsets {
        set.materials.push(load_material(rdr, game, &texture_list)?);
        rdr.seek(materials_start + u64::from(end_offset))?;
    }

    Ok(set)
}

pub fn try_load_material_set<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Option<MaterialSet> {
    match load_material_set(rdr, game) {
        Ok(set) => Some(set),
        Err(err) => {
            error!("Failed to load material set: {err}");
            None
        }
    }
}
