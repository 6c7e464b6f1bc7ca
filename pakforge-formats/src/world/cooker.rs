use std::collections::BTreeSet;
use std::io::{Seek, Write};

use crate::FormatError;
use crate::common::{AssetId, BinWriter, FourCC, Game};
use crate::world::types::{MLVL_MAGIC, World};

/// Data the world cooker cannot derive from the world object alone. Area
/// dependency tables and audio group usage are regenerated from the resource
/// database on every cook.
pub trait WorldCookSupport {
    /// Transitive dependency list of an area plus the per-layer offsets into
    /// it, with each ID's cooked type fourcc resolved.
    fn area_dependencies(
        &mut self,
        area: AssetId,
    ) -> Result<(Vec<(AssetId, FourCC)>, Vec<u32>), FormatError>;

    /// Module (.rel) dependencies of an area plus per-layer offsets.
    fn module_dependencies(&mut self, area: AssetId) -> Result<(Vec<String>, Vec<u32>), FormatError>;

    /// Audio groups referenced by an area as (group ID, AGSC asset) pairs.
    fn area_audio_groups(&mut self, area: AssetId) -> Result<Vec<(u32, AssetId)>, FormatError>;
}

/// Support impl for worlds that carry no cooked areas, e.g. in tests or when
/// cooking a freshly created world.
pub struct NoCookSupport;

impl WorldCookSupport for NoCookSupport {
    fn area_dependencies(
        &mut self,
        _area: AssetId,
    ) -> Result<(Vec<(AssetId, FourCC)>, Vec<u32>), FormatError> {
        Ok((Vec::new(), Vec::new()))
    }

    fn module_dependencies(
        &mut self,
        _area: AssetId,
    ) -> Result<(Vec<String>, Vec<u32>), FormatError> {
        Ok((Vec::new(), Vec::new()))
    }

    fn area_audio_groups(&mut self, _area: AssetId) -> Result<Vec<(u32, AssetId)>, FormatError> {
        Ok(Vec::new())
    }
}

pub fn mlvl_version(game: Game) -> Option<u32> {
    match game {
        Game::PrimeDemo => Some(0xD),
        Game::Prime => Some(0x11),
        Game::EchoesDemo => Some(0x14),
        Game::Echoes => Some(0x17),
        Game::Corruption => Some(0x19),
        Game::DkcReturns => Some(0x1B),
        Game::CorruptionProto => None,
    }
}

pub fn cook_mlvl<W: Write + Seek>(
    world: &World,
    out: &mut BinWriter<W>,
    support: &mut dyn WorldCookSupport,
) -> Result<(), FormatError> {
    let game = world.game;
    let version = mlvl_version(game).ok_or(FormatError::UnsupportedVersion { version: 0 })?;

    out.write_u32(MLVL_MAGIC)?;
    out.write_u32(version)?;

    world.world_name.write(out)?;

    if game == Game::EchoesDemo || game == Game::Echoes {
        world.dark_world_name.write(out)?;
    }
    if game >= Game::EchoesDemo && game <= Game::Corruption {
        out.write_u32(world.temple_key_world_index)?;
    }
    if game == Game::DkcReturns {
        match &world.time_attack {
            Some(data) => {
                out.write_bool(true)?;
                out.write_cstring(&data.act_number)?;
                out.write_f32(data.bronze_time)?;
                out.write_f32(data.silver_time)?;
                out.write_f32(data.gold_time)?;
                out.write_f32(data.shiny_gold_time)?;
            }
            None => out.write_bool(false)?,
        }
    }

    world.save_world.write(out)?;
    world.default_skybox.write(out)?;

    if game == Game::Prime {
        out.write_u32(world.memory_relays.len() as u32)?;
        for relay in &world.memory_relays {
            out.write_u32(relay.instance_id)?;
            out.write_u32(relay.target_id)?;
            out.write_u16(relay.message)?;
            out.write_bool(relay.active)?;
        }
    }

    out.write_u32(world.areas.len() as u32)?;
    if game <= Game::Prime {
        out.write_u32(1)?; // Unknown
    }

    let mut audio_groups: BTreeSet<(u32, AssetId)> = BTreeSet::new();

    for area in &world.areas {
        area.area_name.write(out)?;
        for value in area.transform {
            out.write_f32(value)?;
        }
        for value in area.bounds {
            out.write_f32(value)?;
        }
        area.area_res_id.write(out)?;
        area.area_id.write(out)?;

        if game <= Game::Corruption {
            out.write_u32(area.attached_area_indices.len() as u32)?;
            for index in &area.attached_area_indices {
                out.write_u16(*index)?;
            }
        }

        if game <= Game::Echoes {
            let (dependencies, layer_offsets) = support.area_dependencies(area.area_res_id)?;
            for group in support.area_audio_groups(area.area_res_id)? {
                audio_groups.insert(group);
            }

            out.write_u32(0)?;
            out.write_u32(dependencies.len() as u32)?;
            for (id, type_code) in &dependencies {
                id.write(out)?;
                out.write_fourcc(*type_code)?;
            }

            out.write_u32(layer_offsets.len() as u32)?;
            for offset in &layer_offsets {
                out.write_u32(*offset)?;
            }
        }

        if game <= Game::Corruption {
            out.write_u32(area.docks.len() as u32)?;
            for dock in &area.docks {
                out.write_u32(dock.connecting.len() as u32)?;
                for connection in &dock.connecting {
                    out.write_u32(connection.area_index)?;
                    out.write_u32(connection.dock_index)?;
                }
                out.write_u32(dock.coordinates.len() as u32)?;
                for coordinate in dock.coordinates {
                    out.write_vec3(coordinate)?;
                }
            }
        }

        if game == Game::EchoesDemo || game == Game::Echoes {
            let (module_names, module_offsets) = support.module_dependencies(area.area_res_id)?;

            out.write_u32(module_names.len() as u32)?;
            for name in &module_names {
                out.write_cstring(name)?;
            }
            out.write_u32(module_offsets.len() as u32)?;
            for offset in &module_offsets {
                out.write_u32(*offset)?;
            }
        }

        if game == Game::DkcReturns {
            out.write_u32(0)?;
        }

        if game >= Game::EchoesDemo {
            out.write_cstring(&area.internal_name)?;
        }
    }

    if game <= Game::Corruption {
        world.map_world.write(out)?;
        // Unused script layer, never populated in retail builds.
        out.write_u8(0)?;
        out.write_u32(0)?;
    }

    if game <= Game::Prime {
        // (group ID, asset) pairs, ordered by group ID.
        out.write_u32(audio_groups.len() as u32)?;
        for (group_id, asset) in &audio_groups {
            out.write_u32(*group_id)?;
            asset.write(out)?;
        }
        out.write_u8(0)?;
    }

    write_layers(world, out)?;
    Ok(())
}

fn write_layers<W: Write + Seek>(world: &World, out: &mut BinWriter<W>) -> Result<(), FormatError> {
    out.write_u32(world.areas.len() as u32)?;

    let mut layer_names = Vec::new();
    let mut layer_state_ids = Vec::new();
    let mut layer_name_offsets = Vec::new();

    for area in &world.areas {
        layer_name_offsets.push(layer_names.len() as u32);
        out.write_u32(area.layers.len() as u32)?;

        let mut active_flags = u64::MAX;
        for (layer_idx, layer) in area.layers.iter().enumerate() {
            if !layer.active {
                active_flags &= !(1u64 << layer_idx);
            }
            layer_names.push(layer.name.as_str());
            layer_state_ids.push(layer.state_id);
        }
        out.write_u64(active_flags)?;
    }

    out.write_u32(layer_names.len() as u32)?;
    for name in &layer_names {
        out.write_cstring(name)?;
    }

    if world.game >= Game::Corruption {
        out.write_u32(layer_state_ids.len() as u32)?;
        for state_id in &layer_state_ids {
            out.write_bytes(state_id)?;
        }
    }

    out.write_u32(layer_name_offsets.len() as u32)?;
    for offset in layer_name_offsets {
        out.write_u32(offset)?;
    }

    Ok(())
}
