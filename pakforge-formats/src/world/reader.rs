use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game};
use crate::world::types::{
    AreaRecord, Dock, DockConnection, Layer, MLVL_MAGIC, MemoryRelay, TimeAttackData, World,
};

pub fn version_for(file_version: u32) -> Result<Game, FormatError> {
    match file_version {
        0xD => Ok(Game::PrimeDemo),
        0x11 => Ok(Game::Prime),
        0x14 => Ok(Game::EchoesDemo),
        0x17 => Ok(Game::Echoes),
        0x19 => Ok(Game::Corruption),
        0x1B => Ok(Game::DkcReturns),
        _ => Err(FormatError::UnsupportedVersion { version: file_version }),
    }
}

pub fn load_mlvl<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<World, FormatError> {
    let magic = rdr.read_u32()?;
    if magic != MLVL_MAGIC {
        return Err(FormatError::InvalidMagic { magic });
    }

    let game = version_for(rdr.read_u32()?)?;
    let mut world = World::new(game);

    if game == Game::DkcReturns {
        load_returns(rdr, &mut world)?;
    } else {
        load_prime(rdr, &mut world)?;
    }

    Ok(world)
}

fn load_prime<R: Read + Seek>(rdr: &mut BinReader<R>, world: &mut World) -> Result<(), FormatError> {
    let game = world.game;

    if game < Game::CorruptionProto {
        world.world_name = AssetId::new_32(rdr.read_u32()?);

        if game == Game::Echoes {
            world.dark_world_name = AssetId::new_32(rdr.read_u32()?);
        }
        if game >= Game::Echoes {
            world.temple_key_world_index = rdr.read_u32()?;
        }
        if game >= Game::Prime {
            world.save_world = AssetId::new_32(rdr.read_u32()?);
        }
        world.default_skybox = AssetId::new_32(rdr.read_u32()?);
    } else {
        world.world_name = AssetId::new_64(rdr.read_u64()?);
        world.temple_key_world_index = rdr.read_u32()?;
        world.save_world = AssetId::new_64(rdr.read_u64()?);
        world.default_skybox = AssetId::new_64(rdr.read_u64()?);
    }

    // Memory relays only exist in the first retail build.
    if game == Game::Prime {
        let num_relays = rdr.read_u32()?;
        world.memory_relays.reserve(num_relays as usize);
        for _ in 0..num_relays {
            world.memory_relays.push(MemoryRelay {
                instance_id: rdr.read_u32()?,
                target_id: rdr.read_u32()?,
                message: rdr.read_u16()?,
                active: rdr.read_bool()?,
            });
        }
    }

    let num_areas = rdr.read_u32()?;
    if game == Game::Prime {
        rdr.skip(4)?;
    }

    for _ in 0..num_areas {
        let mut area = AreaRecord::new(game);
        area.area_name = AssetId::parse_for(rdr, game)?;
        for value in area.transform.iter_mut() {
            *value = rdr.read_f32()?;
        }
        for value in area.bounds.iter_mut() {
            *value = rdr.read_f32()?;
        }
        area.area_res_id = AssetId::parse_for(rdr, game)?;
        area.area_id = AssetId::parse_for(rdr, game)?;

        let num_attached = rdr.read_u32()?;
        for _ in 0..num_attached {
            area.attached_area_indices.push(rdr.read_u16()?);
        }

        // The cooked dependency list is regenerated on cook, no point
        // keeping it.
        if game < Game::CorruptionProto {
            rdr.skip(4)?;
            let num_dependencies = rdr.read_u32()?;
            rdr.skip(i64::from(num_dependencies) * 8)?;
            let num_offsets = rdr.read_u32()?;
            rdr.skip(i64::from(num_offsets) * 4)?;
        }

        let num_docks = rdr.read_u32()?;
        for _ in 0..num_docks {
            let num_connecting = rdr.read_u32()?;
            let mut dock = Dock {
                connecting: Vec::with_capacity(num_connecting as usize),
                coordinates: [[0.0; 3]; 4],
            };
            for _ in 0..num_connecting {
                dock.connecting.push(DockConnection {
                    area_index: rdr.read_u32()?,
                    dock_index: rdr.read_u32()?,
                });
            }

            let num_coordinates = rdr.read_u32()?;
            if num_coordinates != 4 {
                return Err(FormatError::Malformed { reason: "dock without 4 corner points" });
            }
            for coordinate in dock.coordinates.iter_mut() {
                *coordinate = rdr.read_vec3()?;
            }
            area.docks.push(dock);
        }

        if game == Game::EchoesDemo || game == Game::Echoes {
            let num_modules = rdr.read_u32()?;
            for _ in 0..num_modules {
                area.module_filenames.push(rdr.read_cstring()?);
            }

            if game == Game::Echoes {
                let num_offsets = rdr.read_u32()?;
                for _ in 0..num_offsets {
                    area.module_layer_offsets.push(rdr.read_u32()?);
                }
            }
        }

        if game >= Game::EchoesDemo {
            area.internal_name = rdr.read_cstring()?;
        }

        world.areas.push(area);
    }

    world.map_world = AssetId::parse_for(rdr, game)?;
    // Unused script layer marker, always zero.
    rdr.skip(5)?;

    // Audio groups are regenerated on cook.
    if game == Game::Prime {
        let num_groups = rdr.read_u32()?;
        rdr.skip(i64::from(num_groups) * 8)?;
        rdr.skip(1)?;
    }

    load_layers(rdr, world)?;
    Ok(())
}

fn load_returns<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    world: &mut World,
) -> Result<(), FormatError> {
    world.world_name = AssetId::new_64(rdr.read_u64()?);

    if rdr.read_bool()? {
        world.time_attack = Some(TimeAttackData {
            act_number: rdr.read_cstring()?,
            bronze_time: rdr.read_f32()?,
            silver_time: rdr.read_f32()?,
            gold_time: rdr.read_f32()?,
            shiny_gold_time: rdr.read_f32()?,
        });
    }

    world.save_world = AssetId::new_64(rdr.read_u64()?);
    world.default_skybox = AssetId::new_64(rdr.read_u64()?);

    let num_areas = rdr.read_u32()?;
    for _ in 0..num_areas {
        let mut area = AreaRecord::new(world.game);
        area.area_name = AssetId::new_64(rdr.read_u64()?);
        for value in area.transform.iter_mut() {
            *value = rdr.read_f32()?;
        }
        for value in area.bounds.iter_mut() {
            *value = rdr.read_f32()?;
        }
        area.area_res_id = AssetId::new_64(rdr.read_u64()?);
        area.area_id = AssetId::new_64(rdr.read_u64()?);
        rdr.skip(4)?;
        area.internal_name = rdr.read_cstring()?;
        world.areas.push(area);
    }

    load_layers(rdr, world)?;
    Ok(())
}

fn load_layers<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    world: &mut World,
) -> Result<(), FormatError> {
    // Redundant area count.
    rdr.skip(4)?;
    for area in world.areas.iter_mut() {
        let num_layers = rdr.read_u32()?;
        let flags = rdr.read_u64()?;

        for layer_idx in 0..num_layers {
            area.layers.push(Layer {
                name: String::new(),
                active: (flags >> layer_idx) & 1 == 1,
                state_id: [0; 16],
            });
        }
    }

    // Redundant layer count.
    rdr.skip(4)?;
    for area in world.areas.iter_mut() {
        for layer in area.layers.iter_mut() {
            layer.name = rdr.read_cstring()?;
        }
    }

    if world.game >= Game::Corruption {
        rdr.skip(4)?;
        for area in world.areas.iter_mut() {
            for layer in area.layers.iter_mut() {
                let bytes = rdr.read_bytes(16)?;
                layer.state_id.copy_from_slice(&bytes);
            }
        }
    }

    // The rest of the file is layer name offsets, recomputed on cook.
    Ok(())
}

pub fn try_load_mlvl<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<World> {
    match load_mlvl(rdr) {
        Ok(world) => Some(world),
        Err(err) => {
            error!("Failed to load MLVL: {err}");
            None
        }
    }
}
