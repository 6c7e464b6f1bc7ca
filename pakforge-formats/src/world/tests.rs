use std::io::Cursor;

use crate::FormatError;
use crate::common::{AssetId, BinReader, BinWriter, FourCC, Game};
use crate::world::cooker::{NoCookSupport, WorldCookSupport, cook_mlvl, mlvl_version};
use crate::world::reader::load_mlvl;
use crate::world::types::{
    AreaRecord, Dock, DockConnection, Layer, MemoryRelay, TimeAttackData, World,
};

fn cook(world: &World) -> anyhow::Result<Vec<u8>> {
    let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
    cook_mlvl(world, &mut out, &mut NoCookSupport)?;
    Ok(out.into_inner().into_inner())
}

fn sample_area(game: Game, index: u64) -> AreaRecord {
    let mut area = AreaRecord::new(game);
    area.area_name = AssetId::new(game.id_width(), 0x100 + index);
    area.area_res_id = AssetId::new(game.id_width(), 0x200 + index);
    area.area_id = AssetId::new(game.id_width(), 0x300 + index);
    area.transform = [
        1.0, 0.0, 0.0, 5.0, //
        0.0, 1.0, 0.0, 6.0, //
        0.0, 0.0, 1.0, 7.0,
    ];
    area.bounds = [-10.0, -10.0, 0.0, 10.0, 10.0, 4.0];
    area.layers = vec![
        Layer {
            name: "Default".to_owned(),
            active: true,
            state_id: [0; 16],
        },
        Layer {
            name: "2nd Pass".to_owned(),
            active: false,
            state_id: [0; 16],
        },
    ];
    area
}

#[test]
fn prime_round_trip() -> anyhow::Result<()> {
    let mut world = World::new(Game::Prime);
    world.world_name = AssetId::new_32(0xAAAA0001);
    world.save_world = AssetId::new_32(0xAAAA0002);
    world.default_skybox = AssetId::new_32(0xAAAA0003);
    world.map_world = AssetId::new_32(0xAAAA0004);
    world.memory_relays = vec![MemoryRelay {
        instance_id: 0x10001,
        target_id: 0x10002,
        message: 13,
        active: true,
    }];

    let mut area = sample_area(Game::Prime, 1);
    area.attached_area_indices = vec![1];
    area.docks = vec![Dock {
        connecting: vec![DockConnection {
            area_index: 1,
            dock_index: 0,
        }],
        coordinates: [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 2.0],
            [0.0, 0.0, 2.0],
        ],
    }];
    world.areas = vec![area];

    let bytes = cook(&world)?;
    let loaded = load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes)))?;

    assert_eq!(loaded, world);
    Ok(())
}

/// Reports audio group usage per area, unsorted and with one group shared
/// between areas. Dependency tables stay empty.
struct AudioGroupSupport;

impl WorldCookSupport for AudioGroupSupport {
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

    fn area_audio_groups(&mut self, area: AssetId) -> Result<Vec<(u32, AssetId)>, FormatError> {
        if area == AssetId::new_32(0x201) {
            Ok(vec![
                (7, AssetId::new_32(0xA6000001)),
                (2, AssetId::new_32(0xA6000002)),
            ])
        } else {
            Ok(vec![
                (7, AssetId::new_32(0xA6000001)),
                (5, AssetId::new_32(0xA6000003)),
            ])
        }
    }
}

#[test]
fn prime_cook_merges_and_sorts_the_audio_group_table() -> anyhow::Result<()> {
    let mut world = World::new(Game::Prime);
    world.world_name = AssetId::new_32(0xAAAA0001);
    world.save_world = AssetId::new_32(0xAAAA0002);
    world.default_skybox = AssetId::new_32(0xAAAA0003);
    world.map_world = AssetId::new_32(0xAAAA0004);
    world.areas = vec![sample_area(Game::Prime, 1), sample_area(Game::Prime, 2)];

    let plain = cook(&world)?;
    let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
    cook_mlvl(&world, &mut out, &mut AudioGroupSupport)?;
    let bytes = out.into_inner().into_inner();

    // Only the audio group table differs from the empty-support cook. The
    // first differing byte is the low byte of the table's count word, since
    // the counts are 0 and 3 with identical high bytes.
    let diverge = plain
        .iter()
        .zip(&bytes)
        .position(|(a, b)| a != b)
        .expect("cooks must differ in the audio group table");
    let table_start = diverge - 3;

    let mut rdr = BinReader::big_endian(Cursor::new(bytes.clone()));
    rdr.seek(table_start as u64)?;

    // Deduplicated across areas and ordered by group ID.
    assert_eq!(rdr.read_u32()?, 3);
    assert_eq!(rdr.read_u32()?, 2);
    assert_eq!(rdr.read_u32()?, 0xA6000002);
    assert_eq!(rdr.read_u32()?, 5);
    assert_eq!(rdr.read_u32()?, 0xA6000003);
    assert_eq!(rdr.read_u32()?, 7);
    assert_eq!(rdr.read_u32()?, 0xA6000001);
    assert_eq!(rdr.read_u8()?, 0);

    // Everything past the table matches the empty-support cook, and the
    // output still loads (the table is skipped on read).
    let tail = rdr.tell()? as usize;
    assert_eq!(&bytes[tail..], &plain[table_start + 5..]);
    let loaded = load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes)))?;
    assert_eq!(loaded, world);
    Ok(())
}

#[test]
fn echoes_round_trip_keeps_dark_world_and_names() -> anyhow::Result<()> {
    let mut world = World::new(Game::Echoes);
    world.world_name = AssetId::new_32(0xBBBB0001);
    world.dark_world_name = AssetId::new_32(0xBBBB0002);
    world.temple_key_world_index = 2;
    world.save_world = AssetId::new_32(0xBBBB0003);
    world.default_skybox = AssetId::new_32(0xBBBB0004);
    world.map_world = AssetId::new_32(0xBBBB0005);

    let mut area = sample_area(Game::Echoes, 1);
    area.internal_name = "01_sidehopperstation".to_owned();
    world.areas = vec![area];

    let bytes = cook(&world)?;
    let loaded = load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes)))?;

    assert_eq!(loaded, world);
    Ok(())
}

#[test]
fn corruption_round_trip_keeps_layer_state_ids() -> anyhow::Result<()> {
    let mut world = World::new(Game::Corruption);
    world.world_name = AssetId::new_64(0xCCCC000000000001);
    world.save_world = AssetId::new_64(0xCCCC000000000002);
    world.default_skybox = AssetId::new_64(0xCCCC000000000003);
    world.map_world = AssetId::new_64(0xCCCC000000000004);

    let mut area = sample_area(Game::Corruption, 1);
    area.internal_name = "01_intro_landing".to_owned();
    area.layers[0].state_id = [0xAB; 16];
    world.areas = vec![area];

    let bytes = cook(&world)?;
    let loaded = load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes)))?;

    assert_eq!(loaded, world);
    Ok(())
}

#[test]
fn returns_round_trip_keeps_time_attack() -> anyhow::Result<()> {
    let mut world = World::new(Game::DkcReturns);
    world.world_name = AssetId::new_64(0xDDDD000000000001);
    world.save_world = AssetId::new_64(0xDDDD000000000002);
    world.default_skybox = AssetId::new_64(0xDDDD000000000003);
    world.time_attack = Some(TimeAttackData {
        act_number: "1-1".to_owned(),
        bronze_time: 120.0,
        silver_time: 90.0,
        gold_time: 60.0,
        shiny_gold_time: 45.0,
    });

    let mut area = sample_area(Game::DkcReturns, 1);
    area.internal_name = "jungle_01".to_owned();
    world.areas = vec![area];

    let bytes = cook(&world)?;
    let loaded = load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes)))?;

    assert_eq!(loaded, world);
    Ok(())
}

#[test]
fn bad_magic_is_rejected() {
    let bytes = vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 0x11];
    assert!(load_mlvl(&mut BinReader::big_endian(Cursor::new(bytes))).is_err());
}

#[test]
fn version_map_is_total_for_cookable_games() {
    assert_eq!(mlvl_version(Game::Prime), Some(0x11));
    assert_eq!(mlvl_version(Game::Echoes), Some(0x17));
    assert_eq!(mlvl_version(Game::CorruptionProto), None);
}
