//! Loaders for formats whose structure is not understood well enough to
//! parse fully. They exist to recover asset references, so most of them
//! produce a plain dependency group.

use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game, IdWidth};
use crate::dgrp::DependencyGroup;
use crate::fourcc;

/// Lookup into the set of known asset IDs. The cheat scan needs it to tell
/// real references apart from coincidental byte patterns.
pub trait AssetIdRegistry {
    fn is_registered(&self, id: AssetId) -> bool;
}

/// Checks every byte offset of the remaining data for a registered asset ID.
/// False positives are possible and accepted; a missed reference would break
/// repacking, an extra one only drags in an unused file.
pub fn cheat_scan<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
    registry: &dyn AssetIdRegistry,
) -> Result<Vec<AssetId>, FormatError> {
    let remaining = rdr.remaining()?;
    let data = rdr.read_bytes(remaining as usize)?;

    let mut found = Vec::new();

    if game <= Game::Echoes {
        for window in data.windows(4) {
            let id = AssetId::new_32(u32::from_be_bytes(window.try_into().unwrap()));
            if registry.is_registered(id) {
                found.push(id);
            }
        }
    } else {
        for window in data.windows(8) {
            let id = AssetId::new_64(u64::from_be_bytes(window.try_into().unwrap()));
            if registry.is_registered(id) {
                found.push(id);
            }
        }
    }

    Ok(found)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioMacro {
    pub macro_name: String,
    pub samples: Vec<AssetId>,
}

pub fn load_caud<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    registry: &dyn AssetIdRegistry,
) -> Result<AudioMacro, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"CAUD") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let version = rdr.read_u32()?;
    let game = match version {
        0x2 => Game::CorruptionProto,
        0x9 => Game::Corruption,
        0xE => Game::DkcReturns,
        _ => return Err(FormatError::UnsupportedVersion { version }),
    };

    let mut audio_macro = AudioMacro {
        macro_name: rdr.read_cstring()?,
        ..AudioMacro::default()
    };

    // The DKCR revision dropped the sample data size field, which makes the
    // sample list unreachable without parsing the whole macro.
    if game == Game::DkcReturns {
        audio_macro.samples = cheat_scan(rdr, game, registry)?;
        return Ok(audio_macro);
    }

    let num_vol_groups = rdr.read_u32()?;
    for _ in 0..num_vol_groups {
        rdr.read_cstring()?;
    }

    rdr.skip(if game == Game::CorruptionProto { 0x10 } else { 0x14 })?;
    let num_samples = rdr.read_u32()?;

    for _ in 0..num_samples {
        let sample_data_size = rdr.read_u32()?;
        let sample_data_end = rdr.tell()? + u64::from(sample_data_size);
        audio_macro.samples.push(AssetId::parse_for(rdr, game)?);
        rdr.seek(sample_data_end)?;
    }

    Ok(audio_macro)
}

/// MIDI data. The only dependency is the AGSC reference in the header.
pub fn load_csng<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_u32()?;
    if magic != 0x2 {
        return Err(FormatError::InvalidMagic { magic });
    }
    rdr.skip(0x8)?;

    let mut group = DependencyGroup::default();
    group.add(AssetId::new_32(rdr.read_u32()?));
    Ok(group)
}

/// DUMB files have no consistent layout; each one is different. The HIER
/// variant is recognizable by its magic, the rest get the cheat scan.
pub fn load_dumb<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
    registry: &dyn AssetIdRegistry,
) -> Result<DependencyGroup, FormatError> {
    if rdr.peek_u32()? == fourcc!(b"HIER").to_u32() {
        return load_hier(rdr, game);
    }

    let mut group = DependencyGroup::default();
    for id in cheat_scan(rdr, game, registry)? {
        group.add(id);
    }
    Ok(group)
}

pub fn load_fsm2<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"FSM2") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let mut group = DependencyGroup::default();
    let version = rdr.read_u32()?;
    let num_states = rdr.read_u32()?;
    let num_unk_a = rdr.read_u32()?;
    let num_unk_b = rdr.read_u32()?;
    let num_unk_c = rdr.read_u32()?;
    if version != 1 && version != 2 {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let skip_named_entries = |rdr: &mut BinReader<R>| -> Result<(), FormatError> {
        let count = rdr.read_u32()?;
        for _ in 0..count {
            rdr.read_cstring()?;
            rdr.skip(0x4)?;
        }
        Ok(())
    };

    for _ in 0..num_states {
        rdr.read_cstring()?;
        if version >= 2 {
            rdr.skip(0x10)?;
        }
        skip_named_entries(rdr)?;
    }

    for _ in 0..num_unk_a {
        rdr.read_cstring()?;
        if version >= 2 {
            rdr.skip(0x10)?;
        }
        rdr.skip(0x4)?;
        skip_named_entries(rdr)?;
        rdr.skip(0x1)?;
    }

    for _ in 0..num_unk_b {
        rdr.read_cstring()?;
        if version >= 2 {
            rdr.skip(0x10)?;
        }
        skip_named_entries(rdr)?;
    }

    for _ in 0..num_unk_c {
        rdr.read_cstring()?;
        if version >= 2 {
            rdr.skip(0x10)?;
        }
        skip_named_entries(rdr)?;
        group.add(AssetId::parse_for(rdr, game)?);
    }

    Ok(group)
}

pub fn load_fsmc<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
    registry: &dyn AssetIdRegistry,
) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"FSMC") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let mut group = DependencyGroup::default();
    for id in cheat_scan(rdr, game, registry)? {
        group.add(id);
    }
    Ok(group)
}

pub fn load_hier<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"HIER") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let num_nodes = rdr.read_u32()?;
    let mut group = DependencyGroup::default();

    // The MP3 copy of this file is byte-identical to the MP2 one, still
    // with 32-bit asset IDs that mean nothing there. Ignore it.
    if game > Game::Echoes {
        return Ok(group);
    }

    for _ in 0..num_nodes {
        // The scan ID that follows is not treated as a dependency.
        group.add(AssetId::new_32(rdr.read_u32()?));
        rdr.read_cstring()?;
        rdr.skip(0x8)?;
    }

    Ok(group)
}

/// Rule set. May reference a parent rule set; nothing else.
pub fn load_rule<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"RULE") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let mut group = DependencyGroup::default();
    rdr.skip(0x1)?;

    // A 64-bit parent ID pushes the rule set count two bytes further out,
    // where the data makes for an implausibly large count.
    let id_offset = rdr.tell()?;
    rdr.skip(0x4)?;
    let rule_set_count = rdr.read_u16()?;
    let width = if rule_set_count > 0xFF {
        IdWidth::K64
    } else {
        IdWidth::K32
    };
    rdr.seek(id_offset)?;

    group.add(AssetId::parse(rdr, width)?);
    Ok(group)
}

pub fn try_load_caud<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    registry: &dyn AssetIdRegistry,
) -> Option<AudioMacro> {
    match load_caud(rdr, registry) {
        Ok(audio_macro) => Some(audio_macro),
        Err(err) => {
            error!("Failed to load CAUD: {err}");
            None
        }
    }
}
