use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game};
use crate::dgrp::DependencyGroup;

pub const HINT_MAGIC: u32 = 0x00BADBAD;

/// Hint system data. Loaded for its asset references only.
pub fn load_hint<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_u32()?;
    if magic != HINT_MAGIC {
        return Err(FormatError::InvalidMagic { magic });
    }

    let version = rdr.read_u32()?;
    let game = match version {
        0x1 => Game::Prime,
        0x3 => Game::Corruption,
        _ => return Err(FormatError::UnsupportedVersion { version }),
    };

    let mut group = DependencyGroup::default();
    let num_hints = rdr.read_u32()?;

    for _ in 0..num_hints {
        rdr.read_cstring()?; // Hint name
        rdr.skip(0x8)?; // Unknown, appear time
        group.add(AssetId::parse_for(rdr, game)?); // Pop-up text
        rdr.skip(0x4)?;

        if game <= Game::Echoes {
            rdr.skip(0x4)?;
            group.add(AssetId::parse_for(rdr, game)?); // Target world
            group.add(AssetId::parse_for(rdr, game)?); // Target area
            rdr.skip(0x4)?; // Target room index
            group.add(AssetId::parse_for(rdr, game)?); // Map text
        } else {
            let num_locations = rdr.read_u32()?;
            for _ in 0..num_locations {
                rdr.skip(0x14)?; // World/area IDs, area index
                group.add(AssetId::parse_for(rdr, game)?); // Objective text
                rdr.skip(0xC)?;
            }
        }
    }

    Ok(group)
}

pub fn try_load_hint<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<DependencyGroup> {
    match load_hint(rdr) {
        Ok(group) => Some(group),
        Err(err) => {
            error!("Failed to load HINT: {err}");
            None
        }
    }
}
