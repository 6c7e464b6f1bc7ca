use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, IdWidth};
use crate::dgrp::DependencyGroup;

pub const MAPW_MAGIC: u32 = 0xDEADF00D;
pub const MAPU_MAGIC: u32 = 0xABCDEF01;

/// World map. Only the area table is read, as a dependency list.
pub fn load_mapw<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_u32()?;
    if magic != MAPW_MAGIC {
        return Err(FormatError::InvalidMagic { magic });
    }
    let version = rdr.read_u32()?;
    if version != 1 {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let num_areas = rdr.read_u32()?;

    // The area table is the last thing in the file. Assume 32-bit IDs; if
    // data follows that is not the 0xFFFFFFFF pad run, the IDs are 64-bit.
    let areas_start = rdr.tell()?;
    rdr.skip(i64::from(num_areas) * 4)?;
    let width = if rdr.remaining()? < 4 || rdr.read_u32()? == 0xFFFFFFFF {
        IdWidth::K32
    } else {
        IdWidth::K64
    };
    rdr.seek(areas_start)?;

    let mut group = DependencyGroup::default();
    for _ in 0..num_areas {
        group.add(AssetId::parse(rdr, width)?);
    }

    Ok(group)
}

/// Universe map, linking the per-world maps together.
pub fn load_mapu<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let magic = rdr.read_u32()?;
    if magic != MAPU_MAGIC {
        return Err(FormatError::InvalidMagic { magic });
    }
    let version = rdr.read_u32()?;
    if version != 1 {
        return Err(FormatError::UnsupportedVersion { version });
    }

    let mut group = DependencyGroup::default();
    group.add(AssetId::new_32(rdr.read_u32()?)); // Hexagon CMDL

    let num_worlds = rdr.read_u32()?;
    for _ in 0..num_worlds {
        rdr.read_cstring()?; // World name
        group.add(AssetId::new_32(rdr.read_u32()?)); // World MLVL
        rdr.skip(0x30)?; // Map transform
        let num_hexagons = rdr.read_u32()?;
        rdr.skip(i64::from(num_hexagons) * 0x30)?;
        rdr.skip(0x10)?; // World color
    }

    Ok(group)
}

pub fn try_load_mapw<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<DependencyGroup> {
    match load_mapw(rdr) {
        Ok(group) => Some(group),
        Err(err) => {
            error!("Failed to load MAPW: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::BinWriter;

    #[test]
    fn mapw_narrow_ids_at_end_of_file() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(MAPW_MAGIC)?;
        out.write_u32(1)?;
        out.write_u32(2)?;
        out.write_u32(0x11111111)?;
        out.write_u32(0x22222222)?;

        let bytes = out.into_inner().into_inner();
        let group = load_mapw(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(
            group.dependencies,
            vec![AssetId::new_32(0x11111111), AssetId::new_32(0x22222222)]
        );
        Ok(())
    }

    #[test]
    fn mapw_wide_ids_detected_by_trailing_data() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(MAPW_MAGIC)?;
        out.write_u32(1)?;
        out.write_u32(1)?;
        out.write_u64(0x1234567812345678)?;

        let bytes = out.into_inner().into_inner();
        let group = load_mapw(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(group.dependencies, vec![AssetId::new_64(0x1234567812345678)]);
        Ok(())
    }

    #[test]
    fn mapu_collects_hexagon_and_world_refs() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(MAPU_MAGIC)?;
        out.write_u32(1)?;
        out.write_u32(0xAAAAAAAA)?;
        out.write_u32(1)?;
        out.write_cstring("Tallon Overworld")?;
        out.write_u32(0xBBBBBBBB)?;
        out.write_bytes(&[0; 0x30])?;
        out.write_u32(2)?;
        out.write_bytes(&[0; 0x60])?;
        out.write_bytes(&[0; 0x10])?;

        let bytes = out.into_inner().into_inner();
        let group = load_mapu(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(
            group.dependencies,
            vec![AssetId::new_32(0xAAAAAAAA), AssetId::new_32(0xBBBBBBBB)]
        );
        Ok(())
    }

    #[test]
    fn mapw_bad_magic_is_rejected() {
        let bytes = 0xDEADBEEFu32.to_be_bytes().to_vec();
        assert!(load_mapw(&mut BinReader::big_endian(Cursor::new(bytes))).is_err());
    }
}
