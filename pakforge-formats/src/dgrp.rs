use std::io::{Read, Seek, Write};

use crate::FormatError;
use crate::common::{AssetId, BinReader, BinWriter, FourCC, IdWidth};

/// Flat ordered list of asset references. Several cooked formats whose
/// structure is otherwise unknown load into this shape as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGroup {
    pub dependencies: Vec<AssetId>,
}

impl DependencyGroup {
    pub fn add(&mut self, id: AssetId) {
        self.dependencies.push(id);
    }
}

/// The only difference between the 32-bit and 64-bit layouts is the ID width,
/// and there is no version field. Assume 32-bit entries, seek past them and
/// accept that reading iff fewer than 32 bytes remain and all of them are
/// pad bytes (0xFF).
pub fn detect_id_width<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    dep_count: u32,
) -> Result<IdWidth, FormatError> {
    let start = rdr.tell()?;
    rdr.skip(i64::from(dep_count) * 8)?;
    let remaining = rdr.remaining()?;

    let mut width = IdWidth::K64;

    if remaining < 32 {
        let mut is_eof = true;
        for _ in 0..remaining {
            if rdr.read_u8()? != 0xFF {
                is_eof = false;
                break;
            }
        }

        if is_eof {
            width = IdWidth::K32;
        }
    }

    rdr.seek(start)?;
    Ok(width)
}

pub fn load_dgrp<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let num_dependencies = rdr.read_u32()?;
    let width = detect_id_width(rdr, num_dependencies)?;

    let mut group = DependencyGroup::default();
    for _ in 0..num_dependencies {
        // Dependency type fourcc, redundant with the store's own records.
        rdr.skip(4)?;
        group.add(AssetId::parse(rdr, width)?);
    }

    Ok(group)
}

/// Entries carry the resource type on disk, which the in-memory group does
/// not, so the caller resolves types before cooking.
pub fn cook_dgrp<W: Write + Seek>(
    entries: &[(FourCC, AssetId)],
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    out.write_u32(entries.len() as u32)?;
    for (type_code, id) in entries {
        out.write_fourcc(*type_code)?;
        id.write(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::fourcc;

    fn reader(bytes: Vec<u8>) -> BinReader<Cursor<Vec<u8>>> {
        BinReader::big_endian(Cursor::new(bytes))
    }

    #[test]
    fn narrow_ids_detected_by_trailing_padding() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        cook_dgrp(
            &[
                (fourcc!(b"TXTR"), AssetId::new_32(0x11111111)),
                (fourcc!(b"CMDL"), AssetId::new_32(0x22222222)),
            ],
            &mut BinWriter::big_endian(Cursor::new(&mut bytes)),
        )?;

        let group = load_dgrp(&mut reader(bytes))?;
        assert_eq!(
            group.dependencies,
            vec![AssetId::new_32(0x11111111), AssetId::new_32(0x22222222)]
        );
        Ok(())
    }

    #[test]
    fn wide_ids_detected_by_overrun() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        cook_dgrp(
            &[
                (fourcc!(b"TXTR"), AssetId::new_64(0x1111111111111111)),
                (fourcc!(b"CMDL"), AssetId::new_64(0x2222222222222222)),
            ],
            &mut BinWriter::big_endian(Cursor::new(&mut bytes)),
        )?;

        let group = load_dgrp(&mut reader(bytes))?;
        assert_eq!(
            group.dependencies,
            vec![
                AssetId::new_64(0x1111111111111111),
                AssetId::new_64(0x2222222222222222)
            ]
        );
        Ok(())
    }

    #[test]
    fn trailing_pak_padding_still_reads_as_narrow() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        {
            let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
            cook_dgrp(&[(fourcc!(b"AGSC"), AssetId::new_32(0xAB))], &mut out)?;
            out.write_to_boundary(32, 0xFF)?;
        }

        let group = load_dgrp(&mut reader(bytes))?;
        assert_eq!(group.dependencies, vec![AssetId::new_32(0xAB)]);
        Ok(())
    }
}
