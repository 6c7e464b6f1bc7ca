use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{BinReader, Game};

/// Only the sound define IDs and the group ID are pulled out of the group
/// file; the sample pool itself stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioGroup {
    pub group_name: String,
    pub group_id: u16,
    pub define_ids: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioLookupTable {
    pub define_ids: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringList {
    pub strings: Vec<String>,
}

pub fn load_agsc<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<AudioGroup, FormatError> {
    let game = if rdr.peek_u32()? == 0x1 {
        Game::Echoes
    } else {
        Game::Prime
    };
    let mut group = AudioGroup::default();

    // Header, then navigate to the project chunk.
    if game == Game::Prime {
        rdr.read_cstring()?;
        group.group_name = rdr.read_cstring()?;
        let pool_size = rdr.read_u32()?;
        rdr.skip(i64::from(pool_size) + 0x4)?;
    } else {
        rdr.skip(0x4)?;
        group.group_name = rdr.read_cstring()?;
        group.group_id = rdr.read_u16()?;
        let pool_size = rdr.read_u32()?;
        rdr.skip(0xC + i64::from(pool_size))?;
    }

    // An empty project chunk starts with 0xFFFF.
    let peek = rdr.peek_u32()? >> 16;
    if peek != 0xFFFF {
        let proj_start = rdr.tell()?;
        rdr.skip(0x4)?;
        let group_id = rdr.read_u16()?;
        let group_type = rdr.read_u16()?;
        rdr.skip(0x14)?;
        let sfx_table_start = rdr.read_u32()?;

        if game == Game::Prime {
            group.group_id = group_id;
        } else {
            debug_assert_eq!(group.group_id, group_id);
        }

        if group_type == 1 {
            rdr.seek(proj_start + u64::from(sfx_table_start))?;
            let num_sounds = rdr.read_u16()?;
            rdr.skip(0x2)?;

            group.define_ids.reserve(num_sounds as usize);
            for _ in 0..num_sounds {
                group.define_ids.push(rdr.read_u16()?);
                rdr.skip(0x8)?;
            }
        }
    }

    Ok(group)
}

pub fn load_atbl<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<AudioLookupTable, FormatError> {
    let num_macro_ids = rdr.read_u32()?;
    let mut table = AudioLookupTable::default();

    table.define_ids.reserve(num_macro_ids as usize);
    for _ in 0..num_macro_ids {
        table.define_ids.push(rdr.read_u16()?);
    }

    Ok(table)
}

pub fn load_stlc<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<StringList, FormatError> {
    let num_strings = rdr.read_u32()?;
    let mut list = StringList::default();

    list.strings.reserve(num_strings as usize);
    for _ in 0..num_strings {
        list.strings.push(rdr.read_cstring()?);
    }

    Ok(list)
}

pub fn try_load_agsc<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<AudioGroup> {
    match load_agsc(rdr) {
        Ok(group) => Some(group),
        Err(err) => {
            error!("Failed to load AGSC: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::BinWriter;

    fn build_prime_agsc() -> anyhow::Result<Vec<u8>> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_cstring("test_AGSC")?;
        out.write_cstring("test")?;
        out.write_u32(2)?; // Pool size
        out.write_bytes(&[0; 2])?;
        out.write_u32(0)?; // Project chunk size

        // Project chunk: one sound group with a 2-entry sfx table.
        out.write_u32(0)?;
        out.write_u16(123)?; // Group ID
        out.write_u16(1)?; // Group type
        out.write_bytes(&[0; 0x14])?;
        out.write_u32(0x20)?; // Sfx table offset

        out.write_u16(2)?;
        out.write_u16(0)?;
        for define_id in [0x5B0u16, 0x5B1] {
            out.write_u16(define_id)?;
            out.write_bytes(&[0; 8])?;
        }

        Ok(out.into_inner().into_inner())
    }

    #[test]
    fn prime_group_reads_name_and_define_ids() -> anyhow::Result<()> {
        let bytes = build_prime_agsc()?;
        let group = load_agsc(&mut BinReader::big_endian(Cursor::new(bytes)))?;

        assert_eq!(group.group_name, "test");
        assert_eq!(group.group_id, 123);
        assert_eq!(group.define_ids, vec![0x5B0, 0x5B1]);
        Ok(())
    }

    #[test]
    fn empty_project_chunk_has_no_defines() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_cstring("x")?;
        out.write_cstring("empty")?;
        out.write_u32(0)?;
        out.write_u32(0)?;
        out.write_u32(0xFFFFFFFF)?;

        let bytes = out.into_inner().into_inner();
        let group = load_agsc(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(group.group_name, "empty");
        assert!(group.define_ids.is_empty());
        Ok(())
    }

    #[test]
    fn lookup_table_and_string_list() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(3)?;
        for id in [1u16, 2, 0xFFFF] {
            out.write_u16(id)?;
        }
        let bytes = out.into_inner().into_inner();
        let table = load_atbl(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(table.define_ids, vec![1, 2, 0xFFFF]);

        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(2)?;
        out.write_cstring("SW3_gui")?;
        out.write_cstring("SW3_samus")?;
        let bytes = out.into_inner().into_inner();
        let list = load_stlc(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(list.strings, vec!["SW3_gui", "SW3_samus"]);
        Ok(())
    }
}
