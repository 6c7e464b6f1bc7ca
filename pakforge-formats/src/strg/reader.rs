use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{BinReader, Game};
use crate::strg::types::{LANGUAGE_ENGLISH, LanguageData, STRG_MAGIC, StringData, StringTable};

/// The demo format has no magic or version; its first u32 is the file size.
/// Cooked files can carry up to 31 pad bytes, so "points at the end of the
/// file" is accepted with that tolerance.
pub fn detect_version<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<Game, FormatError> {
    let magic = rdr.read_u32()?;

    if magic != STRG_MAGIC {
        let size = rdr.size()?;
        if u64::from(magic) <= size && u64::from(magic) > size.saturating_sub(32) {
            return Ok(Game::PrimeDemo);
        }
        return Err(FormatError::InvalidMagic { magic });
    }

    let version = rdr.read_u32()?;
    match version {
        0x0 => Ok(Game::Prime),
        0x1 => Ok(Game::Echoes),
        0x3 => Ok(Game::Corruption),
        _ => Err(FormatError::UnsupportedVersion { version }),
    }
}

pub fn load_strg<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<StringTable, FormatError> {
    let game = detect_version(rdr)?;

    let mut table = StringTable {
        game,
        languages: Vec::new(),
        string_names: Vec::new(),
    };

    if game == Game::PrimeDemo {
        load_prime_demo(rdr, &mut table)?;
    } else if game < Game::Corruption {
        load_prime(rdr, &mut table)?;
    } else {
        load_corruption(rdr, &mut table)?;
    }

    Ok(table)
}

/// One implicit English language, a bare string count and offset table.
fn load_prime_demo<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    table: &mut StringTable,
) -> Result<(), FormatError> {
    let table_start = rdr.tell()?;
    let num_strings = rdr.read_u32()?;

    let mut offsets = Vec::with_capacity(num_strings as usize);
    for _ in 0..num_strings {
        offsets.push(rdr.read_u32()?);
    }

    let mut strings = Vec::with_capacity(num_strings as usize);
    for offset in offsets {
        rdr.seek(table_start + u64::from(offset))?;
        strings.push(StringData {
            text: rdr.read_wide_cstring()?,
            localized: true,
        });
    }

    table.languages.push(LanguageData {
        language: LANGUAGE_ENGLISH,
        strings,
    });
    Ok(())
}

/// Prime through the Corruption prototype. Echoes inserts per-language sizes
/// and a name table; Prime instead prefixes each language's string pool with
/// its size.
fn load_prime<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    table: &mut StringTable,
) -> Result<(), FormatError> {
    let num_languages = rdr.read_u32()?;
    let num_strings = rdr.read_u32()?;

    let mut language_offsets = Vec::with_capacity(num_languages as usize);
    for _ in 0..num_languages {
        let language = rdr.read_fourcc()?;
        language_offsets.push(rdr.read_u32()?);

        if table.game >= Game::EchoesDemo {
            rdr.skip(4)?;
        }

        table.languages.push(LanguageData {
            language,
            strings: Vec::new(),
        });
    }

    if table.game >= Game::EchoesDemo {
        load_name_table(rdr, table)?;
    }

    let strings_start = rdr.tell()?;
    for language_idx in 0..num_languages as usize {
        rdr.seek(strings_start + u64::from(language_offsets[language_idx]))?;

        if table.game == Game::Prime {
            rdr.skip(4)?;
        }

        let language_start = rdr.tell()?;
        let mut string_offsets = Vec::with_capacity(num_strings as usize);
        for _ in 0..num_strings {
            string_offsets.push(language_start + u64::from(rdr.read_u32()?));
        }

        for offset in string_offsets {
            rdr.seek(offset)?;
            table.languages[language_idx].strings.push(StringData {
                text: rdr.read_wide_cstring()?,
                localized: true,
            });
        }
    }

    let english_idx = table.english_index().ok_or(FormatError::Malformed {
        reason: "string table has no English language",
    })?;

    for language_idx in 0..table.languages.len() {
        for string_idx in 0..num_strings as usize {
            let localized = language_idx == english_idx
                || table.languages[language_idx].strings[string_idx].text
                    != table.languages[english_idx].strings[string_idx].text;
            table.languages[language_idx].strings[string_idx].localized = localized;
        }
    }

    Ok(())
}

/// Corruption and DKCR. Non-localized strings reuse the English entry's
/// offset instead of duplicating the bytes.
fn load_corruption<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    table: &mut StringTable,
) -> Result<(), FormatError> {
    let num_languages = rdr.read_u32()?;
    let num_strings = rdr.read_u32()?;

    load_name_table(rdr, table)?;

    for _ in 0..num_languages {
        table.languages.push(LanguageData {
            language: rdr.read_fourcc()?,
            strings: Vec::new(),
        });
    }

    let english_idx = table.english_index().ok_or(FormatError::Malformed {
        reason: "string table has no English language",
    })?;

    let mut language_offsets = Vec::with_capacity(num_languages as usize);
    for _ in 0..num_languages {
        // Total string pool size per language, unused on load.
        rdr.skip(4)?;
        let mut offsets = Vec::with_capacity(num_strings as usize);
        for _ in 0..num_strings {
            offsets.push(rdr.read_u32()?);
        }
        language_offsets.push(offsets);
    }

    let strings_start = rdr.tell()?;
    for language_idx in 0..num_languages as usize {
        for string_idx in 0..num_strings as usize {
            rdr.seek(strings_start + u64::from(language_offsets[language_idx][string_idx]))?;
            rdr.skip(4)?;
            let localized = language_idx == english_idx
                || language_offsets[language_idx][string_idx]
                    != language_offsets[english_idx][string_idx];
            table.languages[language_idx].strings.push(StringData {
                text: rdr.read_cstring()?,
                localized,
            });
        }
    }

    Ok(())
}

fn load_name_table<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    table: &mut StringTable,
) -> Result<(), FormatError> {
    let name_count = rdr.read_u32()?;
    let name_table_size = rdr.read_u32()?;
    let name_table_start = rdr.tell()?;
    let name_table_end = name_table_start + u64::from(name_table_size);

    // Not every string has a name, so size the array by the highest index.
    let mut defs = Vec::with_capacity(name_count as usize);
    let mut max_index: Option<u32> = None;

    for _ in 0..name_count {
        let name_offset = name_table_start + u64::from(rdr.read_u32()?);
        let string_index = rdr.read_u32()?;
        max_index = Some(max_index.map_or(string_index, |max| max.max(string_index)));
        defs.push((name_offset, string_index));
    }

    if let Some(max_index) = max_index {
        table.string_names = vec![String::new(); max_index as usize + 1];
    }

    for (name_offset, string_index) in defs {
        rdr.seek(name_offset)?;
        table.string_names[string_index as usize] = rdr.read_cstring()?;
    }

    rdr.seek(name_table_end)?;
    Ok(())
}

/// Store-facing wrapper matching the "bad data loads as nothing" contract.
pub fn try_load_strg<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<StringTable> {
    match load_strg(rdr) {
        Ok(table) => Some(table),
        Err(err) => {
            error!("Failed to load STRG: {err}");
            None
        }
    }
}
