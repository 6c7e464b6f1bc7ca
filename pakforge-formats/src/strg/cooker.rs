use std::io::{Seek, Write};

use crate::FormatError;
use crate::common::{BinWriter, Game};
use crate::strg::types::{STRG_MAGIC, StringTable};

pub fn cook_strg<W: Write + Seek>(
    table: &StringTable,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    match table.game {
        Game::PrimeDemo => write_prime_demo(table, out),
        Game::Prime | Game::EchoesDemo | Game::Echoes | Game::CorruptionProto => {
            write_prime(table, out)
        }
        Game::Corruption | Game::DkcReturns => write_corruption(table, out),
    }
}

fn write_prime_demo<W: Write + Seek>(
    table: &StringTable,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    let english = table
        .english_index()
        .ok_or(FormatError::Malformed { reason: "string table has no English language" })?;
    let strings = &table.languages[english].strings;

    let start_offset = out.tell()?;
    out.write_u32(0)?; // File size, patched below
    let table_start = out.tell()?;
    out.write_u32(strings.len() as u32)?;

    for _ in strings {
        out.write_u32(0)?;
    }

    let mut string_offsets = Vec::with_capacity(strings.len());
    for string in strings {
        string_offsets.push((out.tell()? - table_start) as u32);
        out.write_wide_cstring(&string.text)?;
    }

    let file_size = (out.tell()? - start_offset) as u32;
    out.seek(start_offset)?;
    out.write_u32(file_size)?;
    out.skip(4)?;
    for offset in string_offsets {
        out.write_u32(offset)?;
    }
    out.seek(start_offset + u64::from(file_size))?;
    Ok(())
}

fn write_prime<W: Write + Seek>(
    table: &StringTable,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    out.write_u32(STRG_MAGIC)?;
    out.write_u32(if table.game >= Game::EchoesDemo { 1 } else { 0 })?;
    out.write_u32(table.languages.len() as u32)?;
    out.write_u32(table.string_count() as u32)?;

    let languages_start = out.tell()?;
    for language in &table.languages {
        out.write_fourcc(language.language)?;
        out.write_u32(0)?; // Offset, patched below
        if table.game >= Game::EchoesDemo {
            out.write_u32(0)?; // Size, patched below
        }
    }

    if table.game >= Game::EchoesDemo {
        write_name_table(table, out)?;
    }

    let string_data_start = out.tell()?;
    let mut language_offsets = Vec::with_capacity(table.languages.len());
    let mut language_sizes = Vec::with_capacity(table.languages.len());

    for language in &table.languages {
        let language_start = out.tell()?;
        language_offsets.push((language_start - string_data_start) as u32);

        if table.game == Game::Prime {
            out.write_u32(0)?; // Size, patched below
        }

        let string_offset_base = out.tell()?;
        for _ in &language.strings {
            out.write_u32(0)?;
        }

        let mut string_offsets = Vec::with_capacity(language.strings.len());
        for string in &language.strings {
            string_offsets.push((out.tell()? - string_offset_base) as u32);
            out.write_wide_cstring(&string.text)?;
        }

        let language_end = out.tell()?;
        let language_size = (language_end - string_offset_base) as u32;
        language_sizes.push(language_size);
        out.seek(language_start)?;

        if table.game == Game::Prime {
            out.write_u32(language_size)?;
        }
        for offset in string_offsets {
            out.write_u32(offset)?;
        }
        out.seek(language_end)?;
    }

    let strg_end = out.tell()?;

    out.seek(languages_start)?;
    for (idx, _) in table.languages.iter().enumerate() {
        out.skip(4)?; // Language fourcc stays
        out.write_u32(language_offsets[idx])?;
        if table.game >= Game::EchoesDemo {
            out.write_u32(language_sizes[idx])?;
        }
    }

    out.seek(strg_end)?;
    Ok(())
}

fn write_corruption<W: Write + Seek>(
    table: &StringTable,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    let english = table
        .english_index()
        .ok_or(FormatError::Malformed { reason: "string table has no English language" })?;
    let num_strings = table.string_count();

    out.write_u32(STRG_MAGIC)?;
    out.write_u32(3)?;
    out.write_u32(table.languages.len() as u32)?;
    out.write_u32(num_strings as u32)?;

    write_name_table(table, out)?;

    for language in &table.languages {
        out.write_fourcc(language.language)?;
    }

    let language_info_start = out.tell()?;
    for _ in &table.languages {
        out.write_u32(0)?; // Pool size, patched below
        for _ in 0..num_strings {
            out.write_u32(0)?;
        }
    }

    // Strings are written interleaved per index so non-localized entries can
    // point back at the English bytes.
    let strings_start = out.tell()?;
    let mut string_offsets = vec![vec![0u32; num_strings]; table.languages.len()];
    let mut total_sizes = vec![0u32; table.languages.len()];

    for string_idx in 0..num_strings {
        for (language_idx, language) in table.languages.iter().enumerate() {
            let string = &language.strings[string_idx];

            if language_idx == english || string.localized {
                string_offsets[language_idx][string_idx] = (out.tell()? - strings_start) as u32;
                total_sizes[language_idx] += string.text.len() as u32 + 1;
                out.write_u32(string.text.len() as u32 + 1)?;
                out.write_cstring(&string.text)?;
            } else {
                string_offsets[language_idx][string_idx] = string_offsets[english][string_idx];
                total_sizes[language_idx] +=
                    table.languages[english].strings[string_idx].text.len() as u32 + 1;
            }
        }
    }

    let strg_end = out.tell()?;

    out.seek(language_info_start)?;
    for (language_idx, _) in table.languages.iter().enumerate() {
        out.write_u32(total_sizes[language_idx])?;
        for string_idx in 0..num_strings {
            out.write_u32(string_offsets[language_idx][string_idx])?;
        }
    }

    out.seek(strg_end)?;
    Ok(())
}

fn write_name_table<W: Write + Seek>(
    table: &StringTable,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    // Entries are sorted by name so the game can binary-search them.
    let mut entries: Vec<(u32, &str)> = (0..table.string_count() as u32)
        .map(|idx| (idx, table.name_by_index(idx as usize)))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    entries.sort_by(|a, b| a.1.cmp(b.1));

    let name_table_start = out.tell()?;
    out.write_u32(entries.len() as u32)?;
    out.write_u32(0)?; // Table size, patched below
    let offsets_start = out.tell()?;

    for (index, _) in &entries {
        out.write_u32(0)?; // Name offset, patched below
        out.write_u32(*index)?;
    }

    let mut name_offsets = Vec::with_capacity(entries.len());
    for (_, name) in &entries {
        name_offsets.push((out.tell()? - offsets_start) as u32);
        out.write_cstring(name)?;
    }

    let name_table_end = out.tell()?;
    let name_table_size = (name_table_end - offsets_start) as u32;

    out.seek(name_table_start)?;
    out.skip(4)?;
    out.write_u32(name_table_size)?;
    for offset in name_offsets {
        out.write_u32(offset)?;
        out.skip(4)?;
    }

    out.seek(name_table_end)?;
    Ok(())
}
