use std::collections::BTreeMap;
use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game};
use crate::fourcc;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Glyph {
    pub character: u16,
    /// Upper-left, upper-right, lower-left, lower-right.
    pub tex_coords: [[f32; 2]; 4],
    pub rgba_channel: u8,
    pub left_padding: i32,
    pub print_advance: i32,
    pub right_padding: i32,
    pub width: u32,
    pub height: u32,
    pub base_offset: u32,
    pub kerning_index: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KerningPair {
    pub character_a: u16,
    pub character_b: u16,
    pub adjust: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub game: Game,
    pub line_height: u32,
    pub vertical_offset: u32,
    pub line_margin: u32,
    pub default_size: u32,
    pub font_name: String,
    pub texture: AssetId,
    pub texture_format: u32,
    pub glyphs: BTreeMap<u16, Glyph>,
    pub kerning_table: Vec<KerningPair>,
}

pub fn version_for(version: u32) -> Result<Game, FormatError> {
    match version {
        1 => Ok(Game::PrimeDemo),
        2 => Ok(Game::Prime),
        4 => Ok(Game::Echoes),
        5 => Ok(Game::Corruption),
        _ => Err(FormatError::UnsupportedVersion { version }),
    }
}

pub fn load_font<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<Font, FormatError> {
    let magic = rdr.read_fourcc()?;
    if magic != fourcc!(b"FONT") {
        return Err(FormatError::InvalidMagic { magic: magic.to_u32() });
    }

    let game = version_for(rdr.read_u32()?)?;

    rdr.read_u32()?; // Unknown
    let line_height = rdr.read_u32()?;
    let vertical_offset = rdr.read_u32()?;
    let line_margin = rdr.read_u32()?;
    if game > Game::PrimeDemo {
        rdr.skip(0x4)?;
    }
    rdr.skip(0x2)?;
    let default_size = rdr.read_u32()?;
    let font_name = rdr.read_cstring()?;
    let texture = AssetId::parse_for(rdr, game)?;
    let texture_format = rdr.read_u32()?;

    let num_glyphs = rdr.read_u32()?;
    let mut glyphs = BTreeMap::new();

    for _ in 0..num_glyphs {
        let mut glyph = Glyph {
            character: rdr.read_u16()?,
            ..Glyph::default()
        };

        let left = rdr.read_f32()?;
        let up = rdr.read_f32()?;
        let right = rdr.read_f32()?;
        let down = rdr.read_f32()?;
        glyph.tex_coords = [[left, up], [right, up], [left, down], [right, down]];

        if game <= Game::Prime {
            glyph.left_padding = rdr.read_i32()?;
            glyph.print_advance = rdr.read_i32()?;
            glyph.right_padding = rdr.read_i32()?;
            glyph.width = rdr.read_u32()?;
            glyph.height = rdr.read_u32()?;
            glyph.base_offset = rdr.read_u32()?;
            glyph.kerning_index = rdr.read_u32()?;
        } else {
            glyph.rgba_channel = rdr.read_u8()?;
            glyph.left_padding = i32::from(rdr.read_i8()?);
            glyph.print_advance = i32::from(rdr.read_u8()?);
            glyph.right_padding = i32::from(rdr.read_i8()?);
            glyph.width = u32::from(rdr.read_u8()?);
            glyph.height = u32::from(rdr.read_u8()?);
            glyph.base_offset = u32::from(rdr.read_u8()?);
            glyph.kerning_index = u32::from(rdr.read_u16()?);
        }

        glyphs.insert(glyph.character, glyph);
    }

    let num_kerning_pairs = rdr.read_u32()?;
    let mut kerning_table = Vec::with_capacity(num_kerning_pairs as usize);
    for _ in 0..num_kerning_pairs {
        kerning_table.push(KerningPair {
            character_a: rdr.read_u16()?,
            character_b: rdr.read_u16()?,
            adjust: rdr.read_i32()?,
        });
    }

    Ok(Font {
        game,
        line_height,
        vertical_offset,
        line_margin,
        default_size,
        font_name,
        texture,
        texture_format,
        glyphs,
        kerning_table,
    })
}

pub fn try_load_font<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<Font> {
    match load_font(rdr) {
        Ok(font) => Some(font),
        Err(err) => {
            error!("Failed to load FONT: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::BinWriter;

    fn build_font(version: u32, glyph_fields: &dyn Fn(&mut BinWriter<Cursor<Vec<u8>>>) -> anyhow::Result<()>) -> anyhow::Result<Vec<u8>> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_fourcc(fourcc!(b"FONT"))?;
        out.write_u32(version)?;
        out.write_u32(0)?;
        out.write_u32(16)?; // Line height
        out.write_u32(2)?; // Vertical offset
        out.write_u32(1)?; // Line margin
        if version > 1 {
            out.write_u32(0)?;
        }
        out.write_u16(0)?;
        out.write_u32(14)?; // Default size
        out.write_cstring("Deface14B")?;
        if version == 5 {
            out.write_u64(0xAABBCCDD00112233)?;
        } else {
            out.write_u32(0xAABBCCDD)?;
        }
        out.write_u32(3)?; // Texture format

        out.write_u32(1)?;
        out.write_u16(u16::from(b'A'))?;
        for coord in [0.0f32, 0.0, 0.25, 0.5] {
            out.write_f32(coord)?;
        }
        glyph_fields(&mut out)?;

        out.write_u32(1)?;
        out.write_u16(u16::from(b'A'))?;
        out.write_u16(u16::from(b'V'))?;
        out.write_i32(-2)?;

        Ok(out.into_inner().into_inner())
    }

    #[test]
    fn prime_glyphs_use_wide_fields() -> anyhow::Result<()> {
        let bytes = build_font(2, &|out| {
            out.write_i32(-1)?; // Left padding
            out.write_i32(12)?; // Print advance
            out.write_i32(0)?; // Right padding
            out.write_u32(10)?; // Width
            out.write_u32(16)?; // Height
            out.write_u32(0)?; // Base offset
            out.write_u32(0)?; // Kerning index
            Ok(())
        })?;

        let font = load_font(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(font.game, Game::Prime);
        assert_eq!(font.font_name, "Deface14B");
        assert_eq!(font.texture, AssetId::new_32(0xAABBCCDD));

        let glyph = font.glyphs[&u16::from(b'A')];
        assert_eq!(glyph.print_advance, 12);
        assert_eq!(glyph.tex_coords[3], [0.25, 0.5]);
        assert_eq!(font.kerning_table[0].adjust, -2);
        Ok(())
    }

    #[test]
    fn corruption_glyphs_use_byte_fields_and_wide_ids() -> anyhow::Result<()> {
        let bytes = build_font(5, &|out| {
            out.write_u8(1)?; // RGBA channel
            out.write_i8(-1)?;
            out.write_u8(12)?;
            out.write_i8(0)?;
            out.write_u8(10)?;
            out.write_u8(16)?;
            out.write_u8(0)?;
            out.write_u16(7)?;
            Ok(())
        })?;

        let font = load_font(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(font.game, Game::Corruption);
        assert_eq!(font.texture, AssetId::new_64(0xAABBCCDD00112233));

        let glyph = font.glyphs[&u16::from(b'A')];
        assert_eq!(glyph.rgba_channel, 1);
        assert_eq!(glyph.left_padding, -1);
        assert_eq!(glyph.kerning_index, 7);
        Ok(())
    }

    #[test]
    fn wrong_magic_and_version_are_rejected() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_fourcc(fourcc!(b"TONF"))?;
        let bytes = out.into_inner().into_inner();
        assert!(load_font(&mut BinReader::big_endian(Cursor::new(bytes))).is_err());

        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_fourcc(fourcc!(b"FONT"))?;
        out.write_u32(3)?;
        let bytes = out.into_inner().into_inner();
        assert!(matches!(
            load_font(&mut BinReader::big_endian(Cursor::new(bytes))),
            Err(FormatError::UnsupportedVersion { version: 3 })
        ));
        Ok(())
    }
}
