use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game, IdWidth};
use crate::dgrp::DependencyGroup;

/// GUI frame. The old layout has no dependency table, so the widget list is
/// walked and model, font and texture references are picked out of the
/// widgets that carry them.
pub fn load_frme<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<DependencyGroup, FormatError> {
    let version = rdr.read_u32()?;
    let mut group = DependencyGroup::default();

    match version {
        0 | 1 => {
            rdr.skip(0xC)?;
            let num_widgets = rdr.read_u32()?;

            for _ in 0..num_widgets {
                let widget_type = rdr.read_fourcc()?;
                rdr.read_cstring()?; // Widget name
                rdr.read_cstring()?; // Parent name
                rdr.skip(0x18)?;

                match &widget_type.0 {
                    b"HWIG" | b"BWIG" => {}
                    b"CAMR" => {
                        let projection_type = rdr.read_u32()?;
                        rdr.skip(if projection_type == 0 { 0x10 } else { 0x18 })?;
                    }
                    b"LITE" => {
                        let light_type = rdr.read_u32()?;
                        rdr.skip(0x1C)?;
                        if light_type == 0 {
                            rdr.skip(0x4)?;
                        }
                    }
                    b"METR" => rdr.skip(0xA)?,
                    b"GRUP" => rdr.skip(0x3)?,
                    b"TBGP" => rdr.skip(0x23)?,
                    b"MODL" => {
                        group.add(AssetId::parse(rdr, IdWidth::K32)?); // Model
                        rdr.skip(0x8)?;
                    }
                    b"TXPN" => {
                        rdr.skip(0x14)?;
                        group.add(AssetId::parse(rdr, IdWidth::K32)?); // Font
                        rdr.skip(0x32)?;

                        if version == 1 {
                            group.add(AssetId::parse(rdr, IdWidth::K32)?); // Japanese font
                            rdr.skip(0x8)?;
                        }
                    }
                    b"IMGP" => {
                        group.add(AssetId::parse(rdr, IdWidth::K32)?); // Texture
                        if rdr.read_u32()? != 0xFFFFFFFF {
                            return Err(FormatError::Malformed {
                                reason: "image pane with a second texture reference",
                            });
                        }
                        rdr.skip(0x4)?;

                        let num_quad_coords = rdr.read_u32()?;
                        rdr.skip(i64::from(num_quad_coords) * 0xC)?;
                        let num_uv_coords = rdr.read_u32()?;
                        rdr.skip(i64::from(num_uv_coords) * 8)?;
                    }
                    b"ENRG" => {
                        group.add(AssetId::parse(rdr, IdWidth::K32)?); // Texture
                    }
                    b"SLGP" => rdr.skip(0x10)?,
                    _ => {
                        error!("Unrecognized FRME widget type: {widget_type}");
                        return Err(FormatError::Malformed { reason: "unrecognized widget type" });
                    }
                }

                // Widget footer.
                if rdr.read_i8()? != 0 {
                    rdr.skip(0x2)?;
                }
                rdr.skip(0x42)?;
            }
        }

        // Newer layouts put a dependency list right at the start.
        4 | 5 | 0xD | 0xE | 0x10 => {
            let game = match version {
                4 => Game::Echoes,
                0x10 => Game::DkcReturns,
                _ => Game::Corruption,
            };

            let num_dependencies = rdr.read_u32()?;
            for _ in 0..num_dependencies {
                rdr.skip(0x4)?; // Dependency type fourcc
                group.add(AssetId::parse_for(rdr, game)?);
            }
        }

        _ => {
            return Err(FormatError::UnsupportedVersion { version });
        }
    }

    Ok(group)
}

pub fn try_load_frme<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<DependencyGroup> {
    match load_frme(rdr) {
        Ok(group) => Some(group),
        Err(err) => {
            error!("Failed to load FRME: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::{BinWriter, FourCC};
    use crate::fourcc;

    fn write_widget_header(
        out: &mut BinWriter<Cursor<Vec<u8>>>,
        widget_type: &[u8; 4],
        name: &str,
    ) -> anyhow::Result<()> {
        out.write_fourcc(FourCC(*widget_type))?;
        out.write_cstring(name)?;
        out.write_cstring("kGSYS_HeadWidgetID")?;
        out.write_bytes(&[0; 0x18])?;
        Ok(())
    }

    fn write_widget_footer(out: &mut BinWriter<Cursor<Vec<u8>>>) -> anyhow::Result<()> {
        out.write_i8(0)?;
        out.write_bytes(&[0; 0x42])?;
        Ok(())
    }

    #[test]
    fn widget_walk_collects_model_and_texture_refs() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(0)?;
        out.write_bytes(&[0; 0xC])?;
        out.write_u32(3)?;

        write_widget_header(&mut out, b"HWIG", "headwidget")?;
        write_widget_footer(&mut out)?;

        write_widget_header(&mut out, b"MODL", "model")?;
        out.write_u32(0xCD000001)?;
        out.write_bytes(&[0; 8])?;
        write_widget_footer(&mut out)?;

        write_widget_header(&mut out, b"ENRG", "energybar")?;
        out.write_u32(0x7E000002)?;
        write_widget_footer(&mut out)?;

        let bytes = out.into_inner().into_inner();
        let group = load_frme(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(
            group.dependencies,
            vec![AssetId::new_32(0xCD000001), AssetId::new_32(0x7E000002)]
        );
        Ok(())
    }

    #[test]
    fn text_pane_reads_both_fonts_in_the_later_revision() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(1)?;
        out.write_bytes(&[0; 0xC])?;
        out.write_u32(1)?;

        write_widget_header(&mut out, b"TXPN", "textpane")?;
        out.write_bytes(&[0; 0x14])?;
        out.write_u32(0xF0000001)?;
        out.write_bytes(&[0; 0x32])?;
        out.write_u32(0xF0000002)?;
        out.write_bytes(&[0; 8])?;
        write_widget_footer(&mut out)?;

        let bytes = out.into_inner().into_inner();
        let group = load_frme(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(
            group.dependencies,
            vec![AssetId::new_32(0xF0000001), AssetId::new_32(0xF0000002)]
        );
        Ok(())
    }

    #[test]
    fn flat_dependency_list_in_newer_versions() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(0xD)?;
        out.write_u32(2)?;
        out.write_fourcc(fourcc!(b"TXTR"))?;
        out.write_u64(0x1000000000000001)?;
        out.write_fourcc(fourcc!(b"FONT"))?;
        out.write_u64(0x1000000000000002)?;

        let bytes = out.into_inner().into_inner();
        let group = load_frme(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(
            group.dependencies,
            vec![
                AssetId::new_64(0x1000000000000001),
                AssetId::new_64(0x1000000000000002)
            ]
        );
        Ok(())
    }

    #[test]
    fn unknown_version_is_rejected() {
        let bytes = 2u32.to_be_bytes().to_vec();
        assert!(load_frme(&mut BinReader::big_endian(Cursor::new(bytes))).is_err());
    }
}
