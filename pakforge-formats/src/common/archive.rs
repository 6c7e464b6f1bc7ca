//! Tagged binary archive used for editor-side persistence (project and
//! package definitions, the resource database cache) and for Echoes-style
//! property data. Every field is framed as a 32-bit parameter ID plus a
//! 16-bit payload size, so readers can look fields up by ID and skip the
//! ones they do not know.

use std::io::{Read, Seek, Write};

use crate::FormatError;
use crate::common::FourCC;
use crate::common::reader::BinReader;
use crate::common::writer::BinWriter;

/// Writer half of the tagged archive. Parameter sizes are written as
/// placeholders and patched when the parameter is closed, so parameters
/// nest freely.
pub struct TaggedWriter<W: Write + Seek> {
    out: BinWriter<W>,
    // Offsets of the still-unpatched size fields, innermost last.
    open_params: Vec<u64>,
}

impl<W: Write + Seek> TaggedWriter<W> {
    pub fn new(mut out: BinWriter<W>, magic: FourCC, version: u32) -> Result<Self, FormatError> {
        out.write_fourcc(magic)?;
        out.write_u32(version)?;
        Ok(TaggedWriter {
            out,
            open_params: Vec::new(),
        })
    }

    pub fn begin_param(&mut self, id: u32) -> Result<(), FormatError> {
        self.out.write_u32(id)?;
        self.open_params.push(self.out.tell()?);
        self.out.write_u16(0)?;
        Ok(())
    }

    pub fn end_param(&mut self) -> Result<(), FormatError> {
        let size_offset = self
            .open_params
            .pop()
            .ok_or(FormatError::Malformed { reason: "end_param without begin_param" })?;
        let end = self.out.tell()?;
        let size = end - (size_offset + 2);
        debug_assert!(size <= u64::from(u16::MAX));

        self.out.seek(size_offset)?;
        self.out.write_u16(size as u16)?;
        self.out.seek(end)?;
        Ok(())
    }

    /// The underlying writer, for the parameter payload itself.
    pub fn inner(&mut self) -> &mut BinWriter<W> {
        &mut self.out
    }

    pub fn finish(self) -> Result<W, FormatError> {
        debug_assert!(self.open_params.is_empty());
        Ok(self.out.into_inner())
    }
}

#[derive(Debug, Copy, Clone)]
struct Scope {
    start: u64,
    end: u64,
}

/// Reader half of the tagged archive. `find_param` scans the current scope,
/// so fields may be read in any order and unknown fields are skipped.
pub struct TaggedReader<R: Read + Seek> {
    rdr: BinReader<R>,
    version: u32,
    scopes: Vec<Scope>,
}

impl<R: Read + Seek> TaggedReader<R> {
    pub fn new(mut rdr: BinReader<R>, magic: FourCC) -> Result<Self, FormatError> {
        let file_magic = rdr.read_fourcc()?;
        if file_magic != magic {
            return Err(FormatError::InvalidMagic { magic: file_magic.to_u32() });
        }

        let version = rdr.read_u32()?;
        let start = rdr.tell()?;
        let end = rdr.size()?;
        Ok(TaggedReader {
            rdr,
            version,
            scopes: vec![Scope { start, end }],
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Seeks to the payload of the parameter with the given ID in the current
    /// scope and enters it. Returns false when the scope has no such
    /// parameter, leaving the position unchanged in any meaningful way for
    /// the caller (the next lookup rescans from the scope start).
    pub fn find_param(&mut self, id: u32) -> Result<bool, FormatError> {
        let scope = *self.scopes.last().ok_or(FormatError::Malformed {
            reason: "find_param on a finished archive",
        })?;
        self.rdr.seek(scope.start)?;

        while self.rdr.tell()? < scope.end {
            let param_id = self.rdr.read_u32()?;
            let size = u64::from(self.rdr.read_u16()?);
            let payload_start = self.rdr.tell()?;

            if param_id == id {
                self.scopes.push(Scope {
                    start: payload_start,
                    end: payload_start + size,
                });
                return Ok(true);
            }
            self.rdr.seek(payload_start + size)?;
        }

        Ok(false)
    }

    /// Leaves the current parameter scope.
    pub fn end_param(&mut self) -> Result<(), FormatError> {
        if self.scopes.len() <= 1 {
            return Err(FormatError::Malformed { reason: "end_param without find_param" });
        }

        let scope = self.scopes.pop().unwrap();
        self.rdr.seek(scope.end)?;
        Ok(())
    }

    pub fn inner(&mut self) -> &mut BinReader<R> {
        &mut self.rdr
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::fourcc;

    const MAGIC: FourCC = fourcc!(b"TEST");

    #[test]
    fn out_of_order_lookup_and_unknown_skip() -> anyhow::Result<()> {
        let out = BinWriter::big_endian(Cursor::new(Vec::new()));
        let mut archive = TaggedWriter::new(out, MAGIC, 3)?;

        archive.begin_param(0xAAAA0001)?;
        archive.inner().write_u32(17)?;
        archive.end_param()?;

        archive.begin_param(0xAAAA0002)?;
        archive.inner().write_sized_string("world")?;
        archive.end_param()?;

        let bytes = archive.finish()?.into_inner();

        let rdr = BinReader::big_endian(Cursor::new(bytes));
        let mut archive = TaggedReader::new(rdr, MAGIC)?;
        assert_eq!(archive.version(), 3);

        // Read back in reverse order.
        assert!(archive.find_param(0xAAAA0002)?);
        assert_eq!(archive.inner().read_sized_string()?, "world");
        archive.end_param()?;

        assert!(archive.find_param(0xAAAA0001)?);
        assert_eq!(archive.inner().read_u32()?, 17);
        archive.end_param()?;

        assert!(!archive.find_param(0xDEAD0000)?);
        Ok(())
    }

    #[test]
    fn nested_params() -> anyhow::Result<()> {
        let out = BinWriter::big_endian(Cursor::new(Vec::new()));
        let mut archive = TaggedWriter::new(out, MAGIC, 1)?;

        archive.begin_param(0x10)?;
        {
            archive.begin_param(0x11)?;
            archive.inner().write_u16(7)?;
            archive.end_param()?;
            archive.begin_param(0x12)?;
            archive.inner().write_u16(9)?;
            archive.end_param()?;
        }
        archive.end_param()?;

        let bytes = archive.finish()?.into_inner();
        let mut archive = TaggedReader::new(BinReader::big_endian(Cursor::new(bytes)), MAGIC)?;

        assert!(archive.find_param(0x10)?);
        assert!(archive.find_param(0x12)?);
        assert_eq!(archive.inner().read_u16()?, 9);
        archive.end_param()?;
        assert!(archive.find_param(0x11)?);
        assert_eq!(archive.inner().read_u16()?, 7);
        archive.end_param()?;
        archive.end_param()?;
        Ok(())
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"NOPE");
        bytes.extend_from_slice(&[0, 0, 0, 1]);

        let result = TaggedReader::new(BinReader::big_endian(Cursor::new(bytes)), MAGIC);
        assert!(matches!(result, Err(FormatError::InvalidMagic { .. })));
    }
}
