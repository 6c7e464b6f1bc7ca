use std::io::{Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::FormatError;
use crate::common::FourCC;
use crate::common::reader::Endian;

/// Seekable binary writer producing cooked asset data.
///
/// Cookers frequently write a placeholder, emit the body, then seek back and
/// patch the real value in; `tell`/`seek` support that pattern directly.
pub struct BinWriter<W: Write + Seek> {
    inner: W,
    endian: Endian,
}

macro_rules! write_prim {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) -> Result<(), FormatError> {
            match self.endian {
                Endian::Big => self.inner.$name::<BigEndian>(value)?,
                Endian::Little => self.inner.$name::<LittleEndian>(value)?,
            }
            Ok(())
        }
    };
}

impl<W: Write + Seek> BinWriter<W> {
    pub fn new(inner: W, endian: Endian) -> Self {
        BinWriter { inner, endian }
    }

    pub fn big_endian(inner: W) -> Self {
        BinWriter::new(inner, Endian::Big)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), FormatError> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    pub fn write_i8(&mut self, value: i8) -> Result<(), FormatError> {
        self.inner.write_i8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), FormatError> {
        self.write_u8(u8::from(value))
    }

    write_prim!(write_u16, u16);
    write_prim!(write_i16, i16);
    write_prim!(write_u32, u32);
    write_prim!(write_i32, i32);
    write_prim!(write_u64, u64);
    write_prim!(write_i64, i64);
    write_prim!(write_f32, f32);

    pub fn write_fourcc(&mut self, value: FourCC) -> Result<(), FormatError> {
        self.inner.write_all(&value.0)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    pub fn write_vec3(&mut self, value: [f32; 3]) -> Result<(), FormatError> {
        for component in value {
            self.write_f32(component)?;
        }
        Ok(())
    }

    pub fn write_vec4(&mut self, value: [f32; 4]) -> Result<(), FormatError> {
        for component in value {
            self.write_f32(component)?;
        }
        Ok(())
    }

    pub fn write_cstring(&mut self, value: &str) -> Result<(), FormatError> {
        self.inner.write_all(value.as_bytes())?;
        self.write_u8(0)
    }

    pub fn write_sized_string(&mut self, value: &str) -> Result<(), FormatError> {
        self.write_u32(value.len() as u32)?;
        self.write_bytes(value.as_bytes())
    }

    pub fn write_wide_cstring(&mut self, value: &str) -> Result<(), FormatError> {
        for unit in value.encode_utf16() {
            self.write_u16(unit)?;
        }
        self.write_u16(0)
    }

    pub fn tell(&mut self) -> Result<u64, FormatError> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek(&mut self, offset: u64) -> Result<(), FormatError> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn skip(&mut self, count: i64) -> Result<(), FormatError> {
        self.inner.seek(SeekFrom::Current(count))?;
        Ok(())
    }

    pub fn seek_end(&mut self) -> Result<u64, FormatError> {
        Ok(self.inner.seek(SeekFrom::End(0))?)
    }

    /// Pads with `fill` until the position is a multiple of `align`. No-op
    /// when already aligned.
    pub fn write_to_boundary(&mut self, align: u64, fill: u8) -> Result<(), FormatError> {
        let pos = self.tell()?;
        let remainder = pos % align;
        if remainder != 0 {
            let pad = vec![fill; (align - remainder) as usize];
            self.write_bytes(&pad)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::reader::BinReader;

    #[test]
    fn boundary_padding() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(7)?;
        out.write_to_boundary(32, 0xFF)?;
        assert_eq!(out.tell()?, 32);
        out.write_to_boundary(32, 0xFF)?;
        assert_eq!(out.tell()?, 32);

        let data = out.into_inner().into_inner();
        assert!(data[4..].iter().all(|b| *b == 0xFF));
        Ok(())
    }

    #[test]
    fn patch_in_place() -> anyhow::Result<()> {
        let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
        out.write_u32(0)?;
        out.write_cstring("body")?;
        let end = out.tell()?;
        out.seek(0)?;
        out.write_u32(0x1234)?;
        out.seek(end)?;

        let mut rdr = BinReader::big_endian(Cursor::new(out.into_inner().into_inner()));
        assert_eq!(rdr.read_u32()?, 0x1234);
        assert_eq!(rdr.read_cstring()?, "body");
        Ok(())
    }
}
