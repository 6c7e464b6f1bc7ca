use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::FormatError;
use crate::common::FourCC;

/// Byte order of a stream, fixed at construction. Cooked game data is big
/// endian throughout; little endian exists for the editor-side archives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Seekable binary reader over cooked asset data.
///
/// All multi-byte reads honor the stream's endianness. Failures surface as
/// [`FormatError::IOError`], typically with `ErrorKind::UnexpectedEof` when a
/// field runs past the end of the stream.
pub struct BinReader<R: Read + Seek> {
    inner: R,
    endian: Endian,
}

macro_rules! read_prim {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty, FormatError> {
            Ok(match self.endian {
                Endian::Big => self.inner.$name::<BigEndian>()?,
                Endian::Little => self.inner.$name::<LittleEndian>()?,
            })
        }
    };
}

impl<R: Read + Seek> BinReader<R> {
    pub fn new(inner: R, endian: Endian) -> Self {
        BinReader { inner, endian }
    }

    pub fn big_endian(inner: R) -> Self {
        BinReader::new(inner, Endian::Big)
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.inner.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8, FormatError> {
        Ok(self.inner.read_i8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool, FormatError> {
        Ok(self.inner.read_u8()? != 0)
    }

    read_prim!(read_u16, u16);
    read_prim!(read_i16, i16);
    read_prim!(read_u32, u32);
    read_prim!(read_i32, i32);
    read_prim!(read_u64, u64);
    read_prim!(read_i64, i64);
    read_prim!(read_f32, f32);

    pub fn read_fourcc(&mut self) -> Result<FourCC, FormatError> {
        let mut buf = [0u8; 4];
        self.inner.read_exact(&mut buf)?;
        Ok(FourCC(buf))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, FormatError> {
        let mut buf = vec![0u8; count];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_vec3(&mut self) -> Result<[f32; 3], FormatError> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub fn read_vec4(&mut self) -> Result<[f32; 4], FormatError> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    /// NUL-terminated ASCII/UTF-8 string, the common cooked representation.
    pub fn read_cstring(&mut self) -> Result<String, FormatError> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.inner.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Length-prefixed (u32 count) string without terminator.
    pub fn read_sized_string(&mut self) -> Result<String, FormatError> {
        let len = self.read_u32()? as usize;
        Ok(String::from_utf8(self.read_bytes(len)?)?)
    }

    /// NUL-terminated UTF-16 string in the stream's byte order.
    pub fn read_wide_cstring(&mut self) -> Result<String, FormatError> {
        let mut units = Vec::new();
        loop {
            let unit = self.read_u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        Ok(String::from_utf16(&units)?)
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

    pub fn size(&mut self) -> Result<u64, FormatError> {
        let pos = self.inner.stream_position()?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(end)
    }

    pub fn remaining(&mut self) -> Result<u64, FormatError> {
        let pos = self.tell()?;
        Ok(self.size()?.saturating_sub(pos))
    }

    /// Reads a u32 without consuming it. Version probes lean on this.
    pub fn peek_u32(&mut self) -> Result<u32, FormatError> {
        let value = self.read_u32()?;
        self.skip(-4)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn strings_and_primitives() -> anyhow::Result<()> {
        let data: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x2A, // u32 42
            b'h', b'i', 0x00, // cstring
            0x00, 0x68, 0x00, 0x69, 0x00, 0x00, // wide cstring "hi"
        ];
        let mut rdr = BinReader::big_endian(Cursor::new(data));
        assert_eq!(rdr.read_u32()?, 42);
        assert_eq!(rdr.read_cstring()?, "hi");
        assert_eq!(rdr.read_wide_cstring()?, "hi");
        Ok(())
    }

    #[test]
    fn peek_does_not_advance() -> anyhow::Result<()> {
        let mut rdr = BinReader::big_endian(Cursor::new(vec![0xDE, 0xAD, 0xBE, 0xEF]));
        assert_eq!(rdr.peek_u32()?, 0xDEADBEEF);
        assert_eq!(rdr.tell()?, 0);
        assert_eq!(rdr.read_u32()?, 0xDEADBEEF);
        Ok(())
    }

    #[test]
    fn truncated_field_is_an_io_error() {
        let mut rdr = BinReader::big_endian(Cursor::new(vec![0x01, 0x02]));
        match rdr.read_u32() {
            Err(FormatError::IOError(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof)
            }
            other => panic!("Expected an IO error, got {:?}", other.map(|_| ())),
        }
    }
}
