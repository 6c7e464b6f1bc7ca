use std::fmt;
use std::io::{Read, Seek, Write};

use rand::Rng;

use crate::FormatError;
use crate::common::game::Game;
use crate::common::reader::BinReader;
use crate::common::writer::BinWriter;

/// Declared width of an asset ID. Titles up to Echoes use 32-bit IDs, later
/// ones 64-bit. The width is part of the identity: equal integer values with
/// different widths are different IDs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdWidth {
    K32,
    K64,
}

impl IdWidth {
    pub fn byte_count(self) -> usize {
        match self {
            IdWidth::K32 => 4,
            IdWidth::K64 => 8,
        }
    }
}

/// Fixed-width content identifier for a game asset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId {
    width: IdWidth,
    value: u64,
}

pub const INVALID_ID_32: u64 = 0xFFFF_FFFF;
pub const INVALID_ID_64: u64 = 0xFFFF_FFFF_FFFF_FFFF;

impl AssetId {
    pub fn new_32(value: u32) -> Self {
        AssetId {
            width: IdWidth::K32,
            value: u64::from(value),
        }
    }

    pub fn new_64(value: u64) -> Self {
        AssetId {
            width: IdWidth::K64,
            value,
        }
    }

    pub fn new(width: IdWidth, value: u64) -> Self {
        match width {
            // The upper half is dropped, matching a plain integer truncation
            // on the wire.
            IdWidth::K32 => AssetId::new_32(value as u32),
            IdWidth::K64 => AssetId::new_64(value),
        }
    }

    /// The reserved all-ones sentinel for the given width.
    pub fn invalid(width: IdWidth) -> Self {
        match width {
            IdWidth::K32 => AssetId::new_32(INVALID_ID_32 as u32),
            IdWidth::K64 => AssetId::new_64(INVALID_ID_64),
        }
    }

    pub fn invalid_for(game: Game) -> Self {
        AssetId::invalid(game.id_width())
    }

    /// A fresh ID for a newly created asset. Guaranteed to not be the invalid
    /// sentinel; collisions with existing IDs are accepted as improbable.
    pub fn random<R: Rng>(width: IdWidth, rng: &mut R) -> Self {
        loop {
            let id = AssetId::new(width, rng.random::<u64>());
            if id.is_valid() {
                return id;
            }
        }
    }

    pub fn width(&self) -> IdWidth {
        self.width
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_valid(&self) -> bool {
        *self != AssetId::invalid(self.width)
    }

    /// Reads width-in-bytes from the stream. There is no validity check of
    /// the bit pattern; the only failure mode is stream exhaustion.
    pub fn parse<R: Read + Seek>(rdr: &mut BinReader<R>, width: IdWidth) -> Result<Self, FormatError> {
        Ok(match width {
            IdWidth::K32 => AssetId::new_32(rdr.read_u32()?),
            IdWidth::K64 => AssetId::new_64(rdr.read_u64()?),
        })
    }

    pub fn parse_for<R: Read + Seek>(rdr: &mut BinReader<R>, game: Game) -> Result<Self, FormatError> {
        AssetId::parse(rdr, game.id_width())
    }

    pub fn write<W: Write + Seek>(&self, out: &mut BinWriter<W>) -> Result<(), FormatError> {
        match self.width {
            IdWidth::K32 => out.write_u32(self.value as u32),
            IdWidth::K64 => out.write_u64(self.value),
        }
    }

    /// Parses the zero-padded hex form produced by `Display`. The width is
    /// inferred from the digit count.
    pub fn from_hex(text: &str) -> Option<Self> {
        let trimmed = text.trim_start_matches("0x");
        let value = u64::from_str_radix(trimmed, 16).ok()?;

        match trimmed.len() {
            8 => Some(AssetId::new_32(value as u32)),
            16 => Some(AssetId::new_64(value)),
            _ => None,
        }
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            IdWidth::K32 => write!(f, "{:08X}", self.value),
            IdWidth::K64 => write!(f, "{:016X}", self.value),
        }
    }
}
