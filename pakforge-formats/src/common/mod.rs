pub mod archive;
pub mod asset_id;
pub mod bitstream;
pub mod game;
pub mod reader;
pub mod writer;

pub use asset_id::{AssetId, IdWidth};
pub use game::Game;
pub use reader::{BinReader, Endian};
pub use writer::BinWriter;

/// Four-character code as it appears in the container formats.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const fn from_u32(value: u32) -> Self {
        FourCC(value.to_be_bytes())
    }

    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(value: &[u8; 4]) -> Self {
        FourCC(*value)
    }
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[macro_export]
macro_rules! fourcc {
    ($lit:literal) => {
        $crate::common::FourCC(*$lit)
    };
}
