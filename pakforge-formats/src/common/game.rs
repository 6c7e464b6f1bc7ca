use crate::common::asset_id::IdWidth;

/// Target title. The ordering is meaningful: format branches are expressed as
/// range checks against the release order, exactly like the cooked data does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Game {
    PrimeDemo,
    Prime,
    EchoesDemo,
    Echoes,
    CorruptionProto,
    Corruption,
    DkcReturns,
}

impl Game {
    /// Canonical asset ID width for assets cooked for this title.
    pub fn id_width(self) -> IdWidth {
        if self <= Game::Echoes {
            IdWidth::K32
        } else {
            IdWidth::K64
        }
    }

    /// Pak payloads are padded to this boundary between entries.
    pub fn pak_alignment(self) -> u32 {
        if self <= Game::CorruptionProto {
            0x20
        } else {
            0x40
        }
    }

    /// Size threshold above which conditionally-compressed resource types
    /// (the particle family) are stored compressed.
    pub fn compression_threshold(self) -> u32 {
        if self <= Game::CorruptionProto {
            0x400
        } else {
            0x80
        }
    }
}
