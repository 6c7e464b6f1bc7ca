use crate::common::{FourCC, Game};
use crate::fourcc;

/// Every cooked asset type the pipeline knows about. The set is closed; a
/// fourcc outside this list is not a resource the tooling can track.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceType {
    AnimEventData,
    AnimSet,
    Animation,
    Area,
    AudioAmplitudeData,
    AudioGroup,
    AudioLookupTable,
    AudioMacro,
    AudioSample,
    BinaryData,
    BurstFireData,
    Character,
    DependencyGroup,
    DynamicCollision,
    Font,
    GuiFrame,
    HintSystem,
    MapArea,
    MapUniverse,
    MapWorld,
    MidiData,
    Model,
    Particle,
    ParticleCollisionResponse,
    ParticleDecal,
    ParticleElectric,
    ParticleSorted,
    ParticleSpawn,
    ParticleSwoosh,
    ParticleWeapon,
    RuleSet,
    SaveWorld,
    Scan,
    Skeleton,
    Skin,
    SourceAnimData,
    StateMachine,
    StateMachine2,
    StringList,
    StringTable,
    Texture,
    World,
}

impl ResourceType {
    /// The cooked file extension, which doubles as the fourcc in the pak
    /// resource tables.
    pub fn fourcc(self) -> FourCC {
        match self {
            ResourceType::AnimEventData => fourcc!(b"EVNT"),
            ResourceType::AnimSet => fourcc!(b"ANCS"),
            ResourceType::Animation => fourcc!(b"ANIM"),
            ResourceType::Area => fourcc!(b"MREA"),
            ResourceType::AudioAmplitudeData => fourcc!(b"CAAD"),
            ResourceType::AudioGroup => fourcc!(b"AGSC"),
            ResourceType::AudioLookupTable => fourcc!(b"ATBL"),
            ResourceType::AudioMacro => fourcc!(b"CAUD"),
            ResourceType::AudioSample => fourcc!(b"CSMP"),
            ResourceType::BinaryData => fourcc!(b"DUMB"),
            ResourceType::BurstFireData => fourcc!(b"BFRC"),
            ResourceType::Character => fourcc!(b"CHAR"),
            ResourceType::DependencyGroup => fourcc!(b"DGRP"),
            ResourceType::DynamicCollision => fourcc!(b"DCLN"),
            ResourceType::Font => fourcc!(b"FONT"),
            ResourceType::GuiFrame => fourcc!(b"FRME"),
            ResourceType::HintSystem => fourcc!(b"HINT"),
            ResourceType::MapArea => fourcc!(b"MAPA"),
            ResourceType::MapUniverse => fourcc!(b"MAPU"),
            ResourceType::MapWorld => fourcc!(b"MAPW"),
            ResourceType::MidiData => fourcc!(b"CSNG"),
            ResourceType::Model => fourcc!(b"CMDL"),
            ResourceType::Particle => fourcc!(b"PART"),
            ResourceType::ParticleCollisionResponse => fourcc!(b"CRSC"),
            ResourceType::ParticleDecal => fourcc!(b"DPSC"),
            ResourceType::ParticleElectric => fourcc!(b"ELSC"),
            ResourceType::ParticleSorted => fourcc!(b"SRSC"),
            ResourceType::ParticleSpawn => fourcc!(b"SPSC"),
            ResourceType::ParticleSwoosh => fourcc!(b"SWHC"),
            ResourceType::ParticleWeapon => fourcc!(b"WPSC"),
            ResourceType::RuleSet => fourcc!(b"RULE"),
            ResourceType::SaveWorld => fourcc!(b"SAVW"),
            ResourceType::Scan => fourcc!(b"SCAN"),
            ResourceType::Skeleton => fourcc!(b"CINF"),
            ResourceType::Skin => fourcc!(b"CSKR"),
            ResourceType::SourceAnimData => fourcc!(b"SAND"),
            ResourceType::StateMachine => fourcc!(b"FSM2"),
            ResourceType::StateMachine2 => fourcc!(b"FSMC"),
            ResourceType::StringList => fourcc!(b"STLC"),
            ResourceType::StringTable => fourcc!(b"STRG"),
            ResourceType::Texture => fourcc!(b"TXTR"),
            ResourceType::World => fourcc!(b"MLVL"),
        }
    }

    pub fn from_fourcc(fourcc: FourCC) -> Option<ResourceType> {
        ALL_TYPES.iter().copied().find(|ty| ty.fourcc() == fourcc)
    }

    /// Resource types that are stored compressed in every pak regardless of
    /// size. Corruption extends the set considerably.
    pub fn always_compressed(self, game: Game) -> bool {
        let base = matches!(
            self,
            ResourceType::Texture
                | ResourceType::Model
                | ResourceType::Skin
                | ResourceType::AnimSet
                | ResourceType::Animation
                | ResourceType::Font
        );

        if base {
            return true;
        }

        game >= Game::Corruption
            && matches!(
                self,
                ResourceType::Character
                    | ResourceType::SourceAnimData
                    | ResourceType::Scan
                    | ResourceType::AudioSample
                    | ResourceType::StringTable
                    | ResourceType::AudioAmplitudeData
                    | ResourceType::DynamicCollision
            )
    }

    /// Resource types that are compressed only above the per-game size
    /// threshold.
    pub fn conditionally_compressed(self) -> bool {
        matches!(
            self,
            ResourceType::Particle
                | ResourceType::ParticleElectric
                | ResourceType::ParticleSwoosh
                | ResourceType::ParticleWeapon
                | ResourceType::ParticleDecal
                | ResourceType::ParticleCollisionResponse
                | ResourceType::ParticleSpawn
                | ResourceType::ParticleSorted
                | ResourceType::BurstFireData
        )
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fourcc())
    }
}

pub const ALL_TYPES: &[ResourceType] = &[
    ResourceType::AnimEventData,
    ResourceType::AnimSet,
    ResourceType::Animation,
    ResourceType::Area,
    ResourceType::AudioAmplitudeData,
    ResourceType::AudioGroup,
    ResourceType::AudioLookupTable,
    ResourceType::AudioMacro,
    ResourceType::AudioSample,
    ResourceType::BinaryData,
    ResourceType::BurstFireData,
    ResourceType::Character,
    ResourceType::DependencyGroup,
    ResourceType::DynamicCollision,
    ResourceType::Font,
    ResourceType::GuiFrame,
    ResourceType::HintSystem,
    ResourceType::MapArea,
    ResourceType::MapUniverse,
    ResourceType::MapWorld,
    ResourceType::MidiData,
    ResourceType::Model,
    ResourceType::Particle,
    ResourceType::ParticleCollisionResponse,
    ResourceType::ParticleDecal,
    ResourceType::ParticleElectric,
    ResourceType::ParticleSorted,
    ResourceType::ParticleSpawn,
    ResourceType::ParticleSwoosh,
    ResourceType::ParticleWeapon,
    ResourceType::RuleSet,
    ResourceType::SaveWorld,
    ResourceType::Scan,
    ResourceType::Skeleton,
    ResourceType::Skin,
    ResourceType::SourceAnimData,
    ResourceType::StateMachine,
    ResourceType::StateMachine2,
    ResourceType::StringList,
    ResourceType::StringTable,
    ResourceType::Texture,
    ResourceType::World,
];
