use crate::anim::types::Animation;
use crate::audio::{AudioGroup, AudioLookupTable, StringList};
use crate::cinf::types::Skeleton;
use crate::collision::types::CollisionMeshGroup;
use crate::common::AssetId;
use crate::cskr::Skin;
use crate::dgrp::DependencyGroup;
use crate::font::Font;
use crate::mat::types::MaterialSet;
use crate::scly::types::ScriptLayer;
use crate::strg::types::StringTable;
use crate::unsupported::AudioMacro;
use crate::world::types::World;

/// A loaded resource payload. Formats parsed only for their references end
/// up as a plain dependency group; formats nothing needs to understand stay
/// as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    World(World),
    StringTable(StringTable),
    Animation(Animation),
    Skeleton(Skeleton),
    Skin(Skin),
    Collision(CollisionMeshGroup),
    MaterialSet(MaterialSet),
    AudioGroup(AudioGroup),
    AudioLookupTable(AudioLookupTable),
    AudioMacro(AudioMacro),
    StringList(StringList),
    Font(Font),
    ScriptLayer(ScriptLayer),
    DependencyGroup(DependencyGroup),
    Opaque(Vec<u8>),
}

impl Resource {
    /// Direct references this resource holds. Dependency walkers recurse
    /// through these to build the full closure.
    pub fn dependencies(&self) -> Vec<AssetId> {
        match self {
            Resource::World(world) => world.header_dependencies(),
            Resource::Animation(animation) => animation.dependencies(),
            Resource::MaterialSet(set) => set.texture_list(),
            Resource::AudioMacro(audio_macro) => audio_macro.samples.clone(),
            Resource::Font(font) => vec![font.texture],
            Resource::ScriptLayer(layer) => layer.dependencies(),
            Resource::DependencyGroup(group) => group.dependencies.clone(),
            Resource::StringTable(_)
            | Resource::Skeleton(_)
            | Resource::Skin(_)
            | Resource::Collision(_)
            | Resource::AudioGroup(_)
            | Resource::AudioLookupTable(_)
            | Resource::StringList(_)
            | Resource::Opaque(_) => Vec::new(),
        }
    }
}
