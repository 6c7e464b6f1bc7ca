use std::collections::HashMap;

use crate::common::{AssetId, Game};

/// Character animation reference. The older titles store a character index
/// alongside the animation set ID, the newer ones only the animation index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationParameters {
    pub asset: AssetId,
    pub character_index: u32,
    pub anim_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    Choice(i32),
    Enum(i32),
    Flags(u32),
    String(String),
    Vector([f32; 3]),
    Color([f32; 4]),
    Asset(AssetId),
    Sound(i32),
    AnimationSet(AnimationParameters),
    /// Opaque spline data, kept as raw bytes.
    Spline(Vec<u8>),
    Guid([u8; 16]),
    Struct {
        atomic: bool,
        children: Vec<Property>,
    },
    /// Array elements share one atomic archetype and carry no headers.
    Array(Vec<PropertyValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: u32,
    pub value: PropertyValue,
}

impl PropertyValue {
    fn collect_assets(&self, out: &mut Vec<AssetId>) {
        match self {
            PropertyValue::Asset(id) => out.push(*id),
            PropertyValue::AnimationSet(params) => out.push(params.asset),
            PropertyValue::Struct { children, .. } => {
                for child in children {
                    child.value.collect_assets(out);
                }
            }
            PropertyValue::Array(elements) => {
                for element in elements {
                    element.collect_assets(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub state: u32,
    pub message: u32,
    pub receiver: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptObject {
    pub object_type: u32,
    pub instance_id: u32,
    pub links: Vec<Link>,
    pub properties: Vec<Property>,
}

impl ScriptObject {
    pub fn dependencies(&self) -> Vec<AssetId> {
        let mut assets = Vec::new();
        for property in &self.properties {
            property.value.collect_assets(&mut assets);
        }
        assets
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptLayer {
    pub objects: Vec<ScriptObject>,
}

impl ScriptLayer {
    pub fn dependencies(&self) -> Vec<AssetId> {
        self.objects
            .iter()
            .flat_map(|object| object.dependencies())
            .collect()
    }
}

/// Property layout of one property, as the game templates describe it.
/// Needed for loading: the older layouts are positional and even the tagged
/// ones do not encode value types.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKind {
    Bool,
    Byte,
    Short,
    Int,
    Float,
    Choice,
    Enum,
    Flags,
    String,
    Vector,
    Color,
    Asset,
    Sound,
    AnimationSet,
    Spline,
    Guid,
    Struct {
        atomic: bool,
        children: Vec<PropertyTemplate>,
    },
    Array(Box<PropertyTemplate>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyTemplate {
    pub id: u32,
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectTemplate {
    pub object_type: u32,
    /// Root property list. Treated as a non-atomic struct.
    pub properties: Vec<PropertyTemplate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameTemplate {
    pub game: Game,
    pub objects: HashMap<u32, ObjectTemplate>,
}

impl GameTemplate {
    pub fn new(game: Game) -> Self {
        GameTemplate { game, objects: HashMap::new() }
    }

    pub fn add_object(&mut self, template: ObjectTemplate) {
        self.objects.insert(template.object_type, template);
    }

    pub fn object_by_type(&self, object_type: u32) -> Option<&ObjectTemplate> {
        self.objects.get(&object_type)
    }
}
