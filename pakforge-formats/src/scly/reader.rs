use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::{AssetId, BinReader, Game};
use crate::scly::types::{
    AnimationParameters, GameTemplate, Link, Property, PropertyKind, PropertyTemplate, PropertyValue,
    ScriptLayer, ScriptObject,
};

fn read_animation_parameters<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    game: Game,
) -> Result<AnimationParameters, FormatError> {
    let asset = AssetId::parse_for(rdr, game)?;
    let character_index = if game <= Game::Echoes { rdr.read_u32()? } else { 0 };
    let anim_index = rdr.read_u32()?;
    Ok(AnimationParameters { asset, character_index, anim_index })
}

fn read_property<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    template: &PropertyTemplate,
    size: u16,
    game: Game,
) -> Result<Property, FormatError> {
    let value = match &template.kind {
        PropertyKind::Bool => PropertyValue::Bool(rdr.read_bool()?),
        PropertyKind::Byte => PropertyValue::Byte(rdr.read_i8()?),
        PropertyKind::Short => PropertyValue::Short(rdr.read_i16()?),
        PropertyKind::Int => PropertyValue::Int(rdr.read_i32()?),
        PropertyKind::Float => PropertyValue::Float(rdr.read_f32()?),
        PropertyKind::Choice => PropertyValue::Choice(rdr.read_i32()?),
        PropertyKind::Enum => PropertyValue::Enum(rdr.read_i32()?),
        PropertyKind::Flags => PropertyValue::Flags(rdr.read_u32()?),
        PropertyKind::String => PropertyValue::String(rdr.read_cstring()?),
        PropertyKind::Vector => PropertyValue::Vector(rdr.read_vec3()?),
        PropertyKind::Color => PropertyValue::Color(rdr.read_vec4()?),
        PropertyKind::Asset => PropertyValue::Asset(AssetId::parse_for(rdr, game)?),
        PropertyKind::Sound => PropertyValue::Sound(rdr.read_i32()?),
        PropertyKind::AnimationSet => {
            PropertyValue::AnimationSet(read_animation_parameters(rdr, game)?)
        }
        PropertyKind::Spline => PropertyValue::Spline(rdr.read_bytes(usize::from(size))?),
        PropertyKind::Guid => {
            if size != 16 {
                return Err(FormatError::Malformed { reason: "guid property of wrong size" });
            }
            let bytes = rdr.read_bytes(16)?;
            let mut guid = [0; 16];
            guid.copy_from_slice(&bytes);
            PropertyValue::Guid(guid)
        }
        PropertyKind::Struct { atomic, children } => {
            let loaded = if game < Game::EchoesDemo {
                read_struct_positional(rdr, *atomic, children, game)?
            } else {
                read_struct_tagged(rdr, *atomic, children, game)?
            };
            PropertyValue::Struct { atomic: *atomic, children: loaded }
        }
        PropertyKind::Array(archetype) => {
            let count = rdr.read_i32()?;
            let mut elements = Vec::with_capacity(count.max(0) as usize);
            for _ in 0..count {
                elements.push(read_property(rdr, archetype, 0, game)?.value);
            }
            PropertyValue::Array(elements)
        }
    };

    Ok(Property { id: template.id, value })
}

/// Older layout: properties appear in template order with no headers. The
/// on-disk property count is informational only.
fn read_struct_positional<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    atomic: bool,
    children: &[PropertyTemplate],
    game: Game,
) -> Result<Vec<Property>, FormatError> {
    if !atomic {
        rdr.read_u32()?;
    }

    let mut loaded = Vec::with_capacity(children.len());
    for child in children {
        loaded.push(read_property(rdr, child, 0, game)?);
    }
    Ok(loaded)
}

/// Newer layout: each property is framed by ID and size, so unknown
/// properties are skippable and order does not matter.
fn read_struct_tagged<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    atomic: bool,
    children: &[PropertyTemplate],
    game: Game,
) -> Result<Vec<Property>, FormatError> {
    let mut loaded = Vec::new();

    if atomic {
        for child in children {
            loaded.push(read_property(rdr, child, 0, game)?);
        }
        return Ok(loaded);
    }

    let child_count = rdr.read_u16()?;
    for _ in 0..child_count {
        let property_id = rdr.read_u32()?;
        let property_size = rdr.read_u16()?;
        let next_property = rdr.tell()? + u64::from(property_size);

        match children.iter().find(|child| child.id == property_id) {
            Some(child) => loaded.push(read_property(rdr, child, property_size, game)?),
            None => error!("No template for property 0x{property_id:08X}, skipping"),
        }

        rdr.seek(next_property)?;
    }
    Ok(loaded)
}

fn load_object_prime<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    template: &GameTemplate,
) -> Result<Option<ScriptObject>, FormatError> {
    let object_type = u32::from(rdr.read_u8()?);
    let size = rdr.read_u32()?;
    let end = rdr.tell()? + u64::from(size);

    let Some(object_template) = template.object_by_type(object_type) else {
        error!("Unknown object type encountered: 0x{object_type:02X}");
        rdr.seek(end)?;
        return Ok(None);
    };

    let instance_id = rdr.read_u32()?;
    let num_links = rdr.read_u32()?;
    let mut links = Vec::with_capacity(num_links as usize);
    for _ in 0..num_links {
        links.push(Link {
            state: rdr.read_u32()?,
            message: rdr.read_u32()?,
            receiver: rdr.read_u32()?,
        });
    }

    let properties =
        read_struct_positional(rdr, false, &object_template.properties, template.game)?;
    rdr.seek(end)?;

    Ok(Some(ScriptObject { object_type, instance_id, links, properties }))
}

fn load_object_echoes<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    template: &GameTemplate,
) -> Result<Option<ScriptObject>, FormatError> {
    let object_type = rdr.read_u32()?;
    let size = rdr.read_u16()?;
    let end = rdr.tell()? + u64::from(size);

    let Some(object_template) = template.object_by_type(object_type) else {
        error!("Unknown object type encountered: 0x{object_type:08X}");
        rdr.seek(end)?;
        return Ok(None);
    };

    let instance_id = rdr.read_u32()?;
    let num_links = rdr.read_u16()?;
    let mut links = Vec::with_capacity(usize::from(num_links));
    for _ in 0..num_links {
        links.push(Link {
            state: rdr.read_u32()?,
            message: rdr.read_u32()?,
            receiver: rdr.read_u32()?,
        });
    }

    // Base struct ID and size.
    rdr.skip(0x6)?;
    let properties = read_struct_tagged(rdr, false, &object_template.properties, template.game)?;
    rdr.seek(end)?;

    Ok(Some(ScriptObject { object_type, instance_id, links, properties }))
}

pub fn load_layer<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    template: &GameTemplate,
) -> Result<ScriptLayer, FormatError> {
    let layer_start = rdr.tell()?;
    rdr.skip(0x1)?; // Version byte
    let num_objects = rdr.read_u32()?;

    let mut layer = ScriptLayer::default();
    layer.objects.reserve(num_objects as usize);

    for _ in 0..num_objects {
        let object = if template.game <= Game::Prime {
            load_object_prime(rdr, template)?
        } else {
            load_object_echoes(rdr, template)?
        };
        if let Some(object) = object {
            layer.objects.push(object);
        }
    }

    // Older layers are padded to a multiple of 32 bytes.
    if template.game <= Game::Prime {
        let remaining = 32 - ((rdr.tell()? - layer_start) & 0x1F);
        rdr.skip(remaining as i64)?;
    }

    Ok(layer)
}

pub fn try_load_layer<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    template: &GameTemplate,
) -> Option<ScriptLayer> {
    match load_layer(rdr, template) {
        Ok(layer) => Some(layer),
        Err(err) => {
            error!("Failed to load script layer: {err}");
            None
        }
    }
}
