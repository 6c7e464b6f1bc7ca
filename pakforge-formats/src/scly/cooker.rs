use std::io::{Seek, Write};

use crate::FormatError;
use crate::common::{BinWriter, Game};
use crate::fourcc;
use crate::scly::types::{Property, PropertyValue, ScriptLayer, ScriptObject};

fn write_value<W: Write + Seek>(
    value: &PropertyValue,
    game: Game,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    match value {
        PropertyValue::Bool(value) => out.write_bool(*value)?,
        PropertyValue::Byte(value) => out.write_i8(*value)?,
        PropertyValue::Short(value) => out.write_i16(*value)?,
        PropertyValue::Int(value) => out.write_i32(*value)?,
        PropertyValue::Float(value) => out.write_f32(*value)?,
        PropertyValue::Choice(value) => out.write_i32(*value)?,
        PropertyValue::Enum(value) => out.write_i32(*value)?,
        PropertyValue::Flags(value) => out.write_u32(*value)?,
        PropertyValue::String(value) => out.write_cstring(value)?,
        PropertyValue::Vector(value) => out.write_vec3(*value)?,
        PropertyValue::Color(value) => out.write_vec4(*value)?,
        PropertyValue::Asset(id) => id.write(out)?,
        PropertyValue::Sound(value) => out.write_i32(*value)?,
        PropertyValue::AnimationSet(params) => {
            params.asset.write(out)?;
            if game <= Game::Echoes {
                out.write_u32(params.character_index)?;
            }
            out.write_u32(params.anim_index)?;
        }
        PropertyValue::Spline(bytes) => {
            if !bytes.is_empty() {
                out.write_bytes(bytes)?;
            } else if game < Game::DkcReturns {
                out.write_u16(0)?;
                out.write_u32(0)?;
                out.write_u8(1)?;
                out.write_f32(0.0)?;
                out.write_f32(1.0)?;
            } else {
                out.write_u32(0)?;
                out.write_f32(0.0)?;
                out.write_f32(1.0)?;
                out.write_u16(0)?;
                out.write_u8(1)?;
            }
        }
        PropertyValue::Guid(guid) => out.write_bytes(guid)?,
        PropertyValue::Struct { atomic, children } => {
            if !atomic {
                if game <= Game::Prime {
                    out.write_u32(children.len() as u32)?;
                } else {
                    out.write_u16(children.len() as u16)?;
                }
            }
            for child in children {
                write_property(child, game, *atomic, out)?;
            }
        }
        PropertyValue::Array(elements) => {
            out.write_u32(elements.len() as u32)?;
            for element in elements {
                write_value(element, game, out)?;
            }
        }
    }
    Ok(())
}

fn write_property<W: Write + Seek>(
    property: &Property,
    game: Game,
    in_atomic_struct: bool,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    // The tagged layout frames every property with its ID and size.
    if game >= Game::EchoesDemo && !in_atomic_struct {
        out.write_u32(property.id)?;
        let size_offset = out.tell()?;
        out.write_u16(0)?;
        let property_start = out.tell()?;

        write_value(&property.value, game, out)?;

        let property_end = out.tell()?;
        out.seek(size_offset)?;
        out.write_u16((property_end - property_start) as u16)?;
        out.seek(property_end)?;
    } else {
        write_value(&property.value, game, out)?;
    }
    Ok(())
}

pub fn cook_instance<W: Write + Seek>(
    instance: &ScriptObject,
    game: Game,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    let is_prime = game <= Game::Prime;

    if is_prime {
        out.write_u8(instance.object_type as u8)?;
    } else {
        out.write_u32(instance.object_type)?;
    }

    let size_offset = out.tell()?;
    if is_prime {
        out.write_u32(0)?;
    } else {
        out.write_u16(0)?;
    }

    let instance_start = out.tell()?;
    out.write_u32(instance.instance_id)?;

    if is_prime {
        out.write_u32(instance.links.len() as u32)?;
    } else {
        out.write_u16(instance.links.len() as u16)?;
    }
    for link in &instance.links {
        out.write_u32(link.state)?;
        out.write_u32(link.message)?;
        out.write_u32(link.receiver)?;
    }

    let root = Property {
        id: 0xFFFFFFFF,
        value: PropertyValue::Struct { atomic: false, children: instance.properties.clone() },
    };
    write_property(&root, game, false, out)?;

    let instance_end = out.tell()?;
    out.seek(size_offset)?;
    let size = instance_end - instance_start;
    if is_prime {
        out.write_u32(size as u32)?;
    } else {
        out.write_u16(size as u16)?;
    }
    out.seek(instance_end)?;

    Ok(())
}

/// Instances that only exist at runtime, spawned through generation links,
/// go to the generated layer instead of the regular one.
pub fn is_generated(layer: &ScriptLayer, instance: &ScriptObject, game: Game) -> bool {
    for object in &layer.objects {
        for link in &object.links {
            if link.receiver != instance.instance_id {
                continue;
            }

            if game <= Game::Echoes {
                if link.state == fourcc!(b"GRNT").to_u32()
                    && link.message == fourcc!(b"ACTV").to_u32()
                {
                    return true;
                }
            } else if link.message == fourcc!(b"ATCH").to_u32()
                && [fourcc!(b"GRNT"), fourcc!(b"GRN0"), fourcc!(b"GRN1")]
                    .iter()
                    .any(|state| link.state == state.to_u32())
            {
                return true;
            }
        }
    }
    false
}

/// Cooks a layer, leaving out generated instances when requested. Returns
/// the instances held back for the generated layer.
pub fn cook_layer<'layer, W: Write + Seek>(
    layer: &'layer ScriptLayer,
    game: Game,
    split_generated: bool,
    out: &mut BinWriter<W>,
) -> Result<Vec<&'layer ScriptObject>, FormatError> {
    let split_generated = split_generated && game >= Game::EchoesDemo;

    out.write_u8(if game <= Game::Prime { 0 } else { 1 })?;

    let count_offset = out.tell()?;
    out.write_u32(0)?;

    let mut generated = Vec::new();
    let mut num_written = 0u32;

    for instance in &layer.objects {
        let mut should_write = true;

        if split_generated {
            // GenericCreature instances in the newest title go to both.
            if game == Game::DkcReturns && instance.object_type == fourcc!(b"GCTR").to_u32() {
                generated.push(instance);
            } else if is_generated(layer, instance, game) {
                generated.push(instance);
                should_write = false;
            }
        }

        if should_write {
            cook_instance(instance, game, out)?;
            num_written += 1;
        }
    }

    let layer_end = out.tell()?;
    out.seek(count_offset)?;
    out.write_u32(num_written)?;
    out.seek(layer_end)?;

    Ok(generated)
}

pub fn cook_generated_layer<W: Write + Seek>(
    instances: &[&ScriptObject],
    game: Game,
    out: &mut BinWriter<W>,
) -> Result<(), FormatError> {
    out.write_u8(1)?;
    out.write_u32(instances.len() as u32)?;
    for instance in instances {
        cook_instance(instance, game, out)?;
    }
    Ok(())
}
