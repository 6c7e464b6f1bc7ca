use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::anim::types::{
    Animation, BONE_COUNT, BoneChannelInfo, NO_CHANNEL, Quaternion, lerp_vec3,
};
use crate::common::bitstream::BitReader;
use crate::common::{AssetId, BinReader, Game};

/// Uncompressed animations carry no version field. Trial-parse the remainder
/// under the newer layout's field sizes; the parse must land exactly on the
/// end of the stream to count.
pub fn detect_uncompressed_version<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<Game, FormatError> {
    let start = rdr.tell()?;
    let echoes = uncompressed_check_echoes(rdr)?;
    rdr.seek(start)?;
    Ok(if echoes { Game::Echoes } else { Game::Prime })
}

fn uncompressed_check_echoes<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<bool, FormatError> {
    // The +4 on every size accounts for the next array's count field.
    let end = rdr.size()?;

    let num_rot_indices = u64::from(rdr.read_u32()?);
    if rdr.tell()? + num_rot_indices + 4 >= end {
        return Ok(false);
    }
    rdr.skip(num_rot_indices as i64)?;

    let num_trans_indices = u64::from(rdr.read_u32()?);
    if rdr.tell()? + num_trans_indices + 4 >= end {
        return Ok(false);
    }
    rdr.skip(num_trans_indices as i64)?;

    let num_scale_indices = u64::from(rdr.read_u32()?);
    if rdr.tell()? + num_scale_indices + 4 >= end {
        return Ok(false);
    }
    rdr.skip(num_scale_indices as i64)?;

    let scale_keys_size = u64::from(rdr.read_u32()?) * 0xC;
    if rdr.tell()? + scale_keys_size + 4 >= end {
        return Ok(false);
    }
    rdr.skip(scale_keys_size as i64)?;

    let rot_keys_size = u64::from(rdr.read_u32()?) * 0x10;
    if rdr.tell()? + rot_keys_size + 4 >= end {
        return Ok(false);
    }
    rdr.skip(rot_keys_size as i64)?;

    let trans_keys_size = u64::from(rdr.read_u32()?) * 0xC;
    Ok(rdr.tell()? + trans_keys_size == end)
}

/// Compressed animations mark the newer layout with a 0x0101 word right
/// after the allocation size.
pub fn detect_compressed_version<R: Read + Seek>(
    rdr: &mut BinReader<R>,
) -> Result<Game, FormatError> {
    let marker = rdr.read_i16()?;
    rdr.skip(-2)?;
    Ok(if marker == 0x0101 { Game::Echoes } else { Game::Prime })
}

/// `entry_game` is the title the resource database attributes the asset to,
/// if known. Corruption onward uses a different animation system and loads
/// as an empty object.
pub fn load_anim<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Result<Animation, FormatError> {
    if entry_game.is_some_and(|game| game > Game::Echoes) {
        return Ok(Animation::default());
    }

    let compression_type = rdr.read_u32()?;
    match compression_type {
        0 => load_uncompressed(rdr, entry_game),
        2 => load_compressed(rdr, entry_game),
        _ => Err(FormatError::UnsupportedVersion { version: compression_type }),
    }
}

fn load_uncompressed<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Result<Animation, FormatError> {
    let mut anim = Animation::default();

    anim.duration = rdr.read_f32()?;
    rdr.skip(4)?; // Differential state
    anim.tick_interval = rdr.read_f32()?;
    rdr.skip(4)?; // Differential state
    anim.num_keys = rdr.read_u32()?;
    rdr.skip(4)?; // Root bone ID

    let num_bone_indices = rdr.read_u32()?;
    if num_bone_indices as usize != BONE_COUNT {
        return Err(FormatError::Malformed { reason: "bone channel list is not 100 entries" });
    }

    let mut bone_indices = [0u8; BONE_COUNT];
    for index in bone_indices.iter_mut() {
        *index = rdr.read_u8()?;
    }

    let game = match entry_game {
        Some(game) => game,
        None => detect_uncompressed_version(rdr)?,
    };

    let mut rotation_indices = Vec::new();
    if game >= Game::EchoesDemo {
        let count = rdr.read_u32()?;
        for _ in 0..count {
            rotation_indices.push(rdr.read_u8()?);
        }
    } else {
        // Every bone channel has a rotation in the older layout.
        for index in bone_indices.iter() {
            if *index != NO_CHANNEL {
                rotation_indices.push(*index);
            }
        }
    }
    let num_rotation_channels = rotation_indices.iter().filter(|idx| **idx != NO_CHANNEL).count();

    let num_trans_indices = rdr.read_u32()?;
    let mut trans_indices = Vec::with_capacity(num_trans_indices as usize);
    for _ in 0..num_trans_indices {
        trans_indices.push(rdr.read_u8()?);
    }
    let num_translation_channels = trans_indices.iter().filter(|idx| **idx != NO_CHANNEL).count();

    let mut scale_indices = Vec::new();
    if game >= Game::EchoesDemo {
        let count = rdr.read_u32()?;
        for _ in 0..count {
            scale_indices.push(rdr.read_u8()?);
        }
    }
    let num_scale_channels = scale_indices.iter().filter(|idx| **idx != NO_CHANNEL).count();

    let mut channel = 0usize;
    for (bone, bone_index) in bone_indices.iter().enumerate() {
        if *bone_index != NO_CHANNEL {
            anim.bone_info[bone] = BoneChannelInfo {
                translation: trans_indices.get(channel).copied().unwrap_or(NO_CHANNEL),
                rotation: rotation_indices.get(channel).copied().unwrap_or(NO_CHANNEL),
                scale: scale_indices.get(channel).copied().unwrap_or(NO_CHANNEL),
            };
            channel += 1;
        }
    }

    if game >= Game::EchoesDemo {
        rdr.skip(4)?; // Total scale key count
        for _ in 0..num_scale_channels {
            let mut keys = Vec::with_capacity(anim.num_keys as usize);
            for _ in 0..anim.num_keys {
                keys.push(rdr.read_vec3()?);
            }
            anim.scale_channels.push(keys);
        }
    }

    rdr.skip(4)?; // Total rotation key count
    for _ in 0..num_rotation_channels {
        let mut keys = Vec::with_capacity(anim.num_keys as usize);
        for _ in 0..anim.num_keys {
            let [x, y, z, w] = rdr.read_vec4()?;
            keys.push(Quaternion { x, y, z, w });
        }
        anim.rotation_channels.push(keys);
    }

    rdr.skip(4)?; // Total translation key count
    for _ in 0..num_translation_channels {
        let mut keys = Vec::with_capacity(anim.num_keys as usize);
        for _ in 0..anim.num_keys {
            keys.push(rdr.read_vec3()?);
        }
        anim.translation_channels.push(keys);
    }

    if game == Game::Prime {
        anim.event_data = Some(AssetId::new_32(rdr.read_u32()?));
    }

    Ok(anim)
}

#[derive(Debug, Default, Copy, Clone)]
struct CompressedChannel {
    bone_id: u32,
    num_rotation_keys: u16,
    rotation: [i16; 3],
    rotation_bits: [u8; 3],
    num_translation_keys: u16,
    translation: [i16; 3],
    translation_bits: [u8; 3],
    num_scale_keys: u16,
    scale: [i16; 3],
    scale_bits: [u8; 3],
}

fn load_compressed<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Result<Animation, FormatError> {
    let mut anim = Animation::default();

    rdr.skip(4)?; // Allocation size
    let game = detect_compressed_version(rdr)?;

    // Go by the entry's game here, not the probe: the second demo build has
    // animations in the old layout that still lack the event reference.
    if entry_game.is_some_and(|entry_game| entry_game <= Game::Prime) {
        anim.event_data = Some(AssetId::new_32(rdr.read_u32()?));
    }

    rdr.skip(if game <= Game::Prime { 4 } else { 2 })?;
    anim.duration = rdr.read_f32()?;
    anim.tick_interval = rdr.read_f32()?;
    rdr.skip(8)?;

    let rotation_divisor = rdr.read_u32()?;
    let translation_multiplier = rdr.read_f32()?;
    let scale_multiplier = if game >= Game::EchoesDemo {
        rdr.read_f32()?
    } else {
        0.0
    };
    let num_bone_channels = rdr.read_u32()?;
    rdr.skip(4)?;

    let num_keys = rdr.read_u32()?;
    anim.num_keys = num_keys;
    let mut key_flags = Vec::with_capacity(num_keys as usize);
    {
        let mut bits = BitReader::new(rdr);
        for _ in 0..num_keys {
            key_flags.push(bits.read_bit()?);
        }
    }
    // The first key lives in the channel descriptors, so its flag bit must
    // be set; with it clear there is no left neighbor to interpolate from.
    if num_keys > 0 && !key_flags[0] {
        return Err(FormatError::Malformed { reason: "first animation key marked absent" });
    }
    rdr.skip(if game == Game::Prime { 8 } else { 4 })?;

    let mut channels = vec![CompressedChannel::default(); num_bone_channels as usize];

    for (chan_idx, chan) in channels.iter_mut().enumerate() {
        chan.bone_id = if game == Game::Prime {
            rdr.read_u32()?
        } else {
            u32::from(rdr.read_u8()?)
        };
        if chan.bone_id as usize >= BONE_COUNT {
            return Err(FormatError::Malformed { reason: "bone ID out of range" });
        }

        chan.num_rotation_keys = rdr.read_u16()?;
        if chan.num_rotation_keys > 0 {
            for comp in 0..3 {
                chan.rotation[comp] = rdr.read_i16()?;
                chan.rotation_bits[comp] = rdr.read_u8()?;
            }
            anim.bone_info[chan.bone_id as usize].rotation = chan_idx as u8;
        }

        chan.num_translation_keys = rdr.read_u16()?;
        if chan.num_translation_keys > 0 {
            for comp in 0..3 {
                chan.translation[comp] = rdr.read_i16()?;
                chan.translation_bits[comp] = rdr.read_u8()?;
            }
            anim.bone_info[chan.bone_id as usize].translation = chan_idx as u8;
        }

        if game >= Game::EchoesDemo {
            chan.num_scale_keys = rdr.read_u16()?;
            if chan.num_scale_keys > 0 {
                for comp in 0..3 {
                    chan.scale[comp] = rdr.read_i16()?;
                    chan.scale_bits[comp] = rdr.read_u8()?;
                }
                anim.bone_info[chan.bone_id as usize].scale = chan_idx as u8;
            }
        }
    }

    read_compressed_keys(
        rdr,
        &mut anim,
        &mut channels,
        &key_flags,
        rotation_divisor,
        translation_multiplier,
        scale_multiplier,
    )?;
    fill_missing_keys(&mut anim, &channels, &key_flags);

    Ok(anim)
}

fn dequantize_rotation(divisor: u32, sign: bool, rot: [i16; 3]) -> Quaternion {
    let multiplier = std::f32::consts::FRAC_PI_2 / divisor as f32;
    let x = (f32::from(rot[0]) * multiplier).sin();
    let y = (f32::from(rot[1]) * multiplier).sin();
    let z = (f32::from(rot[2]) * multiplier).sin();
    let w = (1.0 - (x * x + y * y + z * z)).max(0.0).sqrt();

    Quaternion {
        x,
        y,
        z,
        w: if sign { -w } else { w },
    }
}

fn read_compressed_keys<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    anim: &mut Animation,
    channels: &mut [CompressedChannel],
    key_flags: &[bool],
    rotation_divisor: u32,
    translation_multiplier: f32,
    scale_multiplier: f32,
) -> Result<(), FormatError> {
    anim.rotation_channels = vec![Vec::new(); channels.len()];
    anim.translation_channels = vec![Vec::new(); channels.len()];
    anim.scale_channels = vec![Vec::new(); channels.len()];

    // First key comes from the channel descriptors themselves.
    for (idx, chan) in channels.iter().enumerate() {
        if chan.num_rotation_keys > 0 {
            anim.rotation_channels[idx]
                .push(dequantize_rotation(rotation_divisor, false, chan.rotation));
        }
        if chan.num_translation_keys > 0 {
            anim.translation_channels[idx].push([
                f32::from(chan.translation[0]) * translation_multiplier,
                f32::from(chan.translation[1]) * translation_multiplier,
                f32::from(chan.translation[2]) * translation_multiplier,
            ]);
        }
        if chan.num_scale_keys > 0 {
            anim.scale_channels[idx].push([
                f32::from(chan.scale[0]) * scale_multiplier,
                f32::from(chan.scale[1]) * scale_multiplier,
                f32::from(chan.scale[2]) * scale_multiplier,
            ]);
        }
    }

    let mut bits = BitReader::new(rdr);

    for key_idx in 0..anim.num_keys.saturating_sub(1) {
        let key_present = key_flags[key_idx as usize + 1];

        for (idx, chan) in channels.iter_mut().enumerate() {
            if chan.num_rotation_keys > 0 {
                // When the key is absent this W sign is meaningless, but the
                // key gets rebuilt by interpolation afterwards anyway.
                let w_sign = if key_present { bits.read_bit()? } else { false };

                if key_present {
                    for comp in 0..3 {
                        let delta = bits.read_signed(u32::from(chan.rotation_bits[comp]))?;
                        chan.rotation[comp] = chan.rotation[comp].wrapping_add(delta as i16);
                    }
                }

                anim.rotation_channels[idx]
                    .push(dequantize_rotation(rotation_divisor, w_sign, chan.rotation));
            }

            if chan.num_translation_keys > 0 {
                if key_present {
                    for comp in 0..3 {
                        let delta = bits.read_signed(u32::from(chan.translation_bits[comp]))?;
                        chan.translation[comp] = chan.translation[comp].wrapping_add(delta as i16);
                    }
                }

                anim.translation_channels[idx].push([
                    f32::from(chan.translation[0]) * translation_multiplier,
                    f32::from(chan.translation[1]) * translation_multiplier,
                    f32::from(chan.translation[2]) * translation_multiplier,
                ]);
            }

            if chan.num_scale_keys > 0 {
                if key_present {
                    for comp in 0..3 {
                        let delta = bits.read_signed(u32::from(chan.scale_bits[comp]))?;
                        chan.scale[comp] = chan.scale[comp].wrapping_add(delta as i16);
                    }
                }

                anim.scale_channels[idx].push([
                    f32::from(chan.scale[0]) * scale_multiplier,
                    f32::from(chan.scale[1]) * scale_multiplier,
                    f32::from(chan.scale[2]) * scale_multiplier,
                ]);
            }
        }
    }

    Ok(())
}

/// Keys whose flag bit is clear were not stored; rebuild them between the
/// neighboring present keys, spherical for rotation and linear for
/// translation and scale.
fn fill_missing_keys(anim: &mut Animation, channels: &[CompressedChannel], key_flags: &[bool]) {
    let mut num_missed = 0usize;

    for key_idx in 0..anim.num_keys as usize {
        if !key_flags[key_idx] {
            num_missed += 1;
            continue;
        }

        if num_missed > 0 {
            let first_index = key_idx - num_missed - 1;
            let last_index = key_idx;
            let rel_last = (last_index - first_index) as f32;

            for missed in 0..num_missed {
                let target = first_index + missed + 1;
                let interp = (target - first_index) as f32 / rel_last;

                for (idx, chan) in channels.iter().enumerate() {
                    if chan.num_rotation_keys > 0 {
                        let left = anim.rotation_channels[idx][first_index];
                        let right = anim.rotation_channels[idx][last_index];
                        anim.rotation_channels[idx][target] = left.slerp(&right, interp);
                    }
                    if chan.num_translation_keys > 0 {
                        let left = anim.translation_channels[idx][first_index];
                        let right = anim.translation_channels[idx][last_index];
                        anim.translation_channels[idx][target] = lerp_vec3(left, right, interp);
                    }
                    if chan.num_scale_keys > 0 {
                        let left = anim.scale_channels[idx][first_index];
                        let right = anim.scale_channels[idx][last_index];
                        anim.scale_channels[idx][target] = lerp_vec3(left, right, interp);
                    }
                }
            }

            num_missed = 0;
        }
    }
}

pub fn try_load_anim<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Option<Animation> {
    match load_anim(rdr, entry_game) {
        Ok(anim) => Some(anim),
        Err(err) => {
            error!("Failed to load ANIM: {err}");
            None
        }
    }
}
