use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::anim::types::Quaternion;
use crate::cinf::types::{Bone, Skeleton};
use crate::common::{BinReader, Game};

/// DKCR moved to a different skeleton format, recognizable by this marker.
const RETURNS_CINF_MAGIC: u32 = 0x9E220006;

/// There is no version field. The word following a bone's position is the
/// linked-bone count in the older layout and the rotation in the newer one.
/// Skeletons never exceed 100 bones and every bone links at least to its
/// parent, so a value of zero or above 100 means we are looking at rotation
/// data.
pub fn detect_version<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<Game, FormatError> {
    let check = rdr.peek_u32()?;
    Ok(if check > 100 || check == 0 {
        Game::Echoes
    } else {
        Game::Prime
    })
}

pub fn load_cinf<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Result<Skeleton, FormatError> {
    let mut skeleton = Skeleton::default();

    if rdr.peek_u32()? == RETURNS_CINF_MAGIC {
        return Ok(skeleton);
    }

    let num_bones = rdr.read_u32()?;
    let mut game = entry_game;

    // (parent ID, child IDs) per bone, resolved to indices afterwards.
    let mut bone_links: Vec<(u32, Vec<u32>)> = Vec::with_capacity(num_bones as usize);

    for _ in 0..num_bones {
        let id = rdr.read_u32()?;
        let parent_id = rdr.read_u32()?;
        let mut bone = Bone::new(id, rdr.read_vec3()?);

        let game = match game {
            Some(known) => known,
            None => {
                let detected = detect_version(rdr)?;
                game = Some(detected);
                detected
            }
        };

        if game >= Game::Echoes {
            let [x, y, z, w] = rdr.read_vec4()?;
            bone.rotation = Quaternion { x, y, z, w };
            let [x, y, z, w] = rdr.read_vec4()?;
            bone.local_rotation = Quaternion { x, y, z, w };
        }

        let num_linked = rdr.read_u32()?;
        if num_linked == 0 {
            return Err(FormatError::Malformed { reason: "bone with no linked bones" });
        }

        let mut child_ids = Vec::new();
        for _ in 0..num_linked {
            let linked_id = rdr.read_u32()?;
            if linked_id != parent_id {
                child_ids.push(linked_id);
            }
        }

        bone_links.push((parent_id, child_ids));
        skeleton.bones.push(bone);
    }

    // Resolve the flat ID links into tree indices.
    for bone_idx in 0..skeleton.bones.len() {
        let (parent_id, child_ids) = bone_links[bone_idx].clone();

        skeleton.bones[bone_idx].parent = skeleton.bone_by_id(parent_id);

        for child_id in child_ids {
            match skeleton.bone_by_id(child_id) {
                Some(child_idx) => skeleton.bones[bone_idx].children.push(child_idx),
                None => error!(
                    "Bone {} has invalid child ID: {}",
                    skeleton.bones[bone_idx].id, child_id
                ),
            }
        }

        if skeleton.bones[bone_idx].parent.is_none() {
            if skeleton.root.is_none() {
                skeleton.root = Some(bone_idx);
            } else {
                error!("Multiple root bones?");
            }
        }
    }

    if let Some(root) = skeleton.root {
        set_local_coords(&mut skeleton, root);
    }

    // Bone ID array, redundant with the bone list.
    let num_bone_ids = rdr.read_u32()?;
    rdr.skip(i64::from(num_bone_ids) * 4)?;

    let num_names = rdr.read_u32()?;
    for _ in 0..num_names {
        let name = rdr.read_cstring()?;
        let bone_id = rdr.read_u32()?;
        if let Some(bone_idx) = skeleton.bone_by_id(bone_id) {
            skeleton.bones[bone_idx].name = name;
        }
    }

    Ok(skeleton)
}

/// Depth-first pass computing parent-relative positions from the absolute
/// ones stored on disk.
fn set_local_coords(skeleton: &mut Skeleton, bone_idx: usize) {
    for child_idx in skeleton.bones[bone_idx].children.clone() {
        set_local_coords(skeleton, child_idx);
    }

    let bone_position = skeleton.bones[bone_idx].position;
    skeleton.bones[bone_idx].local_position = match skeleton.bones[bone_idx].parent {
        Some(parent_idx) => {
            let parent_position = skeleton.bones[parent_idx].position;
            [
                bone_position[0] - parent_position[0],
                bone_position[1] - parent_position[1],
                bone_position[2] - parent_position[2],
            ]
        }
        None => bone_position,
    };
}

pub fn try_load_cinf<R: Read + Seek>(
    rdr: &mut BinReader<R>,
    entry_game: Option<Game>,
) -> Option<Skeleton> {
    match load_cinf(rdr, entry_game) {
        Ok(skeleton) => Some(skeleton),
        Err(err) => {
            error!("Failed to load CINF: {err}");
            None
        }
    }
}
