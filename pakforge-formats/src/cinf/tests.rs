use std::io::Cursor;

use crate::cinf::reader::{detect_version, load_cinf};
use crate::common::{BinReader, BinWriter, Game};

/// Builds an older-layout skeleton: root bone 3 at the origin with children
/// 4 and 5, all positions absolute.
fn build_prime_skeleton() -> anyhow::Result<Vec<u8>> {
    let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));

    out.write_u32(3)?; // Bone count

    // Root: links to a nonexistent parent 2 plus its two children.
    out.write_u32(3)?;
    out.write_u32(2)?;
    out.write_vec3([1.0, 2.0, 3.0])?;
    out.write_u32(3)?;
    out.write_u32(2)?;
    out.write_u32(4)?;
    out.write_u32(5)?;

    out.write_u32(4)?;
    out.write_u32(3)?;
    out.write_vec3([1.0, 2.0, 4.5])?;
    out.write_u32(1)?;
    out.write_u32(3)?;

    out.write_u32(5)?;
    out.write_u32(3)?;
    out.write_vec3([0.0, 2.0, 3.0])?;
    out.write_u32(1)?;
    out.write_u32(3)?;

    // Bone ID array.
    out.write_u32(3)?;
    for id in [3u32, 4, 5] {
        out.write_u32(id)?;
    }

    // Bone name table.
    out.write_u32(2)?;
    out.write_cstring("Skeleton_Root")?;
    out.write_u32(3)?;
    out.write_cstring("L_hip")?;
    out.write_u32(4)?;

    Ok(out.into_inner().into_inner())
}

/// Builds a newer-layout skeleton of two bones carrying rotations.
fn build_echoes_skeleton() -> anyhow::Result<Vec<u8>> {
    let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));

    out.write_u32(2)?;

    out.write_u32(0)?;
    out.write_u32(97)?;
    out.write_vec3([0.0, 0.0, 1.0])?;
    out.write_vec4([0.0, 0.0, 0.0, 1.0])?;
    out.write_vec4([0.0, 0.0, 0.0, 1.0])?;
    out.write_u32(2)?;
    out.write_u32(97)?;
    out.write_u32(1)?;

    out.write_u32(1)?;
    out.write_u32(0)?;
    out.write_vec3([0.0, 1.0, 1.0])?;
    out.write_vec4([0.5, 0.5, 0.5, 0.5])?;
    out.write_vec4([0.5, 0.5, 0.5, 0.5])?;
    out.write_u32(1)?;
    out.write_u32(0)?;

    out.write_u32(2)?;
    out.write_u32(0)?;
    out.write_u32(1)?;

    out.write_u32(1)?;
    out.write_cstring("root")?;
    out.write_u32(0)?;

    Ok(out.into_inner().into_inner())
}

#[test]
fn version_probe_reads_the_linked_bone_count() -> anyhow::Result<()> {
    // A plausible linked-bone count means the older layout.
    let mut rdr = BinReader::big_endian(Cursor::new(3u32.to_be_bytes().to_vec()));
    assert_eq!(detect_version(&mut rdr)?, Game::Prime);
    assert_eq!(rdr.tell()?, 0);

    // Rotation floats reinterpreted as integers fall outside 1..=100.
    let mut rdr = BinReader::big_endian(Cursor::new(1.0f32.to_be_bytes().to_vec()));
    assert_eq!(detect_version(&mut rdr)?, Game::Echoes);

    let mut rdr = BinReader::big_endian(Cursor::new(0.0f32.to_be_bytes().to_vec()));
    assert_eq!(detect_version(&mut rdr)?, Game::Echoes);
    Ok(())
}

#[test]
fn prime_skeleton_links_and_local_positions() -> anyhow::Result<()> {
    let bytes = build_prime_skeleton()?;
    let skeleton = load_cinf(&mut BinReader::big_endian(Cursor::new(bytes)), None)?;

    assert_eq!(skeleton.bones.len(), 3);
    let root = skeleton.root.unwrap();
    assert_eq!(skeleton.bones[root].id, 3);
    assert_eq!(skeleton.bones[root].name, "Skeleton_Root");

    // Bone 2 does not exist, so the root has no parent and keeps the
    // absolute position as its local one. Its children resolve to indices.
    assert_eq!(skeleton.bones[root].parent, None);
    assert_eq!(skeleton.bones[root].local_position, [1.0, 2.0, 3.0]);
    assert_eq!(skeleton.bones[root].children, vec![1, 2]);

    let hip = skeleton.bone_by_id(4).unwrap();
    assert_eq!(skeleton.bones[hip].name, "L_hip");
    assert_eq!(skeleton.bones[hip].parent, Some(root));
    assert_eq!(skeleton.bones[hip].local_position, [0.0, 0.0, 1.5]);

    let other = skeleton.bone_by_id(5).unwrap();
    assert_eq!(skeleton.bones[other].name, "");
    assert_eq!(skeleton.bones[other].local_position, [-1.0, 0.0, 0.0]);
    Ok(())
}

#[test]
fn echoes_skeleton_reads_rotations() -> anyhow::Result<()> {
    let bytes = build_echoes_skeleton()?;
    let skeleton = load_cinf(&mut BinReader::big_endian(Cursor::new(bytes)), None)?;

    assert_eq!(skeleton.bones.len(), 2);
    assert_eq!(skeleton.root, Some(0));
    assert_eq!(skeleton.bones[0].name, "root");
    assert_eq!(skeleton.bones[0].rotation.w, 1.0);

    assert_eq!(skeleton.bones[1].parent, Some(0));
    assert_eq!(skeleton.bones[1].rotation.x, 0.5);
    assert_eq!(skeleton.bones[1].local_position, [0.0, 1.0, 0.0]);
    Ok(())
}

#[test]
fn returns_marker_yields_an_empty_skeleton() -> anyhow::Result<()> {
    let bytes = 0x9E220006u32.to_be_bytes().to_vec();
    let skeleton = load_cinf(
        &mut BinReader::big_endian(Cursor::new(bytes)),
        Some(Game::DkcReturns),
    )?;
    assert!(skeleton.bones.is_empty());
    assert_eq!(skeleton.root, None);
    Ok(())
}

#[test]
fn bone_without_links_is_rejected() -> anyhow::Result<()> {
    let mut out = BinWriter::big_endian(Cursor::new(Vec::new()));
    out.write_u32(1)?;
    out.write_u32(0)?;
    out.write_u32(97)?;
    out.write_vec3([0.0, 0.0, 0.0])?;
    out.write_u32(0)?;

    let bytes = out.into_inner().into_inner();
    let result = load_cinf(&mut BinReader::big_endian(Cursor::new(bytes)), Some(Game::Prime));
    assert!(result.is_err());
    Ok(())
}
