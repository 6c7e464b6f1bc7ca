use std::io::{Read, Seek};

use log::error;

use crate::FormatError;
use crate::common::BinReader;
use crate::fourcc;

pub const MAX_WEIGHTS_PER_VERTEX: usize = 4;

/// Bone influences shared by a run of consecutive vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexWeights {
    pub indices: [u8; MAX_WEIGHTS_PER_VERTEX],
    pub weights: [f32; MAX_WEIGHTS_PER_VERTEX],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexGroup {
    pub weights: VertexWeights,
    pub num_vertices: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skin {
    pub vertex_groups: Vec<VertexGroup>,
}

impl Skin {
    /// Groups cover contiguous vertex ranges in order.
    pub fn weights_for_vertex(&self, vertex: u32) -> Option<&VertexWeights> {
        let mut base = 0;
        for group in &self.vertex_groups {
            if vertex < base + group.num_vertices {
                return Some(&group.weights);
            }
            base += group.num_vertices;
        }
        None
    }
}

pub fn load_cskr<R: Read + Seek>(rdr: &mut BinReader<R>) -> Result<Skin, FormatError> {
    let mut skin = Skin::default();

    // The MP3/DKCR layout is unsupported.
    if rdr.peek_u32()? == fourcc!(b"SKIN").to_u32() {
        return Ok(skin);
    }

    let num_groups = rdr.read_u32()?;
    skin.vertex_groups.reserve(num_groups as usize);

    for _ in 0..num_groups {
        let mut group = VertexGroup::default();
        let num_weights = rdr.read_u32()? as usize;
        if num_weights > MAX_WEIGHTS_PER_VERTEX {
            return Err(FormatError::Malformed { reason: "more than 4 weights in vertex group" });
        }

        for weight in 0..num_weights {
            group.weights.indices[weight] = rdr.read_u32()? as u8;
            group.weights.weights[weight] = rdr.read_f32()?;
        }

        group.num_vertices = rdr.read_u32()?;
        skin.vertex_groups.push(group);
    }

    Ok(skin)
}

pub fn try_load_cskr<R: Read + Seek>(rdr: &mut BinReader<R>) -> Option<Skin> {
    match load_cskr(rdr) {
        Ok(skin) => Some(skin),
        Err(err) => {
            error!("Failed to load CSKR: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::common::BinWriter;

    #[test]
    fn groups_and_weights_round_trip() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        {
            let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
            out.write_u32(2)?;

            out.write_u32(1)?;
            out.write_u32(5)?;
            out.write_f32(1.0)?;
            out.write_u32(10)?;

            out.write_u32(2)?;
            out.write_u32(5)?;
            out.write_f32(0.75)?;
            out.write_u32(6)?;
            out.write_f32(0.25)?;
            out.write_u32(3)?;
        }

        let skin = load_cskr(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert_eq!(skin.vertex_groups.len(), 2);
        assert_eq!(skin.vertex_groups[0].num_vertices, 10);
        assert_eq!(skin.vertex_groups[0].weights.indices[0], 5);
        assert_eq!(skin.vertex_groups[1].weights.weights, [0.75, 0.25, 0.0, 0.0]);

        // Vertex 10 falls into the second group's range of 3.
        assert_eq!(skin.weights_for_vertex(9), Some(&skin.vertex_groups[0].weights));
        assert_eq!(skin.weights_for_vertex(10), Some(&skin.vertex_groups[1].weights));
        assert_eq!(skin.weights_for_vertex(13), None);
        Ok(())
    }

    #[test]
    fn newer_layout_loads_as_empty() -> anyhow::Result<()> {
        let bytes = b"SKIN\x00\x00\x00\x00".to_vec();
        let skin = load_cskr(&mut BinReader::big_endian(Cursor::new(bytes)))?;
        assert!(skin.vertex_groups.is_empty());
        Ok(())
    }

    #[test]
    fn oversized_weight_count_is_rejected() -> anyhow::Result<()> {
        let mut bytes = Vec::new();
        {
            let mut out = BinWriter::big_endian(Cursor::new(&mut bytes));
            out.write_u32(1)?;
            out.write_u32(5)?;
        }

        let result = load_cskr(&mut BinReader::big_endian(Cursor::new(bytes)));
        assert!(result.is_err());
        Ok(())
    }
}
