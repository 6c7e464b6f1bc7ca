use crate::anim::types::Quaternion;

/// Bone hierarchy. The on-disk list is flat; parent and child links are
/// reconstructed on load and expressed as indices into `bones`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
    pub root: Option<usize>,
}

impl Skeleton {
    pub fn bone_by_id(&self, id: u32) -> Option<usize> {
        self.bones.iter().position(|bone| bone.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub id: u32,
    pub name: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub position: [f32; 3],
    /// Parent-relative position, derived from the absolute positions.
    pub local_position: [f32; 3],
    pub rotation: Quaternion,
    pub local_rotation: Quaternion,
}

impl Bone {
    pub fn new(id: u32, position: [f32; 3]) -> Self {
        Bone {
            id,
            name: String::new(),
            parent: None,
            children: Vec::new(),
            position,
            local_position: position,
            rotation: Quaternion::IDENTITY,
            local_rotation: Quaternion::IDENTITY,
        }
    }
}
