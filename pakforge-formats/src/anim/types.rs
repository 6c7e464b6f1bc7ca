use crate::common::AssetId;

/// Channel index meaning "this bone is not animated".
pub const NO_CHANNEL: u8 = 0xFF;

/// The cooked format always describes exactly 100 bones.
pub const BONE_COUNT: usize = 100;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn dot(&self, other: &Quaternion) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Spherical interpolation along the shorter arc. Falls back to
    /// normalized linear interpolation when the inputs are nearly parallel.
    pub fn slerp(&self, other: &Quaternion, t: f32) -> Quaternion {
        let mut cos_half_theta = self.dot(other);
        let mut end = *other;

        if cos_half_theta < 0.0 {
            cos_half_theta = -cos_half_theta;
            end = Quaternion {
                x: -end.x,
                y: -end.y,
                z: -end.z,
                w: -end.w,
            };
        }

        if cos_half_theta > 0.9995 {
            let lerped = Quaternion {
                x: self.x + (end.x - self.x) * t,
                y: self.y + (end.y - self.y) * t,
                z: self.z + (end.z - self.z) * t,
                w: self.w + (end.w - self.w) * t,
            };
            return lerped.normalized();
        }

        let half_theta = cos_half_theta.clamp(-1.0, 1.0).acos();
        let sin_half_theta = half_theta.sin();
        let ratio_a = ((1.0 - t) * half_theta).sin() / sin_half_theta;
        let ratio_b = (t * half_theta).sin() / sin_half_theta;

        Quaternion {
            x: self.x * ratio_a + end.x * ratio_b,
            y: self.y * ratio_a + end.y * ratio_b,
            z: self.z * ratio_a + end.z * ratio_b,
            w: self.w * ratio_a + end.w * ratio_b,
        }
    }

    fn normalized(&self) -> Quaternion {
        let norm = self.dot(self).sqrt();
        Quaternion {
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
            w: self.w / norm,
        }
    }
}

pub fn lerp_vec3(left: [f32; 3], right: [f32; 3], t: f32) -> [f32; 3] {
    [
        left[0] + (right[0] - left[0]) * t,
        left[1] + (right[1] - left[1]) * t,
        left[2] + (right[2] - left[2]) * t,
    ]
}

/// Per-bone channel assignment. Indexes into the channel vectors of
/// [`Animation`], or [`NO_CHANNEL`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoneChannelInfo {
    pub scale: u8,
    pub rotation: u8,
    pub translation: u8,
}

impl Default for BoneChannelInfo {
    fn default() -> Self {
        BoneChannelInfo {
            scale: NO_CHANNEL,
            rotation: NO_CHANNEL,
            translation: NO_CHANNEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub duration: f32,
    pub tick_interval: f32,
    pub num_keys: u32,
    /// Animation event reference, only populated for the first retail build.
    pub event_data: Option<AssetId>,
    pub bone_info: Vec<BoneChannelInfo>,
    pub scale_channels: Vec<Vec<[f32; 3]>>,
    pub rotation_channels: Vec<Vec<Quaternion>>,
    pub translation_channels: Vec<Vec<[f32; 3]>>,
}

impl Default for Animation {
    fn default() -> Self {
        Animation {
            duration: 0.0,
            tick_interval: 0.0,
            num_keys: 0,
            event_data: None,
            bone_info: vec![BoneChannelInfo::default(); BONE_COUNT],
            scale_channels: Vec::new(),
            rotation_channels: Vec::new(),
            translation_channels: Vec::new(),
        }
    }
}

impl Animation {
    pub fn dependencies(&self) -> Vec<AssetId> {
        self.event_data.into_iter().filter(AssetId::is_valid).collect()
    }
}
