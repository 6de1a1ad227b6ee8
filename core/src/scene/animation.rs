//! Keyframe animation clip containers.
//!
//! A clip owns one packed byte blob; tracks address their key-time and
//! value arrays as offsets into it. Source accessors shared between tracks
//! are packed once, so two tracks may alias the same byte range.

/// Keyframe interpolation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Hold the previous key's value.
    Step,
    /// Linear (or spherical-linear for rotations) interpolation.
    Linear,
    /// Cubic spline with per-key in/out tangents. Values are stored as
    /// (in-tangent, value, out-tangent) triples per key; tangents are
    /// pre-multiplied by the neighboring key time delta.
    CubicSpline,
}

/// Which node property a track animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTarget {
    /// Node translation, 3-component float values.
    Translation,
    /// Node rotation, unit quaternion [x, y, z, w] values.
    Rotation,
    /// Node scale, 3-component float values.
    Scaling,
}

impl AnimationTarget {
    /// Number of float components per value element.
    pub fn component_count(&self) -> usize {
        match self {
            Self::Translation | Self::Scaling => 3,
            Self::Rotation => 4,
        }
    }
}

/// One animated (object, property) pair inside a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTrack {
    /// Target object id.
    pub target_object: u32,
    /// Animated property.
    pub target: AnimationTarget,
    /// Interpolation mode.
    pub interpolation: Interpolation,
    /// Number of keys.
    pub key_count: u32,
    /// Byte offset of the f32 key-time array inside the clip blob.
    pub times_offset: usize,
    /// Byte offset of the value array inside the clip blob.
    pub values_offset: usize,
}

impl AnimationTrack {
    /// Number of value elements: `key_count`, or three per key for
    /// cubic-spline tracks.
    pub fn value_count(&self) -> usize {
        match self.interpolation {
            Interpolation::CubicSpline => self.key_count as usize * 3,
            _ => self.key_count as usize,
        }
    }
}

/// A named animation clip: a packed data blob plus its tracks.
#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    /// Clip name, if any.
    pub name: Option<String>,
    /// Packed key-time and value data, 4-byte aligned per array.
    pub data: Vec<u8>,
    /// Tracks addressing into `data`.
    pub tracks: Vec<AnimationTrack>,
}

impl AnimationClip {
    /// Key times of one track, in seconds.
    pub fn times(&self, track: &AnimationTrack) -> &[f32] {
        let start = track.times_offset;
        let end = start + track.key_count as usize * 4;
        bytemuck::cast_slice(&self.data[start..end])
    }

    /// 3-component values of one track. Panics if the target is a rotation.
    pub fn values_vec3(&self, track: &AnimationTrack) -> &[[f32; 3]] {
        assert_eq!(track.target.component_count(), 3);
        let start = track.values_offset;
        let end = start + track.value_count() * 12;
        bytemuck::cast_slice(&self.data[start..end])
    }

    /// 4-component values of one track. Panics if the target is not a rotation.
    pub fn values_vec4(&self, track: &AnimationTrack) -> &[[f32; 4]] {
        assert_eq!(track.target.component_count(), 4);
        let start = track.values_offset;
        let end = start + track.value_count() * 16;
        bytemuck::cast_slice(&self.data[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_value_counts() {
        let mut track = AnimationTrack {
            target_object: 0,
            target: AnimationTarget::Translation,
            interpolation: Interpolation::Linear,
            key_count: 5,
            times_offset: 0,
            values_offset: 0,
        };
        assert_eq!(track.value_count(), 5);
        track.interpolation = Interpolation::CubicSpline;
        assert_eq!(track.value_count(), 15);
    }

    #[test]
    fn clip_slicing() {
        let times = [0.0f32, 1.0];
        let values = [[1.0f32, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let mut data = Vec::new();
        data.extend_from_slice(bytemuck::cast_slice(&times));
        let values_offset = data.len();
        data.extend_from_slice(bytemuck::cast_slice(&values));

        let track = AnimationTrack {
            target_object: 2,
            target: AnimationTarget::Scaling,
            interpolation: Interpolation::Linear,
            key_count: 2,
            times_offset: 0,
            values_offset,
        };
        let clip = AnimationClip {
            name: Some("walk".into()),
            data,
            tracks: vec![track],
        };
        assert_eq!(clip.times(&track), &times);
        assert_eq!(clip.values_vec3(&track), &values);
    }
}
