use crate::util::vec3::Vec3;

/// Unit quaternion used to rotate avoidance sensors into an agent's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (angle * 0.5).sin_cos();
        let axis = axis.normalize();
        Self {
            x: axis.x * sin,
            y: axis.y * sin,
            z: axis.z * sin,
            w: cos,
        }
    }

    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`
    ///
    /// Parallel inputs yield the identity; antiparallel inputs yield a half
    /// turn about an arbitrary perpendicular axis.
    pub fn rotation_arc(from: Vec3, to: Vec3) -> Self {
        const PARALLEL_EPSILON: f32 = 1e-6;

        let dot = from.dot(to);
        if dot >= 1.0 - PARALLEL_EPSILON {
            return Self::IDENTITY;
        }
        if dot <= -1.0 + PARALLEL_EPSILON {
            // Any axis perpendicular to `from` works for a half turn
            let mut axis = from.cross(Vec3::X);
            if axis.length_sq() < PARALLEL_EPSILON {
                axis = from.cross(Vec3::Y);
            }
            return Self::from_axis_angle(axis, std::f32::consts::PI);
        }

        let axis = from.cross(to);
        Self {
            x: axis.x,
            y: axis.y,
            z: axis.z,
            w: 1.0 + dot,
        }
        .normalize()
    }

    fn normalize(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
                w: self.w / len,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}
