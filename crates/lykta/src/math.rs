//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] holds a node's parent-relative
//! position, rotation, and scale; [`Color`] is a linear RGB triple.

use serde::{Deserialize, Serialize};

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};

/// A parent-relative transform: position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    /// Create a transform at the given position.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Create a transform from Euler angles in radians, applied in XYZ order.
    pub fn from_euler(x: f32, y: f32, z: f32) -> Self {
        Self {
            rotation: Quat::from_euler(EulerRot::XYZ, x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Create a transform that looks at a target point from the current position.
    ///
    /// The -Z axis ends up pointing at `target`. Falls back to the current
    /// rotation when `target` coincides with the position.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        if let Some(rotation) = look_rotation(self.translation, target, up) {
            self.rotation = rotation;
        }
        self
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Return a copy with the given rotation.
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Current rotation as XYZ Euler angles in radians.
    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Replace the rotation with XYZ Euler angles in radians.
    pub fn set_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Compute the 4x4 local matrix (translation · rotation · scale).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// World-space rotation whose -Z axis points from `eye` toward `target`.
///
/// Returns `None` when the two points coincide. If `up` is parallel to the
/// view direction another up axis is picked so the result stays defined.
pub(crate) fn look_rotation(eye: Vec3, target: Vec3, up: Vec3) -> Option<Quat> {
    let forward = target - eye;
    if forward.length_squared() <= f32::EPSILON {
        return None;
    }
    let forward = forward.normalize();
    let up = if forward.cross(up).length_squared() <= 1e-8 {
        if forward.cross(Vec3::Z).length_squared() <= 1e-8 { Vec3::X } else { Vec3::Z }
    } else {
        up
    };
    let view = Mat4::look_at_rh(eye, target, up);
    let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
    Some(rotation.normalize())
}

/// A linear RGB color.
///
/// Serialized as a `[r, g, b]` array so config files stay terse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Pack into `0xRRGGBB`, rounding each channel.
    pub fn to_hex(self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Component-wise scale, used to premultiply light intensity.
    pub fn scaled(self, factor: f32) -> Self {
        Self::rgb(self.r * factor, self.g * factor, self.b * factor)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Color {
    fn from(c: [f32; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform {
            translation: Vec3::new(1.0, 0.0, 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = t.matrix().transform_point3(Vec3::X);
        // Scale (2,0,0), rotate about Y (0,0,-2), translate (1,0,-2).
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn looking_at_points_negative_z_at_target() {
        let t = Transform::from_xyz(0.0, 5.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
        let forward = t.rotation * Vec3::NEG_Z;
        let expected = (Vec3::ZERO - Vec3::new(0.0, 5.0, 10.0)).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn looking_straight_down_stays_defined() {
        let t = Transform::from_xyz(0.0, 4.0, 0.0).looking_at(Vec3::ZERO, Vec3::Y);
        let forward = t.rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn euler_round_trip() {
        let mut t = Transform::IDENTITY;
        t.set_euler(0.3, -0.2, 0.1);
        assert!(t.euler().abs_diff_eq(Vec3::new(0.3, -0.2, 0.1), 1e-5));
    }

    #[test]
    fn color_hex_conversion() {
        let c = Color::from_hex(0xff8000);
        assert_eq!(c.r, 1.0);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.to_hex(), 0xff8000);
    }
}
