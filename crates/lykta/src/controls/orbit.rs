//! Damped orbit around a target point.
//!
//! The controller keeps two spherical positions around `target`: where the
//! camera is (`current`) and where input says it should go (`desired`).
//! Drag and wheel input only ever move `desired`. Each update moves
//! `current` a fixed fraction (`damping`) of the remaining way, so motion
//! eases out instead of snapping. A damping of 1 means no easing: the
//! camera lands on `desired` in the same update.
//!
//! ```text
//!           +Y
//!            │   camera
//!            │  ╱
//!            │ ╱ radius
//!            │╱ pitch
//!  target ───┼──────── +X   (yaw 0)
//!           ╱
//!          ╱ yaw π/2
//!        +Z
//! ```
//!
//! Interpolating yaw, pitch and radius separately keeps the camera on the
//! sphere during a pure rotation; interpolating Cartesian positions would
//! cut the chord and pull it toward the target.

use std::f32::consts::{FRAC_PI_2, TAU};

use super::CameraController;
use crate::error::{Error, Result};
use crate::math::Vec3;
use crate::stage::Stage;

/// Below this difference a component snaps to its goal.
const SNAP_EPSILON: f32 = 1e-6;

/// Spherical coordinates around a target. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Angle in the XZ plane, from +X toward +Z.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self { radius: 0.0, yaw: 0.0, pitch: 0.0 };
        }
        Self {
            radius,
            yaw: offset.z.atan2(offset.x),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        let (sy, cy) = self.yaw.sin_cos();
        Vec3::new(self.radius * cp * cy, self.radius * sp, self.radius * cp * sy)
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    /// At 1, a drag across the full viewport height turns a full circle.
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    damping: f32,
    min_distance: f32,
    max_distance: f32,
    min_pitch: f32,
    max_pitch: f32,
    current: Spherical,
    desired: Spherical,
    initialized: bool,
}

impl OrbitControls {
    /// Orbit `target`, starting from wherever the camera is on first update.
    pub fn new(target: Vec3) -> Self {
        let start = Spherical { radius: 1.0, yaw: 0.0, pitch: 0.0 };
        Self {
            target,
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            damping: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_pitch: -FRAC_PI_2 + 0.01,
            max_pitch: FRAC_PI_2 - 0.01,
            current: start,
            desired: start,
            initialized: false,
        }
    }

    /// Fraction of the remaining motion applied per update, in `(0, 1]`.
    /// `1` disables easing.
    pub fn with_damping(mut self, damping: f32) -> Result<Self> {
        self.set_damping(damping)?;
        Ok(self)
    }

    pub fn set_damping(&mut self, damping: f32) -> Result<()> {
        if !(damping.is_finite() && damping > 0.0 && damping <= 1.0) {
            return Err(Error::InvalidDamping(damping));
        }
        self.damping = damping;
        Ok(())
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn set_distance_limits(&mut self, min: f32, max: f32) -> Result<()> {
        if !(min >= 0.0 && min <= max) || min.is_nan() {
            return Err(Error::InvalidExtent("orbit distance limits need 0 <= min <= max"));
        }
        self.min_distance = min;
        self.max_distance = max;
        if self.initialized {
            self.desired.radius = self.desired.radius.clamp(min, max);
        }
        Ok(())
    }

    pub fn set_pitch_limits(&mut self, min: f32, max: f32) -> Result<()> {
        if !(min >= -FRAC_PI_2 && max <= FRAC_PI_2 && min <= max) {
            return Err(Error::InvalidExtent("orbit pitch limits need -pi/2 <= min <= max <= pi/2"));
        }
        self.min_pitch = min;
        self.max_pitch = max;
        if self.initialized {
            self.desired.pitch = self.desired.pitch.clamp(min, max);
        }
        Ok(())
    }

    /// Where the camera currently is, relative to the target.
    pub fn current(&self) -> Spherical {
        self.current
    }

    /// Where the camera is heading.
    pub fn desired(&self) -> Spherical {
        self.desired
    }

    /// Add to the desired yaw and pitch. Before the first update this is
    /// queued relative to wherever the camera turns out to be.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.desired.yaw += yaw;
        self.desired.pitch += pitch;
        if self.initialized {
            self.desired.pitch = self.desired.pitch.clamp(self.min_pitch, self.max_pitch);
        }
    }

    /// Scale the desired distance. Values below 1 move closer.
    pub fn dolly(&mut self, scale: f32) {
        if !(scale.is_finite() && scale > 0.0) {
            return;
        }
        self.desired.radius *= scale;
        if self.initialized {
            self.desired.radius = self.desired.radius.clamp(self.min_distance, self.max_distance);
        }
    }

    /// Whether `current` has reached `desired`.
    pub fn is_settled(&self) -> bool {
        self.current == self.desired
    }

    fn sync_from(&mut self, stage: &Stage) -> Result<()> {
        let position = stage.scene.world_position(stage.camera)?;
        let mut start = Spherical::from_offset(position - self.target);
        start.radius = start.radius.clamp(self.min_distance, self.max_distance);
        start.pitch = start.pitch.clamp(self.min_pitch, self.max_pitch);
        // Keep whatever rotate/dolly calls arrived before the first update.
        self.desired = Spherical {
            radius: (start.radius * self.desired.radius).clamp(self.min_distance, self.max_distance),
            yaw: start.yaw + self.desired.yaw,
            pitch: (start.pitch + self.desired.pitch).clamp(self.min_pitch, self.max_pitch),
        };
        self.current = start;
        self.initialized = true;
        Ok(())
    }

    fn apply_input(&mut self, stage: &mut Stage) {
        let drag = stage.input.take_drag();
        let wheel = stage.input.take_wheel();
        if !self.enabled {
            return;
        }
        let height = stage.input.viewport().1.max(1) as f32;
        if drag.x != 0.0 || drag.y != 0.0 {
            let per_pixel = TAU / height * self.rotate_speed;
            self.rotate(drag.x * per_pixel, drag.y * per_pixel);
        }
        if wheel != 0.0 {
            self.dolly(0.95f32.powf(self.zoom_speed * wheel));
        }
    }

    fn ease(&mut self) {
        let step = |current: &mut f32, goal: f32, t: f32| {
            let diff = goal - *current;
            if diff.abs() < SNAP_EPSILON {
                *current = goal;
            } else {
                *current += diff * t;
            }
        };
        step(&mut self.current.radius, self.desired.radius, self.damping);
        step(&mut self.current.yaw, self.desired.yaw, self.damping);
        step(&mut self.current.pitch, self.desired.pitch, self.damping);
    }
}

impl CameraController for OrbitControls {
    fn update(&mut self, stage: &mut Stage) -> Result<()> {
        if !self.initialized {
            self.sync_from(stage)?;
        }
        self.apply_input(stage);
        self.ease();
        let position = self.target + self.current.to_offset();
        stage.scene.place_looking_at(stage.camera, position, self.target)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use super::*;
    use crate::scene::NodeId;

    fn stage_with_camera_at(position: Vec3) -> Stage {
        let (mut stage, _) = Stage::headless(800, 600).unwrap();
        let cam: NodeId = stage.camera;
        stage.scene.node_mut(cam).unwrap().transform.translation = position;
        stage
    }

    #[test]
    fn spherical_convention() {
        let s = Spherical { radius: 2.0, yaw: FRAC_PI_2, pitch: 0.0 };
        assert!(s.to_offset().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
        let back = Spherical::from_offset(Vec3::new(0.0, 0.0, 2.0));
        assert!((back.yaw - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn quarter_turn_keeps_radius() {
        let mut stage = stage_with_camera_at(Vec3::new(2.0, 0.0, 0.0));
        let mut orbit = OrbitControls::new(Vec3::ZERO).with_damping(0.25).unwrap();
        orbit.update(&mut stage).unwrap();

        orbit.rotate(FRAC_PI_2, 0.0);
        for _ in 0..100 {
            orbit.update(&mut stage).unwrap();
            let distance = stage.scene.world_position(stage.camera).unwrap().length();
            assert!((distance - 2.0).abs() < 1e-4);
        }
        let position = stage.scene.world_position(stage.camera).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-4), "{position}");
        assert!(orbit.is_settled());
    }

    #[test]
    fn damping_eases_instead_of_snapping() {
        let mut stage = stage_with_camera_at(Vec3::new(2.0, 0.0, 0.0));
        let mut orbit = OrbitControls::new(Vec3::ZERO).with_damping(0.5).unwrap();
        orbit.update(&mut stage).unwrap();
        orbit.rotate(1.0, 0.0);
        orbit.update(&mut stage).unwrap();
        assert!((orbit.current().yaw - 0.5).abs() < 1e-6);
        assert!(!orbit.is_settled());
    }

    #[test]
    fn drag_maps_to_yaw() {
        let mut stage = stage_with_camera_at(Vec3::new(2.0, 0.0, 0.0));
        let mut orbit = OrbitControls::new(Vec3::ZERO).with_damping(1.0).unwrap();
        orbit.update(&mut stage).unwrap();

        // A quarter of the viewport height is a quarter turn.
        stage.input.add_drag(150.0, 0.0);
        orbit.update(&mut stage).unwrap();
        let position = stage.scene.world_position(stage.camera).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-4));
    }

    #[test]
    fn pitch_and_distance_clamped() {
        let mut stage = stage_with_camera_at(Vec3::new(0.0, 0.0, 5.0));
        let mut orbit = OrbitControls::new(Vec3::ZERO).with_damping(1.0).unwrap();
        orbit.set_distance_limits(2.0, 10.0).unwrap();
        orbit.update(&mut stage).unwrap();

        orbit.rotate(0.0, 10.0);
        orbit.dolly(100.0);
        orbit.update(&mut stage).unwrap();
        assert!(orbit.current().pitch < FRAC_PI_2);
        assert_eq!(orbit.current().radius, 10.0);

        stage.input.add_wheel(200.0);
        orbit.update(&mut stage).unwrap();
        assert_eq!(orbit.current().radius, 2.0);
    }

    #[test]
    fn camera_faces_target() {
        let mut stage = stage_with_camera_at(Vec3::new(1.0, 1.0, 3.0));
        let mut orbit = OrbitControls::new(Vec3::ZERO);
        orbit.update(&mut stage).unwrap();
        let world = stage.scene.world_transform(stage.camera).unwrap();
        let (_, rotation, translation) = world.to_scale_rotation_translation();
        let forward = rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(-translation.normalize(), 1e-4));
    }

    #[test]
    fn invalid_damping_rejected() {
        assert!(matches!(OrbitControls::new(Vec3::ZERO).with_damping(0.0), Err(Error::InvalidDamping(_))));
        assert!(OrbitControls::new(Vec3::ZERO).with_damping(1.5).is_err());
    }
}
