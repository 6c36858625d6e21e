use std::f32::consts::TAU;

use super::CameraController;
use crate::error::Result;
use crate::math::Vec3;
use crate::stage::Stage;

/// Places the camera as a direct function of the normalized cursor.
///
/// Sweeping the cursor across the viewport's width circles the target once.
/// Vertical cursor position raises or lowers the camera by up to half of
/// `height`. There is no easing; the camera tracks the cursor exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorOrbit {
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl CursorOrbit {
    pub fn new(target: Vec3, radius: f32, height: f32) -> Self {
        Self { target, radius, height }
    }

    /// Camera position for a cursor in `-0.5..0.5` on both axes.
    pub fn position_for(&self, cursor_x: f32, cursor_y: f32) -> Vec3 {
        let (s, c) = (cursor_x * TAU).sin_cos();
        self.target + Vec3::new(s * self.radius, cursor_y * self.height, c * self.radius)
    }
}

impl CameraController for CursorOrbit {
    fn update(&mut self, stage: &mut Stage) -> Result<()> {
        let cursor = stage.input.cursor();
        let position = self.position_for(cursor.x, cursor.y);
        stage.scene.place_looking_at(stage.camera, position, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_cursor_sits_in_front() {
        let orbit = CursorOrbit::new(Vec3::ZERO, 3.0, 5.0);
        assert!(orbit.position_for(0.0, 0.0).abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-6));
        assert!(orbit.position_for(0.25, 0.5).abs_diff_eq(Vec3::new(3.0, 2.5, 0.0), 1e-5));
    }

    #[test]
    fn follows_cursor_and_faces_target() {
        let (mut stage, _) = Stage::headless(800, 600).unwrap();
        stage.input.cursor_moved(600.0, 300.0);
        let mut orbit = CursorOrbit::new(Vec3::new(0.0, 1.0, 0.0), 3.0, 5.0);
        orbit.update(&mut stage).unwrap();

        let position = stage.scene.world_position(stage.camera).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(3.0, 1.0, 0.0), 1e-5), "{position}");
        let (_, rotation, _) = stage.scene.world_transform(stage.camera).unwrap().to_scale_rotation_translation();
        assert!((rotation * Vec3::NEG_Z).abs_diff_eq(Vec3::NEG_X, 1e-5));
    }
}
