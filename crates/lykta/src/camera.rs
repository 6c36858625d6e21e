//! # Camera — Projection Parameters
//!
//! A [`Camera`] holds the projection half of a viewpoint. Its position and
//! orientation come from the scene node that owns it, so moving or aiming a
//! camera goes through [`Scene`](crate::scene::Scene) like any other node.
//!
//! ## Explicit Projection Updates
//!
//! The projection matrix is cached. Changing field of view, aspect, or clip
//! planes validates the new value immediately and marks the cache stale,
//! but does **not** recompute it:
//!
//! ```text
//! camera.set_fov(50.0)?;      // validated, matrix still uses the old fov
//! camera.needs_update();      // true
//! camera.update_projection(); // matrix now uses fov 50
//! ```
//!
//! Renderers read [`Camera::projection_matrix`], which always returns the
//! cached value. Forgetting `update_projection` therefore renders with the
//! previous projection, which is exactly what a caller can observe and test.
//! The resize reconciler always calls it after writing the aspect ratio.
//!
//! ## Comparison
//!
//! - **three.js**: `PerspectiveCamera.updateProjectionMatrix()` has the same
//!   contract; setters do not validate.
//! - **Bevy**: projections are recomputed by a system every frame when the
//!   component changes, so there is no caller obligation.

use crate::error::{Error, Result};
use crate::math::Mat4;

/// Projection parameters. Angles are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_y_degrees: f32, near: f32, far: f32 },
    /// `half_height` is half the vertical extent of the view volume in world
    /// units; the horizontal extent follows the aspect ratio.
    Orthographic { half_height: f32, near: f32, far: f32 },
}

impl Projection {
    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y_degrees, near, far } => {
                Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far)
            }
            Projection::Orthographic { half_height, near, far } => {
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(-half_width, half_width, -half_height, half_height, near, far)
            }
        }
    }

    fn validate(&self) -> Result<()> {
        validate_clip(self.near(), self.far())?;
        match *self {
            Projection::Perspective { fov_y_degrees, .. } => validate_fov(fov_y_degrees),
            Projection::Orthographic { half_height, .. } => {
                if half_height.is_finite() && half_height > 0.0 {
                    Ok(())
                } else {
                    Err(Error::InvalidExtent("orthographic half height must be positive"))
                }
            }
        }
    }
}

/// Camera projection state with a cached matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Projection,
    aspect: f32,
    matrix: Mat4,
    stale: bool,
}

impl Camera {
    /// A perspective camera. `fov_y_degrees` is the vertical field of view.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Perspective { fov_y_degrees, near, far }, aspect)
    }

    pub fn orthographic(half_height: f32, aspect: f32, near: f32, far: f32) -> Result<Self> {
        Self::new(Projection::Orthographic { half_height, near, far }, aspect)
    }

    /// Build from explicit projection parameters. The matrix is computed
    /// immediately.
    pub fn new(projection: Projection, aspect: f32) -> Result<Self> {
        projection.validate()?;
        validate_aspect(aspect)?;
        Ok(Self {
            projection,
            aspect,
            matrix: projection.matrix(aspect),
            stale: false,
        })
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Width over height. Takes effect at the next [`update_projection`](Self::update_projection).
    pub fn set_aspect(&mut self, aspect: f32) -> Result<()> {
        validate_aspect(aspect)?;
        if aspect != self.aspect {
            self.aspect = aspect;
            self.stale = true;
        }
        Ok(())
    }

    /// Vertical field of view in degrees. Perspective cameras only.
    pub fn set_fov(&mut self, fov_y_degrees: f32) -> Result<()> {
        validate_fov(fov_y_degrees)?;
        match &mut self.projection {
            Projection::Perspective { fov_y_degrees: fov, .. } => {
                if *fov != fov_y_degrees {
                    *fov = fov_y_degrees;
                    self.stale = true;
                }
                Ok(())
            }
            Projection::Orthographic { .. } => Err(Error::InvalidFieldOfView(fov_y_degrees)),
        }
    }

    /// Orthographic cameras only.
    pub fn set_half_height(&mut self, value: f32) -> Result<()> {
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::InvalidExtent("orthographic half height must be positive"));
        }
        match &mut self.projection {
            Projection::Orthographic { half_height, .. } => {
                if *half_height != value {
                    *half_height = value;
                    self.stale = true;
                }
                Ok(())
            }
            Projection::Perspective { .. } => {
                Err(Error::InvalidExtent("half height only applies to orthographic cameras"))
            }
        }
    }

    pub fn set_clip_planes(&mut self, near: f32, far: f32) -> Result<()> {
        validate_clip(near, far)?;
        let (n, f) = match &mut self.projection {
            Projection::Perspective { near, far, .. } | Projection::Orthographic { near, far, .. } => (near, far),
        };
        if *n != near || *f != far {
            *n = near;
            *f = far;
            self.stale = true;
        }
        Ok(())
    }

    /// Whether a parameter changed since the last [`update_projection`](Self::update_projection).
    pub fn needs_update(&self) -> bool {
        self.stale
    }

    /// Recompute the cached projection matrix from the current parameters.
    pub fn update_projection(&mut self) {
        self.matrix = self.projection.matrix(self.aspect);
        self.stale = false;
    }

    /// The cached projection matrix (right-handed, depth range `0..1`).
    pub fn projection_matrix(&self) -> Mat4 {
        self.matrix
    }
}

impl Default for Camera {
    /// 75° vertical field of view, 4:3, clip planes `0.1..100`.
    fn default() -> Self {
        let projection = Projection::Perspective { fov_y_degrees: 75.0, near: 0.1, far: 100.0 };
        let aspect = 4.0 / 3.0;
        Self {
            projection,
            aspect,
            matrix: projection.matrix(aspect),
            stale: false,
        }
    }
}

fn validate_aspect(aspect: f32) -> Result<()> {
    if aspect.is_finite() && aspect > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAspect(aspect))
    }
}

fn validate_fov(fov: f32) -> Result<()> {
    if fov.is_finite() && fov > 0.0 && fov < 180.0 {
        Ok(())
    } else {
        Err(Error::InvalidFieldOfView(fov))
    }
}

fn validate_clip(near: f32, far: f32) -> Result<()> {
    if near.is_finite() && far.is_finite() && near > 0.0 && near < far {
        Ok(())
    } else {
        Err(Error::InvalidProjection { near, far })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(Camera::perspective(75.0, 1.0, 0.0, 10.0), Err(Error::InvalidProjection { .. })));
        assert!(matches!(Camera::perspective(75.0, 1.0, 5.0, 5.0), Err(Error::InvalidProjection { .. })));
        assert!(matches!(Camera::perspective(75.0, 0.0, 0.1, 10.0), Err(Error::InvalidAspect(_))));
        assert!(matches!(Camera::perspective(180.0, 1.0, 0.1, 10.0), Err(Error::InvalidFieldOfView(_))));
        assert!(Camera::orthographic(0.0, 1.0, 0.1, 10.0).is_err());
    }

    #[test]
    fn setters_defer_matrix_until_update() {
        let mut cam = Camera::perspective(75.0, 1.0, 0.1, 100.0).unwrap();
        let before = cam.projection_matrix();

        cam.set_aspect(2.0).unwrap();
        assert!(cam.needs_update());
        assert_eq!(cam.projection_matrix(), before);

        cam.update_projection();
        assert!(!cam.needs_update());
        assert_eq!(cam.projection_matrix(), Mat4::perspective_rh(75f32.to_radians(), 2.0, 0.1, 100.0));
    }

    #[test]
    fn rejected_setter_leaves_state_untouched() {
        let mut cam = Camera::default();
        assert!(cam.set_clip_planes(10.0, 1.0).is_err());
        assert!(cam.set_aspect(f32::NAN).is_err());
        assert!(!cam.needs_update());
        assert_eq!(cam.projection().near(), 0.1);
    }

    #[test]
    fn unchanged_value_does_not_mark_stale() {
        let mut cam = Camera::default();
        cam.set_aspect(4.0 / 3.0).unwrap();
        assert!(!cam.needs_update());
    }

    #[test]
    fn orthographic_width_follows_aspect() {
        let cam = Camera::orthographic(2.0, 2.0, 0.1, 10.0).unwrap();
        let edge = cam.projection_matrix().project_point3(crate::math::Vec3::new(4.0, 2.0, -1.0));
        assert!((edge.x - 1.0).abs() < 1e-5);
        assert!((edge.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fov_is_perspective_only() {
        let mut cam = Camera::orthographic(1.0, 1.0, 0.1, 10.0).unwrap();
        assert!(cam.set_fov(60.0).is_err());
        let mut cam = Camera::default();
        assert!(cam.set_half_height(1.0).is_err());
    }
}
