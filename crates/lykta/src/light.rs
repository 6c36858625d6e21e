//! # Lights — Illumination and Shadow Configuration
//!
//! Four kinds of light, split by whether they can cast shadows:
//!
//! | Kind | Illumination | Shadows |
//! |------|--------------|---------|
//! | [`Ambient`](LightKind::Ambient) | uniform | never |
//! | [`Hemisphere`](LightKind::Hemisphere) | sky/ground gradient along +Y | never |
//! | [`Directional`](LightKind::Directional) | parallel rays toward a target | orthographic frustum |
//! | [`Spot`](LightKind::Spot) | cone toward a target | perspective frustum |
//!
//! A light's position is its scene node's world position. Directional and
//! spot lights also aim at a world-space `target` point.
//!
//! ## Shadow Descriptors
//!
//! Turning shadows on installs a [`ShadowDescriptor`]: map resolution,
//! light-space frustum, blur radius, and depth bias. Every value is checked
//! when it is set, so a light that reaches the renderer always has a
//! usable descriptor. Asking an ambient or hemisphere light to cast shadows
//! is an error, not a silent no-op.
//!
//! ```text
//! let mut sun = Light::directional(Color::WHITE, 0.5)?;
//! sun.set_cast_shadow(true)?;               // default 512x512 descriptor
//! sun.shadow_mut().unwrap().set_frustum(
//!     ShadowFrustum::orthographic(-3.0, 3.0, 3.0, -2.0, 0.5, 6.0)?,
//! )?;
//! ```
//!
//! The frustum is the caller's tuning knob. Too large wastes map resolution,
//! too small clips shadows. Nothing here sizes it automatically.

use crate::error::{Error, Result};
use crate::math::{Color, Mat4, Vec3};

/// Default shadow map edge length in texels.
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 512;

/// Light type and its kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    /// The light's color lights surfaces facing +Y, `ground_color` those
    /// facing -Y.
    Hemisphere { ground_color: Color },
    Directional { target: Vec3 },
    /// `angle` is the half-angle of the cone in radians, `penumbra` the
    /// fraction of the cone that fades out, in `[0, 1]`.
    Spot { target: Vec3, angle: f32, penumbra: f32 },
}

impl LightKind {
    pub fn label(&self) -> &'static str {
        match self {
            LightKind::Ambient => "ambient",
            LightKind::Hemisphere { .. } => "hemisphere",
            LightKind::Directional { .. } => "directional",
            LightKind::Spot { .. } => "spot",
        }
    }

    pub fn can_cast_shadow(&self) -> bool {
        matches!(self, LightKind::Directional { .. } | LightKind::Spot { .. })
    }

    pub fn target(&self) -> Option<Vec3> {
        match *self {
            LightKind::Directional { target } | LightKind::Spot { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Light-space view volume used to render a shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowFrustum {
    /// Box bounds in light view space. Directional lights only.
    Orthographic { left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32 },
    /// Depth range of a spot light's cone. The field of view follows the
    /// cone angle.
    Perspective { near: f32, far: f32 },
}

impl ShadowFrustum {
    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Result<Self> {
        let f = ShadowFrustum::Orthographic { left, right, top, bottom, near, far };
        f.validate()?;
        Ok(f)
    }

    pub fn perspective(near: f32, far: f32) -> Result<Self> {
        let f = ShadowFrustum::Perspective { near, far };
        f.validate()?;
        Ok(f)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShadowFrustum::Orthographic { .. } => "orthographic",
            ShadowFrustum::Perspective { .. } => "perspective",
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            ShadowFrustum::Orthographic { left, right, top, bottom, near, far } => {
                if ![left, right, top, bottom, near, far].iter().all(|v| v.is_finite()) {
                    return Err(Error::InvalidExtent("shadow frustum bounds must be finite"));
                }
                if left >= right || bottom >= top {
                    return Err(Error::InvalidExtent("shadow frustum has zero width or height"));
                }
                if near < 0.0 || near >= far {
                    return Err(Error::InvalidProjection { near, far });
                }
                Ok(())
            }
            ShadowFrustum::Perspective { near, far } => {
                if near.is_finite() && far.is_finite() && near > 0.0 && near < far {
                    Ok(())
                } else {
                    Err(Error::InvalidProjection { near, far })
                }
            }
        }
    }

    fn light_label(&self) -> &'static str {
        match self {
            ShadowFrustum::Orthographic { .. } => "directional",
            ShadowFrustum::Perspective { .. } => "spot",
        }
    }
}

/// Shadow map parameters for one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDescriptor {
    map_width: u32,
    map_height: u32,
    frustum: ShadowFrustum,
    radius: f32,
    bias: f32,
}

impl ShadowDescriptor {
    /// 512×512 map, frustum `-5..5` on both axes, depth `0.5..500`.
    pub fn directional() -> Self {
        Self::with_frustum(ShadowFrustum::Orthographic {
            left: -5.0,
            right: 5.0,
            top: 5.0,
            bottom: -5.0,
            near: 0.5,
            far: 500.0,
        })
    }

    /// 512×512 map, depth `0.5..500`.
    pub fn spot() -> Self {
        Self::with_frustum(ShadowFrustum::Perspective { near: 0.5, far: 500.0 })
    }

    fn with_frustum(frustum: ShadowFrustum) -> Self {
        Self {
            map_width: DEFAULT_SHADOW_MAP_SIZE,
            map_height: DEFAULT_SHADOW_MAP_SIZE,
            frustum,
            radius: 1.0,
            bias: 0.0005,
        }
    }

    pub fn map_size(&self) -> (u32, u32) {
        (self.map_width, self.map_height)
    }

    pub fn frustum(&self) -> ShadowFrustum {
        self.frustum
    }

    /// Blur radius in shadow-map texels.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_map_size(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidShadowMapSize { width, height });
        }
        self.map_width = width;
        self.map_height = height;
        Ok(())
    }

    /// Replace the frustum. The kind must match the current one.
    pub fn set_frustum(&mut self, frustum: ShadowFrustum) -> Result<()> {
        if std::mem::discriminant(&frustum) != std::mem::discriminant(&self.frustum) {
            return Err(Error::ShadowFrustumMismatch {
                light: self.frustum.light_label(),
                frustum: frustum.label(),
            });
        }
        frustum.validate()?;
        self.frustum = frustum;
        Ok(())
    }

    /// Shortcut for changing only the far plane.
    pub fn set_far(&mut self, far: f32) -> Result<()> {
        let mut frustum = self.frustum;
        match &mut frustum {
            ShadowFrustum::Orthographic { far: f, .. } | ShadowFrustum::Perspective { far: f, .. } => *f = far,
        }
        self.set_frustum(frustum)
    }

    pub fn set_radius(&mut self, radius: f32) -> Result<()> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(Error::InvalidExtent("shadow radius must be non-negative"));
        }
        self.radius = radius;
        Ok(())
    }

    pub fn set_bias(&mut self, bias: f32) -> Result<()> {
        if !bias.is_finite() {
            return Err(Error::InvalidExtent("shadow bias must be finite"));
        }
        self.bias = bias;
        Ok(())
    }
}

/// A light source.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Color,
    intensity: f32,
    kind: LightKind,
    cast_shadow: bool,
    shadow: Option<ShadowDescriptor>,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Result<Self> {
        Self::new(color, intensity, LightKind::Ambient)
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Result<Self> {
        Self::new(sky, intensity, LightKind::Hemisphere { ground_color: ground })
    }

    /// A directional light aimed at the world origin.
    pub fn directional(color: Color, intensity: f32) -> Result<Self> {
        Self::new(color, intensity, LightKind::Directional { target: Vec3::ZERO })
    }

    /// A spot light aimed at the world origin with a 60° half-angle.
    pub fn spot(color: Color, intensity: f32) -> Result<Self> {
        Self::new(
            color,
            intensity,
            LightKind::Spot { target: Vec3::ZERO, angle: std::f32::consts::FRAC_PI_3, penumbra: 0.0 },
        )
    }

    pub fn new(color: Color, intensity: f32, kind: LightKind) -> Result<Self> {
        validate_intensity(intensity)?;
        if let LightKind::Spot { angle, penumbra, .. } = kind {
            validate_cone(angle, penumbra)?;
        }
        Ok(Self { color, intensity, kind, cast_shadow: false, shadow: None })
    }

    pub fn kind(&self) -> LightKind {
        self.kind
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) -> Result<()> {
        validate_intensity(intensity)?;
        self.intensity = intensity;
        Ok(())
    }

    /// Aim a directional or spot light at a world-space point.
    pub fn set_target(&mut self, point: Vec3) -> Result<()> {
        match &mut self.kind {
            LightKind::Directional { target } | LightKind::Spot { target, .. } => {
                *target = point;
                Ok(())
            }
            other => Err(Error::InvalidData(format!("{} lights have no target", other.label()))),
        }
    }

    pub fn set_ground_color(&mut self, color: Color) -> Result<()> {
        match &mut self.kind {
            LightKind::Hemisphere { ground_color } => {
                *ground_color = color;
                Ok(())
            }
            other => Err(Error::InvalidData(format!("{} lights have no ground color", other.label()))),
        }
    }

    pub fn set_cone(&mut self, half_angle: f32, softness: f32) -> Result<()> {
        validate_cone(half_angle, softness)?;
        match &mut self.kind {
            LightKind::Spot { angle, penumbra, .. } => {
                *angle = half_angle;
                *penumbra = softness;
                Ok(())
            }
            other => Err(Error::InvalidData(format!("{} lights have no cone", other.label()))),
        }
    }

    /// Toggle shadow casting. Enabling it on a light without a descriptor
    /// installs the default one for its kind.
    pub fn set_cast_shadow(&mut self, enabled: bool) -> Result<()> {
        if !enabled {
            self.cast_shadow = false;
            return Ok(());
        }
        let default = match self.kind {
            LightKind::Directional { .. } => ShadowDescriptor::directional(),
            LightKind::Spot { .. } => ShadowDescriptor::spot(),
            other => return Err(Error::ShadowNotSupported(other.label())),
        };
        self.shadow.get_or_insert(default);
        self.cast_shadow = true;
        Ok(())
    }

    /// Enable shadows with an explicit descriptor.
    pub fn enable_shadow(&mut self, descriptor: ShadowDescriptor) -> Result<()> {
        let expected = match self.kind {
            LightKind::Directional { .. } => "orthographic",
            LightKind::Spot { .. } => "perspective",
            other => return Err(Error::ShadowNotSupported(other.label())),
        };
        if descriptor.frustum.label() != expected {
            return Err(Error::ShadowFrustumMismatch {
                light: self.kind.label(),
                frustum: descriptor.frustum.label(),
            });
        }
        self.shadow = Some(descriptor);
        self.cast_shadow = true;
        Ok(())
    }

    pub fn casts_shadow(&self) -> bool {
        self.cast_shadow
    }

    /// The shadow descriptor, while shadow casting is on.
    pub fn shadow(&self) -> Option<&ShadowDescriptor> {
        self.shadow.as_ref().filter(|_| self.cast_shadow)
    }

    pub fn shadow_mut(&mut self) -> Option<&mut ShadowDescriptor> {
        if self.cast_shadow { self.shadow.as_mut() } else { None }
    }

    /// Light-space view and projection matrices for rendering this light's
    /// shadow map from world position `position`.
    ///
    /// `None` when shadows are off or the light sits on its own target.
    pub fn shadow_matrices(&self, position: Vec3) -> Option<(Mat4, Mat4)> {
        let shadow = self.shadow()?;
        let target = self.kind.target()?;
        let view = light_view(position, target)?;
        let projection = match (shadow.frustum, self.kind) {
            (ShadowFrustum::Orthographic { left, right, top, bottom, near, far }, _) => {
                Mat4::orthographic_rh(left, right, bottom, top, near, far)
            }
            (ShadowFrustum::Perspective { near, far }, LightKind::Spot { angle, .. }) => {
                let (w, h) = shadow.map_size();
                let fov = (2.0 * angle).min(std::f32::consts::PI - 0.01);
                Mat4::perspective_rh(fov, w as f32 / h as f32, near, far)
            }
            (ShadowFrustum::Perspective { .. }, _) => return None,
        };
        Some((view, projection))
    }
}

/// Right-handed view matrix from `eye` toward `target`, picking a fallback
/// up axis when looking straight up or down.
pub(crate) fn light_view(eye: Vec3, target: Vec3) -> Option<Mat4> {
    let dir = target - eye;
    if dir.length_squared() <= f32::EPSILON {
        return None;
    }
    let up = if dir.normalize().cross(Vec3::Y).length_squared() <= 1e-8 { Vec3::Z } else { Vec3::Y };
    Some(Mat4::look_at_rh(eye, target, up))
}

fn validate_intensity(intensity: f32) -> Result<()> {
    if intensity.is_finite() && intensity >= 0.0 {
        Ok(())
    } else {
        Err(Error::NegativeIntensity(intensity))
    }
}

fn validate_cone(angle: f32, penumbra: f32) -> Result<()> {
    if !(angle.is_finite() && angle > 0.0 && angle <= std::f32::consts::FRAC_PI_2) {
        return Err(Error::InvalidExtent("spot angle must lie in (0, pi/2]"));
    }
    if !(0.0..=1.0).contains(&penumbra) {
        return Err(Error::InvalidExtent("spot penumbra must lie in [0, 1]"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_and_hemisphere_reject_shadows() {
        let mut ambient = Light::ambient(Color::WHITE, 0.5).unwrap();
        assert!(matches!(ambient.set_cast_shadow(true), Err(Error::ShadowNotSupported("ambient"))));
        assert!(ambient.shadow().is_none());

        let mut hemi = Light::hemisphere(Color::WHITE, Color::BLACK, 1.0).unwrap();
        assert!(matches!(
            hemi.enable_shadow(ShadowDescriptor::directional()),
            Err(Error::ShadowNotSupported("hemisphere"))
        ));
        assert!(!hemi.casts_shadow());
        // Turning shadows off is always fine.
        assert!(hemi.set_cast_shadow(false).is_ok());
    }

    #[test]
    fn enabling_installs_explicit_default() {
        let mut sun = Light::directional(Color::WHITE, 1.0).unwrap();
        sun.set_cast_shadow(true).unwrap();
        let shadow = sun.shadow().unwrap();
        assert_eq!(shadow.map_size(), (512, 512));
        assert_eq!(shadow.radius(), 1.0);
    }

    #[test]
    fn descriptor_survives_toggle() {
        let mut sun = Light::directional(Color::WHITE, 1.0).unwrap();
        sun.set_cast_shadow(true).unwrap();
        sun.shadow_mut().unwrap().set_map_size(1024, 1024).unwrap();
        sun.set_cast_shadow(false).unwrap();
        assert!(sun.shadow().is_none());
        sun.set_cast_shadow(true).unwrap();
        assert_eq!(sun.shadow().unwrap().map_size(), (1024, 1024));
    }

    #[test]
    fn zero_map_size_rejected() {
        let mut d = ShadowDescriptor::directional();
        assert!(matches!(d.set_map_size(0, 512), Err(Error::InvalidShadowMapSize { width: 0, height: 512 })));
        assert_eq!(d.map_size(), (512, 512));
    }

    #[test]
    fn frustum_kind_must_match_light() {
        let mut spot = Light::spot(Color::WHITE, 1.0).unwrap();
        assert!(matches!(
            spot.enable_shadow(ShadowDescriptor::directional()),
            Err(Error::ShadowFrustumMismatch { light: "spot", frustum: "orthographic" })
        ));

        let mut d = ShadowDescriptor::directional();
        let persp = ShadowFrustum::perspective(0.5, 10.0).unwrap();
        assert!(d.set_frustum(persp).is_err());
    }

    #[test]
    fn frustum_bounds_validated() {
        assert!(ShadowFrustum::orthographic(-3.0, 3.0, 3.0, -2.0, 0.5, 6.0).is_ok());
        assert!(ShadowFrustum::orthographic(3.0, -3.0, 3.0, -2.0, 0.5, 6.0).is_err());
        assert!(ShadowFrustum::orthographic(-3.0, 3.0, 3.0, -2.0, 7.0, 6.0).is_err());
        let mut d = ShadowDescriptor::directional();
        assert!(d.set_far(0.1).is_err());
        assert!(d.set_far(6.0).is_ok());
    }

    #[test]
    fn negative_intensity_rejected() {
        assert!(matches!(Light::directional(Color::WHITE, -1.0), Err(Error::NegativeIntensity(_))));
        let mut l = Light::ambient(Color::WHITE, 1.0).unwrap();
        assert!(l.set_intensity(-0.1).is_err());
        assert_eq!(l.intensity(), 1.0);
    }

    #[test]
    fn directional_shadow_matrices_look_at_target() {
        let mut sun = Light::directional(Color::WHITE, 1.0).unwrap();
        sun.set_cast_shadow(true).unwrap();
        let (view, _) = sun.shadow_matrices(Vec3::new(0.0, 5.0, 0.0)).unwrap();
        // The target lies straight ahead on -Z in light view space.
        let p = view.transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5));
        assert!(sun.shadow_matrices(Vec3::ZERO).is_none());
    }
}
