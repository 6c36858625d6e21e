//! # Uniforms — Frame Plan to GPU Bytes
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Group 0 : Camera (per frame)            CameraUniform   80 B │
//! │   view_proj: mat4x4, position: vec3 + pad                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Group 1 : Lights + shadow maps          LightsUniform 1168 B │
//! │   8 × LightRaw (144 B), count, shadow filter                 │
//! │   + depth texture array + comparison sampler                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Group 2 : Material (per material)       MaterialUniform 32 B │
//! │   color: vec4, params: vec4 (shading, roughness, metalness)  │
//! │   + color map + sampler                                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Group 3 : Model (dynamic offset)        ModelUniform   144 B │
//! │   model, normal_matrix: mat4x4, flags: vec4                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `vec3` is followed by a scalar so the Rust layout matches WGSL's
//! 16-byte alignment without hidden padding. The shadow pass reuses the
//! model uniform and adds a [`ShadowViewUniform`] per light, also at a
//! dynamic offset.
//!
//! Packing is pure CPU work and is tested without a device.

use bytemuck::{Pod, Zeroable};

use crate::material::{Material, Shading};
use crate::math::Mat4;
use crate::render::{FramePlan, LightData, ShadowFilter};

/// Lights beyond this count are ignored by the GPU backend.
pub(crate) const MAX_LIGHTS: usize = 8;

/// Shadow map layers in the depth texture array.
pub(crate) const MAX_SHADOW_MAPS: usize = 4;

pub(crate) const LIGHT_AMBIENT: u32 = 0;
pub(crate) const LIGHT_HEMISPHERE: u32 = 1;
pub(crate) const LIGHT_DIRECTIONAL: u32 = 2;
pub(crate) const LIGHT_SPOT: u32 = 3;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 3],
    pub _pad: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct LightRaw {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub kind: u32,
    pub direction: [f32; 3],
    pub cos_outer: f32,
    pub ground_color: [f32; 3],
    pub cos_inner: f32,
    pub shadow_view_proj: [[f32; 4]; 4],
    /// Layer in the shadow array, or -1 for no shadow.
    pub shadow_layer: i32,
    pub shadow_radius: f32,
    pub shadow_bias: f32,
    /// One shadow map texel in UV units.
    pub shadow_texel: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct LightsUniform {
    pub lights: [LightRaw; MAX_LIGHTS],
    pub count: u32,
    pub filter: u32,
    pub _pad: [u32; 2],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct MaterialUniform {
    pub color: [f32; 4],
    /// x: shading model (0 basic, 1 lambert, 2 standard), y: roughness,
    /// z: metalness, w: unused.
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    /// x: 1 if the mesh receives shadows.
    pub flags: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct ShadowViewUniform {
    pub view_proj: [[f32; 4]; 4],
}

pub(crate) fn camera_uniform(plan: &FramePlan) -> CameraUniform {
    CameraUniform {
        view_proj: plan.view.view_projection().to_cols_array_2d(),
        position: plan.view.position.to_array(),
        _pad: 0.0,
    }
}

pub(crate) fn model_uniform(model: Mat4, receive_shadow: bool) -> ModelUniform {
    ModelUniform {
        model: model.to_cols_array_2d(),
        normal_matrix: model.inverse().transpose().to_cols_array_2d(),
        flags: [if receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
    }
}

pub(crate) fn material_uniform(material: &Material) -> MaterialUniform {
    let (mode, roughness, metalness) = match material.shading {
        Shading::Basic => (0.0, 1.0, 0.0),
        Shading::Lambert => (1.0, 1.0, 0.0),
        Shading::Standard { roughness, metalness } => (2.0, roughness, metalness),
    };
    let c = material.color;
    MaterialUniform {
        color: [c.r, c.g, c.b, 1.0],
        params: [mode, roughness, metalness, 0.0],
    }
}

/// Pack the plan's lights. `layers[i]` is the shadow array layer assigned
/// to `plan.shadow_passes[i]`, if it got one.
pub(crate) fn lights_uniform(plan: &FramePlan, layers: &[Option<u32>], shadow_map_size: u32) -> LightsUniform {
    let mut out = LightsUniform::zeroed();
    for (raw, light) in out.lights.iter_mut().zip(&plan.lights) {
        let c = light.color;
        raw.color = [c.r, c.g, c.b];
        raw.intensity = light.intensity;
        raw.shadow_layer = -1;
        match light.data {
            LightData::Ambient => raw.kind = LIGHT_AMBIENT,
            LightData::Hemisphere { ground_color } => {
                raw.kind = LIGHT_HEMISPHERE;
                raw.ground_color = ground_color.to_array();
            }
            LightData::Directional { direction } => {
                raw.kind = LIGHT_DIRECTIONAL;
                raw.direction = direction.to_array();
            }
            LightData::Spot { position, direction, cos_outer, cos_inner } => {
                raw.kind = LIGHT_SPOT;
                raw.position = position.to_array();
                raw.direction = direction.to_array();
                raw.cos_outer = cos_outer;
                raw.cos_inner = cos_inner;
            }
        }
        let shadow = light
            .shadow_pass
            .and_then(|i| Some((plan.shadow_passes.get(i)?, (*layers.get(i)?)?)));
        if let Some((pass, layer)) = shadow {
            raw.shadow_view_proj = pass.view_projection.to_cols_array_2d();
            raw.shadow_layer = layer as i32;
            raw.shadow_radius = pass.radius;
            raw.shadow_bias = pass.bias;
            raw.shadow_texel = 1.0 / shadow_map_size.max(1) as f32;
        }
    }
    out.count = plan.lights.len().min(MAX_LIGHTS) as u32;
    out.filter = match plan.shadow_filter {
        ShadowFilter::Basic => 0,
        ShadowFilter::Pcf => 1,
        ShadowFilter::PcfSoft => 2,
    };
    out
}

/// Assign array layers to shadow passes in plan order. Passes past
/// [`MAX_SHADOW_MAPS`] get none.
pub(crate) fn assign_shadow_layers(plan: &FramePlan) -> Vec<Option<u32>> {
    (0..plan.shadow_passes.len())
        .map(|i| (i < MAX_SHADOW_MAPS).then_some(i as u32))
        .collect()
}

/// Side of the square shadow array: the largest requested map dimension,
/// capped by the device.
pub(crate) fn shadow_array_size(plan: &FramePlan, device_max: u32) -> u32 {
    plan.shadow_passes
        .iter()
        .take(MAX_SHADOW_MAPS)
        .map(|p| p.map_size.0.max(p.map_size.1))
        .max()
        .unwrap_or(1)
        .clamp(1, device_max.max(1))
}

#[cfg(test)]
mod tests {
    use std::mem::size_of;

    use super::*;
    use crate::camera::Camera;
    use crate::light::Light;
    use crate::math::{Color, Vec3};
    use crate::scene::Node;
    use crate::stage::Stage;

    #[test]
    fn sizes_match_wgsl() {
        assert_eq!(size_of::<CameraUniform>(), 80);
        assert_eq!(size_of::<LightRaw>(), 144);
        assert_eq!(size_of::<LightsUniform>(), 144 * MAX_LIGHTS + 16);
        assert_eq!(size_of::<MaterialUniform>(), 32);
        assert_eq!(size_of::<ModelUniform>(), 144);
        assert_eq!(size_of::<ShadowViewUniform>(), 64);
    }

    #[test]
    fn material_modes() {
        let basic = material_uniform(&Material::basic(Color::RED));
        assert_eq!(basic.params[0], 0.0);
        assert_eq!(basic.color, [1.0, 0.0, 0.0, 1.0]);
        let standard = material_uniform(&Material::standard(Color::WHITE, 0.3, 0.7));
        assert_eq!(standard.params, [2.0, 0.3, 0.7, 0.0]);
    }

    #[test]
    fn lights_and_shadow_layers_packed() {
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        stage.target.set_shadows_enabled(true);
        stage.scene.spawn(Node::light("ambient", Light::ambient(Color::WHITE, 0.5).unwrap()));
        let mut sun = Light::directional(Color::WHITE, 1.0).unwrap();
        sun.set_cast_shadow(true).unwrap();
        stage.scene.spawn(Node::light("sun", sun).with_position(2.0, 2.0, -1.0));
        stage.render().unwrap();

        let plan = recorder.last().unwrap();
        let layers = assign_shadow_layers(&plan);
        assert_eq!(layers, vec![Some(0)]);
        assert_eq!(shadow_array_size(&plan, 8192), 512);

        let packed = lights_uniform(&plan, &layers, 512);
        assert_eq!(packed.count, 2);
        assert_eq!(packed.filter, 1);
        assert_eq!(packed.lights[0].kind, LIGHT_AMBIENT);
        assert_eq!(packed.lights[0].shadow_layer, -1);
        assert_eq!(packed.lights[1].kind, LIGHT_DIRECTIONAL);
        assert_eq!(packed.lights[1].shadow_layer, 0);
        assert!((packed.lights[1].shadow_texel - 1.0 / 512.0).abs() < 1e-9);
        let expected = -Vec3::new(2.0, 2.0, -1.0).normalize();
        assert!(Vec3::from(packed.lights[1].direction).abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn camera_uniform_uses_cached_projection() {
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        stage.render().unwrap();
        let plan = recorder.last().unwrap();
        let uniform = camera_uniform(&plan);
        let mut expected = Camera::default();
        expected.set_aspect(1.0).unwrap();
        expected.update_projection();
        assert_eq!(uniform.view_proj, expected.projection_matrix().to_cols_array_2d());
    }
}
