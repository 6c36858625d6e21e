//! Frame plan: what one render call will draw.

use std::sync::Arc;

use super::target::{OutputSize, ShadowFilter};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::light::{Light, LightKind};
use crate::material::Material;
use crate::math::{Color, Mat4, Vec3};
use crate::scene::{NodeId, NodeKind, Scene};

/// One mesh ready to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub model: Mat4,
    pub geometry: Arc<Geometry>,
    pub material: Arc<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

/// Kind-specific light parameters resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightData {
    Ambient,
    Hemisphere { ground_color: Color },
    /// Unit vector the light travels along.
    Directional { direction: Vec3 },
    Spot { position: Vec3, direction: Vec3, cos_outer: f32, cos_inner: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightItem {
    pub node: NodeId,
    pub data: LightData,
    pub color: Color,
    pub intensity: f32,
    /// Index into [`FramePlan::shadow_passes`].
    pub shadow_pass: Option<usize>,
}

/// Render one shadow map from a light's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPass {
    pub light: NodeId,
    pub map_size: (u32, u32),
    pub view_projection: Mat4,
    pub radius: f32,
    pub bias: f32,
    /// Indices into [`FramePlan::draws`] of meshes that cast shadows.
    pub occluders: Vec<usize>,
    /// Indices into [`FramePlan::draws`] of meshes that receive shadows.
    pub receivers: Vec<usize>,
}

/// Camera data for the color pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewData {
    pub camera: NodeId,
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl ViewData {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Everything one frame draws, in order: shadow passes, then the color pass.
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub frame: u64,
    pub output: OutputSize,
    pub clear_color: Color,
    pub shadow_filter: ShadowFilter,
    pub shadow_passes: Vec<ShadowPass>,
    pub view: ViewData,
    pub lights: Vec<LightItem>,
    /// Visible, ready meshes in traversal order.
    pub draws: Vec<DrawItem>,
}

impl FramePlan {
    /// Nodes drawn into the given shadow pass.
    pub fn occluder_nodes(&self, pass: &ShadowPass) -> Vec<NodeId> {
        pass.occluders.iter().map(|&i| self.draws[i].node).collect()
    }

    pub fn receiver_nodes(&self, pass: &ShadowPass) -> Vec<NodeId> {
        pass.receivers.iter().map(|&i| self.draws[i].node).collect()
    }

    pub fn shadow_pass_for(&self, light: NodeId) -> Option<&ShadowPass> {
        self.shadow_passes.iter().find(|p| p.light == light)
    }
}

pub(super) struct PlanSettings {
    pub frame: u64,
    pub output: OutputSize,
    pub clear_color: Color,
    pub shadows_enabled: bool,
    pub shadow_filter: ShadowFilter,
}

/// Walk the scene once and build the plan for `camera`.
pub(super) fn build(scene: &Scene, camera: NodeId, settings: PlanSettings) -> Result<FramePlan> {
    let projection = scene.camera(camera)?.projection_matrix();
    let camera_world = scene.world_transform(camera)?;

    let mut draws = Vec::new();
    let mut lights = Vec::new();
    let mut pending_shadows = Vec::new();

    scene.visit_visible(|id, node, world| match node.kind() {
        NodeKind::Mesh(mesh) => {
            if let (Some(geometry), Some(material)) = (&mesh.geometry, &mesh.material) {
                draws.push(DrawItem {
                    node: id,
                    model: world,
                    geometry: Arc::clone(geometry),
                    material: Arc::clone(material),
                    cast_shadow: mesh.cast_shadow,
                    receive_shadow: mesh.receive_shadow,
                });
            }
        }
        NodeKind::Light(light) if scene.is_light_active(id) => {
            let position = world.w_axis.truncate();
            let Some(data) = resolve_light(light, position) else {
                log::debug!("light {id:?} sits on its target, skipped");
                return;
            };
            let index = lights.len();
            lights.push(LightItem {
                node: id,
                data,
                color: light.color,
                intensity: light.intensity(),
                shadow_pass: None,
            });
            if settings.shadows_enabled && light.casts_shadow() {
                pending_shadows.push((index, position));
            }
        }
        _ => {}
    });

    let occluders: Vec<usize> = draws.iter().enumerate().filter(|(_, d)| d.cast_shadow).map(|(i, _)| i).collect();
    let receivers: Vec<usize> = draws.iter().enumerate().filter(|(_, d)| d.receive_shadow).map(|(i, _)| i).collect();

    let mut shadow_passes = Vec::new();
    for (light_index, position) in pending_shadows {
        let item = &mut lights[light_index];
        let light = scene.light(item.node)?;
        let (Some(shadow), Some((view, proj))) = (light.shadow(), light.shadow_matrices(position)) else {
            continue;
        };
        item.shadow_pass = Some(shadow_passes.len());
        shadow_passes.push(ShadowPass {
            light: item.node,
            map_size: shadow.map_size(),
            view_projection: proj * view,
            radius: shadow.radius(),
            bias: shadow.bias(),
            occluders: occluders.clone(),
            receivers: receivers.clone(),
        });
    }

    Ok(FramePlan {
        frame: settings.frame,
        output: settings.output,
        clear_color: settings.clear_color,
        shadow_filter: settings.shadow_filter,
        shadow_passes,
        view: ViewData {
            camera,
            view: camera_world.inverse(),
            projection,
            position: camera_world.w_axis.truncate(),
        },
        lights,
        draws,
    })
}

fn resolve_light(light: &Light, position: Vec3) -> Option<LightData> {
    Some(match light.kind() {
        LightKind::Ambient => LightData::Ambient,
        LightKind::Hemisphere { ground_color } => LightData::Hemisphere { ground_color },
        LightKind::Directional { target } => LightData::Directional {
            direction: (target - position).try_normalize()?,
        },
        LightKind::Spot { target, angle, penumbra } => LightData::Spot {
            position,
            direction: (target - position).try_normalize()?,
            cos_outer: angle.cos(),
            cos_inner: (angle * (1.0 - penumbra)).cos(),
        },
    })
}
