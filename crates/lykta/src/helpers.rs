//! Debug helpers built from ordinary scene nodes.

use std::sync::Arc;

use crate::error::Result;
use crate::geometry::Geometry;
use crate::material::Material;
use crate::math::{Color, Vec3};
use crate::scene::{Mesh, Node, NodeId, Scene};

/// Bar thickness relative to the axis length.
const AXIS_THICKNESS: f32 = 0.02;

/// Spawn an axes gizmo under `parent`: a group named `"axes"` holding
/// three unlit bars from the origin along +X (red), +Y (green) and
/// +Z (blue), each `size` long.
///
/// The bars neither cast nor receive shadows.
pub fn spawn_axes(scene: &mut Scene, parent: NodeId, size: f32) -> Result<NodeId> {
    let group = scene.spawn_child(parent, Node::group("axes"))?;
    let t = (size * AXIS_THICKNESS).max(f32::EPSILON);
    let bars = [
        ("axis-x", Vec3::X, Color::RED, Geometry::cuboid(size, t, t)),
        ("axis-y", Vec3::Y, Color::GREEN, Geometry::cuboid(t, size, t)),
        ("axis-z", Vec3::Z, Color::BLUE, Geometry::cuboid(t, t, size)),
    ];
    for (name, axis, color, geometry) in bars {
        let mesh = Mesh::new(Arc::new(geometry), Arc::new(Material::basic(color)));
        let offset = axis * size * 0.5;
        scene.spawn_child(group, Node::mesh(name, mesh).with_position(offset.x, offset.y, offset.z))?;
    }
    Ok(group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Shading;

    #[test]
    fn axes_are_three_colored_bars() {
        let mut scene = Scene::new();
        let root = scene.root();
        let axes = spawn_axes(&mut scene, root, 2.0).unwrap();

        let children = scene.children(axes).unwrap().to_vec();
        assert_eq!(children.len(), 3);

        let x = scene.find("axis-x").unwrap();
        let mesh = scene.mesh(x).unwrap();
        let material = mesh.material.as_ref().unwrap();
        assert_eq!(material.color, Color::RED);
        assert_eq!(material.shading, Shading::Basic);
        assert!(!mesh.cast_shadow);

        let bounds = mesh.geometry.as_ref().unwrap().bounds();
        assert!((bounds.size().x - 2.0).abs() < 1e-6);
        assert_eq!(scene.world_position(x).unwrap(), Vec3::new(1.0, 0.0, 0.0));
    }
}
