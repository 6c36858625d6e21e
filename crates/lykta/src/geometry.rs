//! # Geometry — Immutable Vertex Data
//!
//! A [`Geometry`] is the shape half of a mesh: vertices, triangle indices,
//! and a local bounding box. Once built it never changes. Meshes hold it
//! through an `Arc`, so one geometry can back any number of meshes and can
//! be delivered from a loader thread after the scene is already rendering.
//!
//! Every geometry gets a process-unique [`GeometryId`] at construction. GPU
//! backends key their buffer caches by this id rather than by pointer, so a
//! geometry that is dropped and a new one that happens to reuse its address
//! never alias.
//!
//! ## Built-In Generators
//!
//! | Constructor | Shape | Orientation |
//! |-------------|-------|-------------|
//! | [`cuboid`](Geometry::cuboid) | box | centered, axis-aligned |
//! | [`plane`](Geometry::plane) | quad | XY plane, facing +Z |
//! | [`sphere`](Geometry::sphere) | UV sphere | centered |
//! | [`torus`](Geometry::torus) | torus | ring in the XY plane |
//!
//! All triangles wind counter-clockwise seen from outside, matching
//! `FrontFace::Ccw` with back-face culling.

use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::{Pod, Zeroable};

use crate::error::{Error, Result};
use crate::math::Vec3;

/// Per-vertex data: position, surface normal, and texture UV.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Process-unique identity of a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

static NEXT_GEOMETRY: AtomicU64 = AtomicU64::new(1);

/// Axis-aligned bounding box in local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    fn from_vertices(vertices: &[Vertex]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        if vertices.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Immutable triangle geometry.
#[derive(Debug)]
pub struct Geometry {
    id: GeometryId,
    label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Geometry {
    /// Build from raw data. There must be at least one triangle, every index
    /// must address an existing vertex and the index count must be a
    /// multiple of three.
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        let label = label.into();
        if vertices.is_empty() || indices.is_empty() {
            return Err(Error::InvalidData(format!("geometry '{label}' has no triangles")));
        }
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidData(format!(
                "geometry '{label}' has {} indices, not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::InvalidData(format!(
                "geometry '{label}' index {bad} out of range ({} vertices)",
                vertices.len()
            )));
        }
        Ok(Self::from_parts(label, vertices, indices))
    }

    fn from_parts(label: String, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_vertices(&vertices);
        Self {
            id: GeometryId(NEXT_GEOMETRY.fetch_add(1, Ordering::Relaxed)),
            label,
            vertices,
            indices,
            bounds,
        }
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// A box centered at the origin with the given side lengths.
    ///
    /// Each face has its own four vertices so edges keep hard normals.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        // (normal, u axis, v axis) per face
        let faces: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        for (normal, u_dir, v_dir) in faces {
            let base = vertices.len() as u32;
            for ((cu, cv), uv) in corners.iter().zip(uvs) {
                let p = (normal + u_dir * *cu + v_dir * *cv) * half;
                vertices.push(Vertex {
                    position: p.to_array(),
                    normal: normal.to_array(),
                    uv,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::from_parts("cuboid".into(), vertices, indices)
    }

    /// A flat quad in the XY plane facing +Z, centered at the origin.
    ///
    /// Rotate by -90° about X to use it as a floor.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        let n = [0.0, 0.0, 1.0];
        let vertices = vec![
            Vertex { position: [-hw, -hh, 0.0], normal: n, uv: [0.0, 1.0] },
            Vertex { position: [hw, -hh, 0.0], normal: n, uv: [1.0, 1.0] },
            Vertex { position: [hw, hh, 0.0], normal: n, uv: [1.0, 0.0] },
            Vertex { position: [-hw, hh, 0.0], normal: n, uv: [0.0, 0.0] },
        ];
        Self::from_parts("plane".into(), vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// A UV sphere. `segments` divide longitude, `rings` latitude.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let phi = v * PI;
            for seg in 0..=segments {
                let u = seg as f32 / segments as f32;
                let theta = u * TAU;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), -phi.sin() * theta.sin());
                vertices.push(Vertex {
                    position: (n * radius).to_array(),
                    normal: n.to_array(),
                    uv: [u, v],
                });
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;
                indices.extend_from_slice(&[current, next, current + 1]);
                indices.extend_from_slice(&[current + 1, next, next + 1]);
            }
        }

        Self::from_parts("sphere".into(), vertices, indices)
    }

    /// A torus whose ring lies in the XY plane.
    ///
    /// `radius` is the distance from the center to the middle of the tube,
    /// `tube` the tube radius.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let normal = (position - center).normalize_or_zero();
                vertices.push(Vertex {
                    position: position.to_array(),
                    normal: normal.to_array(),
                    uv: [i as f32 / tubular as f32, j as f32 / radial as f32],
                });
            }
        }

        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self::from_parts("torus".into(), vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_has_hard_edges_and_expected_bounds() {
        let g = Geometry::cuboid(2.0, 1.0, 4.0);
        assert_eq!(g.vertices().len(), 24);
        assert_eq!(g.indices().len(), 36);
        let b = g.bounds();
        assert!(b.min.abs_diff_eq(Vec3::new(-1.0, -0.5, -2.0), 1e-6));
        assert!(b.max.abs_diff_eq(Vec3::new(1.0, 0.5, 2.0), 1e-6));
    }

    #[test]
    fn cuboid_winding_faces_outward() {
        let g = Geometry::cuboid(1.0, 1.0, 1.0);
        for tri in g.indices().chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(g.vertices()[i as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let stored = Vec3::from(g.vertices()[tri[0] as usize].normal);
            assert!(face_normal.dot(stored) > 0.99, "triangle winds inward");
        }
    }

    #[test]
    fn sphere_vertices_lie_on_radius() {
        let g = Geometry::sphere(1.5, 16, 8);
        for v in g.vertices() {
            assert!((Vec3::from(v.position).length() - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn torus_indices_in_range() {
        let g = Geometry::torus(1.0, 0.3, 12, 24);
        let count = g.vertices().len() as u32;
        assert!(g.indices().iter().all(|&i| i < count));
        assert_eq!(g.triangle_count(), 12 * 24 * 2);
    }

    #[test]
    fn new_rejects_out_of_range_indices() {
        let v = vec![Vertex::zeroed(); 3];
        assert!(Geometry::new("bad", v.clone(), vec![0, 1, 3]).is_err());
        assert!(Geometry::new("short", v.clone(), vec![0, 1]).is_err());
        assert!(Geometry::new("ok", v, vec![0, 1, 2]).is_ok());
    }

    #[test]
    fn new_rejects_empty_geometry() {
        assert!(matches!(Geometry::new("empty", Vec::new(), Vec::new()), Err(Error::InvalidData(_))));
        assert!(Geometry::new("no triangles", vec![Vertex::zeroed(); 3], Vec::new()).is_err());
    }

    #[test]
    fn ids_are_unique() {
        let a = Geometry::plane(1.0, 1.0);
        let b = Geometry::plane(1.0, 1.0);
        assert_ne!(a.id(), b.id());
    }
}
