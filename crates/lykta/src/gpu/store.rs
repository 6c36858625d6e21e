//! GPU copies of geometry, textures and materials.
//!
//! Geometry and textures are immutable once created, so an id maps to one
//! upload for its whole lifetime. Materials have no id. They are keyed by
//! their `Arc` and the cache holds a clone, which keeps the address from
//! being reused and the material from being mutated while it is cached.
//! Entries that no frame has used for [`EVICT_AFTER_FRAMES`] frames are
//! dropped.

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::geometry::{Geometry, GeometryId};
use crate::material::{Material, Texture, TextureId};

pub(crate) const EVICT_AFTER_FRAMES: u64 = 600;

pub(crate) struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    last_used: u64,
}

#[derive(Default)]
pub(crate) struct MeshStore {
    meshes: HashMap<GeometryId, GpuMesh>,
}

impl MeshStore {
    /// Upload `geometry` unless it is already resident, and mark it used.
    pub fn prepare(&mut self, device: &wgpu::Device, geometry: &Geometry, frame: u64) {
        if geometry.indices().is_empty() {
            return;
        }
        let mesh = self.meshes.entry(geometry.id()).or_insert_with(|| {
            log::debug!("uploading mesh '{}' ({} triangles)", geometry.label(), geometry.triangle_count());
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(geometry.label()),
                contents: bytemuck::cast_slice(geometry.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(geometry.label()),
                contents: bytemuck::cast_slice(geometry.indices()),
                usage: wgpu::BufferUsages::INDEX,
            });
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: geometry.indices().len() as u32,
                last_used: frame,
            }
        });
        mesh.last_used = frame;
    }

    pub fn get(&self, id: GeometryId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn evict_unused(&mut self, frame: u64) {
        let before = self.meshes.len();
        self.meshes.retain(|_, m| frame.saturating_sub(m.last_used) < EVICT_AFTER_FRAMES);
        let evicted = before - self.meshes.len();
        if evicted > 0 {
            log::debug!("evicted {evicted} unused meshes");
        }
    }
}

struct GpuTexture {
    view: wgpu::TextureView,
    last_used: u64,
}

pub(crate) struct TextureStore {
    textures: HashMap<TextureId, GpuTexture>,
    /// 1x1 white, bound when a material has no map.
    white: wgpu::TextureView,
}

impl TextureStore {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let white = upload(device, queue, "white", 1, 1, &[255, 255, 255, 255]);
        Self { textures: HashMap::new(), white }
    }

    /// Upload `texture` unless it is already resident, and mark it used.
    /// Textures larger than the device allows are scaled down first.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture, frame: u64) {
        if let Some(entry) = self.textures.get_mut(&texture.id()) {
            entry.last_used = frame;
            return;
        }

        let max = device.limits().max_texture_dimension_2d;
        let fitted = match texture.fit_within(max) {
            Ok(fitted) => fitted,
            Err(e) => {
                log::warn!("texture '{}' not uploaded: {e}", texture.label());
                return;
            }
        };
        if let Some(f) = &fitted {
            log::warn!(
                "texture '{}' is {}x{}, scaled to {}x{} for the device limit of {max}",
                texture.label(),
                texture.width(),
                texture.height(),
                f.width(),
                f.height()
            );
        }
        let source = fitted.as_ref().unwrap_or(texture);
        log::debug!("uploading texture '{}' ({}x{})", source.label(), source.width(), source.height());
        let view = upload(device, queue, source.label(), source.width(), source.height(), source.pixels());
        self.textures.insert(texture.id(), GpuTexture { view, last_used: frame });
    }

    /// The view for `texture`, or the white default.
    pub fn view(&self, texture: Option<&Texture>) -> &wgpu::TextureView {
        texture
            .and_then(|t| self.textures.get(&t.id()))
            .map(|t| &t.view)
            .unwrap_or(&self.white)
    }

    pub fn evict_unused(&mut self, frame: u64) {
        self.textures.retain(|_, t| frame.saturating_sub(t.last_used) < EVICT_AFTER_FRAMES);
    }
}

struct CachedMaterial<T> {
    material: Arc<Material>,
    value: T,
    last_used: u64,
}

/// Per-material values built once and reused while the material is drawn.
pub(crate) struct MaterialCache<T> {
    entries: HashMap<usize, CachedMaterial<T>>,
}

impl<T> Default for MaterialCache<T> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<T> MaterialCache<T> {
    /// Mark `material` used, building its value first if it has none.
    pub fn prepare(&mut self, material: &Arc<Material>, frame: u64, build: impl FnOnce(&Material) -> T) {
        let entry = self.entries.entry(material_key(material)).or_insert_with(|| CachedMaterial {
            material: Arc::clone(material),
            value: build(material),
            last_used: frame,
        });
        entry.last_used = frame;
    }

    pub fn get(&self, material: &Arc<Material>) -> Option<&T> {
        self.entries.get(&material_key(material)).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop entries unused for a while, and those only the cache still owns.
    pub fn evict_unused(&mut self, frame: u64) {
        self.entries.retain(|_, e| {
            frame.saturating_sub(e.last_used) < EVICT_AFTER_FRAMES && Arc::strong_count(&e.material) > 1
        });
    }
}

fn material_key(material: &Arc<Material>) -> usize {
    Arc::as_ptr(material) as usize
}

/// Uniform buffer plus color map and sampler for one material.
pub(crate) fn material_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    textures: &TextureStore,
    material: &Material,
) -> wgpu::BindGroup {
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("material buffer"),
        contents: bytemuck::bytes_of(&super::uniforms::material_uniform(material)),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(textures.view(material.map.as_deref())),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn upload(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, width: u32, height: u32, rgba: &[u8]) -> wgpu::TextureView {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
