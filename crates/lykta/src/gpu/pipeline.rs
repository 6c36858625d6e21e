//! # Pipeline — Lit and Shadow Pipelines, and Their GPU Resources
//!
//! Two render pipelines share one vertex format and one model layout:
//!
//! - **shadow**: depth only, no fragment stage. Renders occluders from a
//!   light into one layer of the shadow map array. Hardware depth bias is
//!   applied here, the per-light bias in the lit shader.
//! - **lit**: the color pass. Four bind groups ordered by change frequency
//!   (camera, lights + shadow maps, material, model).
//!
//! ## Shadow Map Array
//!
//! All shadow maps live in one `Depth32Float` 2D array texture with
//! [`MAX_SHADOW_MAPS`] layers, so the lit shader binds a single
//! `texture_depth_2d_array` and a comparison sampler. Every layer has the
//! size of the largest map requested this frame; the array is recreated
//! when that size changes.
//!
//! ## Dynamic Uniform Buffers
//!
//! Per-object model matrices and per-light shadow views each live in one
//! large uniform buffer. Entries sit at `min_uniform_buffer_offset_alignment`
//! strides and each draw passes its byte offset.

use wgpu::util::DeviceExt;

use super::uniforms::{CameraUniform, LightsUniform, MAX_SHADOW_MAPS, ModelUniform, ShadowViewUniform};
use super::GpuContext;
use crate::geometry::Vertex;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
const POSITION_ATTRIBUTE: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// `Vertex`: position, normal, uv at locations 0, 1, 2.
pub(crate) const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &VERTEX_ATTRIBUTES,
};

/// Same buffer, position only.
const SHADOW_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &POSITION_ATTRIBUTE,
};

/// A growable dynamic-offset uniform buffer and its bind group.
pub(crate) struct DynamicUniforms {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub stride: u32,
    capacity: usize,
    entry_size: u64,
    label: &'static str,
}

impl DynamicUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, entry_size: u64, label: &'static str) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = align_up(entry_size, align) as u32;
        let capacity = 64;
        let (buffer, bind_group) = create_dynamic_buffer(device, layout, stride, capacity, entry_size, label);
        Self { buffer, bind_group, stride, capacity, entry_size, label }
    }

    /// Grow to hold at least `count` entries.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, count: usize) {
        if count > self.capacity {
            let capacity = count.next_power_of_two();
            let (buffer, bind_group) =
                create_dynamic_buffer(device, layout, self.stride, capacity, self.entry_size, self.label);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
            log::debug!("{} grown to {capacity} entries", self.label);
        }
    }

    /// Write `entries` at consecutive strides starting at offset 0.
    pub fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, entries: &[T]) {
        if entries.is_empty() {
            return;
        }
        let stride = self.stride as usize;
        let mut data = vec![0u8; stride * entries.len()];
        for (i, entry) in entries.iter().enumerate() {
            let bytes = bytemuck::bytes_of(entry);
            data[i * stride..i * stride + bytes.len()].copy_from_slice(bytes);
        }
        queue.write_buffer(&self.buffer, 0, &data);
    }

    pub fn offset(&self, index: usize) -> u32 {
        index as u32 * self.stride
    }
}

/// All long-lived GPU resources of the [`WgpuBackend`](super::WgpuBackend).
pub(crate) struct Pipelines {
    pub lit: wgpu::RenderPipeline,
    pub shadow: wgpu::RenderPipeline,

    pub lights_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pub model_layout: wgpu::BindGroupLayout,
    pub shadow_view_layout: wgpu::BindGroupLayout,

    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,
    pub lights_buffer: wgpu::Buffer,
    pub lights_bind_group: wgpu::BindGroup,

    pub color_sampler: wgpu::Sampler,
    pub shadow_sampler: wgpu::Sampler,

    pub depth_view: wgpu::TextureView,
    pub depth_size: (u32, u32),

    pub shadow_array: ShadowArray,

    pub models: DynamicUniforms,
    pub shadow_views: DynamicUniforms,
}

/// The shadow map texture array and a render view per layer.
pub(crate) struct ShadowArray {
    pub size: u32,
    pub array_view: wgpu::TextureView,
    pub layer_views: Vec<wgpu::TextureView>,
}

impl Pipelines {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        // ── Shaders ─────────────────────────────────────────────────────
        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("lit.wgsl").into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
        });

        // ── Bind group layouts ──────────────────────────────────────────
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false, None)],
        });

        let lights_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lights layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false, None),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false, None),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let model_size = std::mem::size_of::<ModelUniform>() as u64;
        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true, Some(model_size))],
        });

        let shadow_view_size = std::mem::size_of::<ShadowViewUniform>() as u64;
        let shadow_view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow view layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, true, Some(shadow_view_size))],
        });

        // ── Pipelines ───────────────────────────────────────────────────
        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lit pipeline layout"),
            bind_group_layouts: &[&camera_layout, &lights_layout, &material_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let lit = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lit pipeline"),
            layout: Some(&lit_layout),
            vertex: wgpu::VertexState {
                module: &lit_shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &lit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow pipeline layout"),
            bind_group_layouts: &[&shadow_view_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let shadow = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow pipeline"),
            layout: Some(&shadow_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_main"),
                buffers: &[SHADOW_VERTEX_LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState { constant: 2, slope_scale: 2.0, clamp: 0.0 },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Per-frame buffers ───────────────────────────────────────────
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::bytes_of(&<CameraUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights buffer"),
            contents: bytemuck::bytes_of(&<LightsUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // ── Samplers ────────────────────────────────────────────────────
        let color_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("color sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        // ── Render targets ──────────────────────────────────────────────
        let (w, h) = gpu.surface_size();
        let depth_view = create_depth_texture(device, w, h);
        let shadow_array = ShadowArray::new(device, 1);
        let lights_bind_group =
            create_lights_bind_group(device, &lights_layout, &lights_buffer, &shadow_array, &shadow_sampler);

        let models = DynamicUniforms::new(device, &model_layout, model_size, "model dynamic buffer");
        let shadow_views =
            DynamicUniforms::new(device, &shadow_view_layout, shadow_view_size, "shadow view dynamic buffer");

        Self {
            lit,
            shadow,
            lights_layout,
            material_layout,
            model_layout,
            shadow_view_layout,
            camera_buffer,
            camera_bind_group,
            lights_buffer,
            lights_bind_group,
            color_sampler,
            shadow_sampler,
            depth_view,
            depth_size: (w, h),
            shadow_array,
            models,
            shadow_views,
        }
    }

    /// Recreate the depth texture if the output size changed.
    pub fn resize_depth_if_needed(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) != self.depth_size && width > 0 && height > 0 {
            self.depth_view = create_depth_texture(device, width, height);
            self.depth_size = (width, height);
        }
    }

    /// Recreate the shadow array at `size` if it differs, and rebind it.
    pub fn resize_shadow_array_if_needed(&mut self, device: &wgpu::Device, size: u32) {
        if size != self.shadow_array.size {
            log::debug!("shadow maps resized to {size}x{size}");
            self.shadow_array = ShadowArray::new(device, size);
            self.lights_bind_group = create_lights_bind_group(
                device,
                &self.lights_layout,
                &self.lights_buffer,
                &self.shadow_array,
                &self.shadow_sampler,
            );
        }
    }
}

impl ShadowArray {
    fn new(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow map array"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: MAX_SHADOW_MAPS as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("shadow map array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let layer_views = (0..MAX_SHADOW_MAPS as u32)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some("shadow map layer"),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();
        Self { size, array_view, layer_views }
    }
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    has_dynamic_offset: bool,
    min_size: Option<u64>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset,
            min_binding_size: min_size.and_then(wgpu::BufferSize::new),
        },
        count: None,
    }
}

fn create_lights_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    shadows: &ShadowArray,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lights bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadows.array_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_dynamic_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u32,
    capacity: usize,
    entry_size: u64,
    label: &'static str,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: stride as u64 * capacity as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(entry_size),
            }),
        }],
    });
    (buffer, bind_group)
}

/// Round `value` up to the next multiple of `align` (a power of two).
pub(crate) fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(144, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(64, 64), 64);
    }

    #[test]
    fn vertex_layout_matches_vertex() {
        assert_eq!(VERTEX_LAYOUT.array_stride, 32);
        assert_eq!(VERTEX_LAYOUT.attributes.len(), 3);
        assert_eq!(VERTEX_LAYOUT.attributes[2].offset, 24);
        assert_eq!(SHADOW_VERTEX_LAYOUT.array_stride, VERTEX_LAYOUT.array_stride);
    }
}
