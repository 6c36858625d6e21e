//! # GPU — wgpu Backend
//!
//! [`WgpuBackend`] executes a [`FramePlan`] on a window surface. One frame is:
//!
//! ```text
//!   upload new meshes / textures / material bind groups (cached)
//!   write camera, lights, model and shadow-view uniforms
//!   for each shadow pass with a layer:
//!       depth-only pass into shadow_array[layer], occluders only
//!   color pass: clear, then every draw with its material and model offset
//!   submit, present
//! ```
//!
//! The GPU path has fixed capacities: 8 lights and 4 shadow maps per
//! frame. Anything past that is dropped from the frame, with one warning
//! per backend.
//!
//! ## Surface Errors
//!
//! | Error               | Action                                   |
//! |---------------------|------------------------------------------|
//! | `Lost` / `Outdated` | reconfigure, skip the frame              |
//! | `OutOfMemory`       | return [`Error::Backend`]                |
//! | anything else       | warn, skip the frame                     |

mod context;
mod pipeline;
mod store;
mod uniforms;

pub use context::GpuContext;

use std::sync::Arc;

use winit::window::Window;

use crate::error::{Error, Result};
use crate::render::{FramePlan, RenderBackend};
use pipeline::Pipelines;
use store::{MaterialCache, MeshStore, TextureStore};
use uniforms::{MAX_LIGHTS, MAX_SHADOW_MAPS, ModelUniform, ShadowViewUniform};

/// Renders frame plans with wgpu.
pub struct WgpuBackend {
    gpu: GpuContext,
    pipelines: Pipelines,
    meshes: MeshStore,
    textures: TextureStore,
    materials: MaterialCache<wgpu::BindGroup>,
    warned_limits: bool,
}

impl WgpuBackend {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let gpu = GpuContext::new(window)?;
        let pipelines = Pipelines::new(&gpu);
        let textures = TextureStore::new(&gpu.device, &gpu.queue);
        Ok(Self {
            gpu,
            pipelines,
            meshes: MeshStore::default(),
            textures,
            materials: MaterialCache::default(),
            warned_limits: false,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.gpu
    }

    fn upload(&mut self, plan: &FramePlan) {
        let device = &self.gpu.device;
        for draw in &plan.draws {
            self.meshes.prepare(device, &draw.geometry, plan.frame);
            if let Some(map) = &draw.material.map {
                self.textures.prepare(device, &self.gpu.queue, map, plan.frame);
            }
            let (textures, pipelines) = (&self.textures, &self.pipelines);
            self.materials.prepare(&draw.material, plan.frame, |material| {
                store::material_bind_group(
                    device,
                    &pipelines.material_layout,
                    &pipelines.color_sampler,
                    textures,
                    material,
                )
            });
        }
        self.meshes.evict_unused(plan.frame);
        self.textures.evict_unused(plan.frame);
        self.materials.evict_unused(plan.frame);
    }

    fn warn_limits_once(&mut self, plan: &FramePlan) {
        if self.warned_limits {
            return;
        }
        if plan.lights.len() > MAX_LIGHTS {
            log::warn!("{} lights in frame, only the first {MAX_LIGHTS} are drawn", plan.lights.len());
            self.warned_limits = true;
        }
        if plan.shadow_passes.len() > MAX_SHADOW_MAPS {
            log::warn!(
                "{} shadow-casting lights in frame, only the first {MAX_SHADOW_MAPS} get shadow maps",
                plan.shadow_passes.len()
            );
            self.warned_limits = true;
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.pipelines.resize_depth_if_needed(&self.gpu.device, width, height);
    }

    fn draw(&mut self, plan: &FramePlan) -> Result<()> {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(Error::Backend("GPU out of memory".into()));
            }
            Err(e) => {
                log::warn!("surface error: {e:?}");
                return Ok(());
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.pipelines
            .resize_depth_if_needed(&self.gpu.device, output.texture.width(), output.texture.height());

        self.warn_limits_once(plan);
        self.upload(plan);

        // ── Uniforms ────────────────────────────────────────────────────
        let device = &self.gpu.device;
        let queue = &self.gpu.queue;
        let layers = uniforms::assign_shadow_layers(plan);
        let shadow_size = uniforms::shadow_array_size(plan, device.limits().max_texture_dimension_2d);
        self.pipelines.resize_shadow_array_if_needed(device, shadow_size);

        queue.write_buffer(
            &self.pipelines.camera_buffer,
            0,
            bytemuck::bytes_of(&uniforms::camera_uniform(plan)),
        );
        queue.write_buffer(
            &self.pipelines.lights_buffer,
            0,
            bytemuck::bytes_of(&uniforms::lights_uniform(plan, &layers, shadow_size)),
        );

        let models: Vec<ModelUniform> = plan
            .draws
            .iter()
            .map(|d| uniforms::model_uniform(d.model, d.receive_shadow))
            .collect();
        self.pipelines
            .models
            .ensure_capacity(device, &self.pipelines.model_layout, models.len());
        self.pipelines.models.write(queue, &models);

        let shadow_views: Vec<ShadowViewUniform> = plan
            .shadow_passes
            .iter()
            .take(MAX_SHADOW_MAPS)
            .map(|p| ShadowViewUniform { view_proj: p.view_projection.to_cols_array_2d() })
            .collect();
        self.pipelines
            .shadow_views
            .ensure_capacity(device, &self.pipelines.shadow_view_layout, shadow_views.len());
        self.pipelines.shadow_views.write(queue, &shadow_views);

        let mut encoder = self.gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        });
        let p = &self.pipelines;

        // ── Shadow passes ───────────────────────────────────────────────
        for (i, pass) in plan.shadow_passes.iter().enumerate() {
            let Some(layer) = layers[i] else { continue };
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &p.shadow_array.layer_views[layer as usize],
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&p.shadow);
            rpass.set_bind_group(0, &p.shadow_views.bind_group, &[p.shadow_views.offset(i)]);
            for &index in &pass.occluders {
                let Some(mesh) = self.meshes.get(plan.draws[index].geometry.id()) else {
                    continue;
                };
                rpass.set_bind_group(1, &p.models.bind_group, &[p.models.offset(index)]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        // ── Color pass ──────────────────────────────────────────────────
        {
            let c = plan.clear_color;
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("color pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: c.r as f64,
                            g: c.g as f64,
                            b: c.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &p.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&p.lit);
            rpass.set_bind_group(0, &p.camera_bind_group, &[]);
            rpass.set_bind_group(1, &p.lights_bind_group, &[]);
            let mut bound_material: Option<&Arc<_>> = None;
            for (index, draw) in plan.draws.iter().enumerate() {
                let mesh = self.meshes.get(draw.geometry.id());
                let material = self.materials.get(&draw.material);
                let (Some(mesh), Some(material)) = (mesh, material) else {
                    continue;
                };
                if !bound_material.is_some_and(|m| Arc::ptr_eq(m, &draw.material)) {
                    rpass.set_bind_group(2, material, &[]);
                    bound_material = Some(&draw.material);
                }
                rpass.set_bind_group(3, &p.models.bind_group, &[p.models.offset(index)]);
                rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
