use serde::{Deserialize, Serialize};

use super::plan::{self, PlanSettings};
use super::RenderBackend;
use crate::error::Result;
use crate::math::Color;
use crate::scene::{NodeId, Scene};
use crate::surface::{self, SurfaceState};

/// How shadow map lookups are filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowFilter {
    /// One comparison per fragment. Hard, aliased edges.
    Basic,
    /// 3×3 percentage-closer filtering.
    #[default]
    Pcf,
    /// PCF with the kernel scaled by each light's blur radius.
    PcfSoft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub filter: ShadowFilter,
}

/// Logical output size and the pixel ratio it is rendered at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl OutputSize {
    /// Framebuffer size in physical pixels.
    pub fn physical(&self) -> (u32, u32) {
        surface::physical_size(self.width, self.height, self.pixel_ratio)
    }
}

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub draw_calls: usize,
    pub lights: usize,
    pub shadow_passes: usize,
}

/// Binds a backend to an output size and renders scene/camera pairs.
pub struct RenderTarget {
    backend: Box<dyn RenderBackend>,
    output: OutputSize,
    shadows: ShadowSettings,
    clear_color: Color,
    frames: u64,
}

impl RenderTarget {
    /// Size the output from `surface` and tell the backend.
    pub fn new(mut backend: Box<dyn RenderBackend>, surface: &SurfaceState) -> Self {
        let output = OutputSize {
            width: surface.width(),
            height: surface.height(),
            pixel_ratio: surface.pixel_ratio(),
        };
        let (pw, ph) = output.physical();
        backend.resize(pw, ph);
        Self {
            backend,
            output,
            shadows: ShadowSettings::default(),
            clear_color: Color::BLACK,
            frames: 0,
        }
    }

    pub fn output_size(&self) -> OutputSize {
        self.output
    }

    /// Resize the output buffer. The backend is only told when the physical
    /// size actually changes. Returns whether the output changed.
    pub fn set_size(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<bool> {
        surface::validate_size(width, height)?;
        surface::validate_ratio(pixel_ratio)?;
        let next = OutputSize { width, height, pixel_ratio };
        if next == self.output {
            return Ok(false);
        }
        let physical_changed = next.physical() != self.output.physical();
        self.output = next;
        if physical_changed {
            let (pw, ph) = next.physical();
            self.backend.resize(pw, ph);
        }
        Ok(true)
    }

    pub fn shadows(&self) -> ShadowSettings {
        self.shadows
    }

    /// Master switch for shadow passes. Lights keep their own descriptors
    /// either way.
    pub fn set_shadows_enabled(&mut self, enabled: bool) {
        self.shadows.enabled = enabled;
    }

    pub fn set_shadow_filter(&mut self, filter: ShadowFilter) {
        self.shadows.filter = filter;
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render `scene` through the camera node `camera`.
    ///
    /// Uses the camera's cached projection; see
    /// [`Camera::update_projection`](crate::camera::Camera::update_projection).
    pub fn render(&mut self, scene: &Scene, camera: NodeId) -> Result<FrameStats> {
        let plan = plan::build(
            scene,
            camera,
            PlanSettings {
                frame: self.frames,
                output: self.output,
                clear_color: self.clear_color,
                shadows_enabled: self.shadows.enabled,
                shadow_filter: self.shadows.filter,
            },
        )?;
        self.backend.draw(&plan)?;
        self.frames += 1;
        Ok(FrameStats {
            frame: plan.frame,
            draw_calls: plan.draws.len(),
            lights: plan.lights.len(),
            shadow_passes: plan.shadow_passes.len(),
        })
    }
}
