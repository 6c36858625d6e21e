//! # Render — Renderer Target and Frame Plans
//!
//! The renderer is split in two. The [`RenderTarget`] is the part the rest
//! of the crate talks to: it knows the output size, the shadow settings and
//! the clear color, and on every [`render`](RenderTarget::render) it walks
//! the scene into a [`FramePlan`]. The plan is then handed to a
//! [`RenderBackend`], which only turns it into pixels.
//!
//! ```text
//!   Scene + camera node
//!          │
//!          ▼
//!   ┌──────────────┐   collect visible meshes and lights (DFS order)
//!   │ RenderTarget │   one ShadowPass per active casting light
//!   └──────┬───────┘   one color pass
//!          │ &FramePlan
//!          ▼
//!   ┌──────────────┐
//!   │ RenderBackend│   WgpuBackend: depth-only shadow passes, then a lit
//!   └──────────────┘   forward pass.  HeadlessBackend: records plans.
//! ```
//!
//! Everything the contract promises (which meshes occlude, which receive,
//! in what order, at what output size) is decided before the backend runs,
//! so it can be checked without a GPU.
//!
//! ## Comparison
//!
//! - **three.js**: `WebGLRenderer.render(scene, camera)` does collection,
//!   shadow map rendering and drawing in one call.
//! - **Bevy**: extraction into a render world plus phase items per view.
//!   The plan here is a much smaller version of the same idea.

mod headless;
mod plan;
mod target;

pub use headless::{FrameRecorder, HeadlessBackend};
pub use plan::{DrawItem, FramePlan, LightData, LightItem, ShadowPass, ViewData};
pub use target::{FrameStats, OutputSize, RenderTarget, ShadowFilter, ShadowSettings};

use crate::error::Result;

/// Turns frame plans into pixels.
pub trait RenderBackend {
    /// The output buffer changed size, in physical pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Execute one frame. Errors here are ones that skipping a frame cannot
    /// fix; transient surface loss is handled inside the backend.
    fn draw(&mut self, plan: &FramePlan) -> Result<()>;
}
