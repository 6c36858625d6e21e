//! # Lykta — Scene Graph and Render Loop
//!
//! A small real-time 3D core: a node hierarchy with cameras, meshes and
//! lights, a renderer target that turns the scene into frame plans (with
//! shadow passes), and the loop machinery around it: a frame clock, a
//! resize reconciler, camera controllers and a parameter panel.
//!
//! ```text
//!            ┌─────────────────────── Stage ───────────────────────┐
//!  winit ──► │ InputState   Scene ─ Camera   RenderTarget ─ backend │
//!  events    │ SurfaceState           AssetInbox ◄── loader threads │
//!            └────────▲──────────────────▲─────────────────────────┘
//!                     │                  │
//!             ResizeReconciler       FrameLoop (animations,
//!                                    controller, render)
//! ```
//!
//! Start with `use lykta::prelude::*`. [`viewer::Viewer`] opens a window;
//! [`stage::Stage::headless`] gives the same stage without a GPU.

pub mod assets;
pub mod camera;
pub mod clock;
pub mod config;
pub mod controls;
pub mod error;
pub mod frame_loop;
pub mod geometry;
pub mod gpu;
pub mod helpers;
pub mod input;
pub mod light;
pub mod logging;
pub mod material;
pub mod math;
pub mod panel;
pub mod prelude;
pub mod render;
pub mod resize;
pub mod scene;
pub mod stage;
pub mod surface;
pub mod viewer;

pub use error::{Error, Result};
