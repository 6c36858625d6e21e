//! Convenience re-exports: `use lykta::prelude::*` for the common items.

pub use std::sync::Arc;

pub use crate::assets::{AssetInbox, AssetSender, Payload};
pub use crate::camera::{Camera, Projection};
pub use crate::clock::{FrameClock, FrameTime};
pub use crate::config::ViewerConfig;
pub use crate::controls::{CameraController, CursorOrbit, OrbitControls};
pub use crate::error::{Error, Result};
pub use crate::frame_loop::{FrameLoop, RedrawScheduler};
pub use crate::geometry::Geometry;
pub use crate::helpers::spawn_axes;
pub use crate::input::{InputState, KeyCode, MouseButton};
pub use crate::light::{Light, LightKind, ShadowDescriptor, ShadowFrustum};
pub use crate::material::{Material, Shading, Texture};
pub use crate::math::{Color, Mat4, Quat, Transform, Vec2, Vec3};
pub use crate::panel::{ParamKind, ParamValue, ParameterPanel};
pub use crate::render::{FrameRecorder, RenderBackend, RenderTarget, ShadowFilter};
pub use crate::resize::{ResizeEvent, ResizeReconciler};
pub use crate::scene::{Mesh, Node, NodeId, NodeKind, Scene};
pub use crate::stage::Stage;
pub use crate::viewer::Viewer;
