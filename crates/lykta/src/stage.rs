//! The [`Stage`]: all mutable state of one viewer, in one place.
//!
//! The frame loop, the resize reconciler and the camera controllers all
//! take `&mut Stage`. There are no globals, so whichever of them runs owns
//! every piece of state it touches for that call.

use crate::assets::AssetInbox;
use crate::camera::Camera;
use crate::error::Result;
use crate::input::InputState;
use crate::render::{FrameRecorder, FrameStats, HeadlessBackend, RenderBackend, RenderTarget};
use crate::scene::{Node, NodeId, Scene};
use crate::surface::{DEFAULT_MAX_PIXEL_RATIO, SurfaceState};

pub struct Stage {
    pub scene: Scene,
    /// The scene node whose camera renders each frame.
    pub camera: NodeId,
    pub target: RenderTarget,
    pub surface: SurfaceState,
    pub input: InputState,
    pub assets: AssetInbox,
}

impl Stage {
    /// Bind `scene` and its camera node to a render target. The camera node
    /// may be detached from the tree; it only has to exist.
    ///
    /// The camera's aspect is set from the surface and its projection
    /// updated, so the first frame is correct without further calls.
    pub fn new(mut scene: Scene, camera: NodeId, target: RenderTarget, surface: SurfaceState) -> Result<Self> {
        let cam = scene.camera_mut(camera)?;
        cam.set_aspect(surface.aspect())?;
        cam.update_projection();

        Ok(Self {
            scene,
            camera,
            target,
            input: InputState::new((surface.width(), surface.height())),
            surface,
            assets: AssetInbox::new(),
        })
    }

    /// A stage with an empty scene, one default camera at the origin named
    /// `"camera"`, and a headless backend. Handy for tests and tools.
    pub fn headless(width: u32, height: u32) -> Result<(Self, FrameRecorder)> {
        let backend = HeadlessBackend::new();
        let recorder = backend.recorder();
        let stage = Self::with_backend(Box::new(backend), width, height, 1.0)?;
        Ok((stage, recorder))
    }

    /// Like [`headless`](Self::headless) but with any backend.
    pub fn with_backend(backend: Box<dyn RenderBackend>, width: u32, height: u32, pixel_ratio: f32) -> Result<Self> {
        let surface = SurfaceState::new(width, height, pixel_ratio, DEFAULT_MAX_PIXEL_RATIO)?;
        let target = RenderTarget::new(backend, &surface);
        let mut scene = Scene::new();
        let camera = scene.spawn(Node::camera("camera", Camera::default()));
        Self::new(scene, camera, target, surface)
    }

    pub fn camera(&self) -> Result<&Camera> {
        self.scene.camera(self.camera)
    }

    pub fn camera_mut(&mut self) -> Result<&mut Camera> {
        self.scene.camera_mut(self.camera)
    }

    /// Render one frame outside the frame loop.
    pub fn render(&mut self) -> Result<FrameStats> {
        self.target.render(&self.scene, self.camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn new_syncs_camera_aspect() {
        let (stage, _) = Stage::headless(800, 600).unwrap();
        let cam = stage.camera().unwrap();
        assert!((cam.aspect() - 800.0 / 600.0).abs() < 1e-6);
        assert!(!cam.needs_update());
    }

    #[test]
    fn new_checks_camera_node() {
        let surface = SurfaceState::new(10, 10, 1.0, 2.0).unwrap();
        let mut scene = Scene::new();
        let group = scene.spawn(Node::group("group"));
        let target = RenderTarget::new(Box::new(HeadlessBackend::new()), &surface);
        assert!(matches!(Stage::new(scene, group, target, surface), Err(Error::WrongKind { .. })));

        let mut scene = Scene::new();
        let cam = scene.spawn_detached(Node::camera("cam", Camera::default()));
        let target = RenderTarget::new(Box::new(HeadlessBackend::new()), &surface);
        assert!(Stage::new(scene, cam, target, surface).is_ok());
    }

    #[test]
    fn render_counts_frames() {
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        stage.render().unwrap();
        stage.render().unwrap();
        assert_eq!(recorder.frames(), 2);
    }
}
