//! A backend with no GPU. It keeps the last few frame plans and every
//! resize it was asked to do, for tests and off-screen runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{FramePlan, RenderBackend};
use crate::error::Result;

/// Plans kept by default.
const DEFAULT_CAPACITY: usize = 8;

#[derive(Debug, Default)]
struct Recording {
    plans: VecDeque<FramePlan>,
    capacity: usize,
    resizes: Vec<(u32, u32)>,
    frames: u64,
}

/// Shared read handle onto what a [`HeadlessBackend`] received.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    inner: Rc<RefCell<Recording>>,
}

impl FrameRecorder {
    /// The most recent plan.
    pub fn last(&self) -> Option<FramePlan> {
        self.inner.borrow().plans.back().cloned()
    }

    /// Retained plans, oldest first.
    pub fn plans(&self) -> Vec<FramePlan> {
        self.inner.borrow().plans.iter().cloned().collect()
    }

    /// Total frames drawn, including ones no longer retained.
    pub fn frames(&self) -> u64 {
        self.inner.borrow().frames
    }

    /// Every physical size the backend was resized to, in order.
    pub fn resizes(&self) -> Vec<(u32, u32)> {
        self.inner.borrow().resizes.clone()
    }
}

pub struct HeadlessBackend {
    recording: Rc<RefCell<Recording>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Keep at most `capacity` plans (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recording: Rc::new(RefCell::new(Recording {
                capacity: capacity.max(1),
                ..Recording::default()
            })),
        }
    }

    pub fn recorder(&self) -> FrameRecorder {
        FrameRecorder { inner: Rc::clone(&self.recording) }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        log::debug!("headless resize to {width}x{height}");
        self.recording.borrow_mut().resizes.push((width, height));
    }

    fn draw(&mut self, plan: &FramePlan) -> Result<()> {
        let mut rec = self.recording.borrow_mut();
        if rec.plans.len() == rec.capacity {
            rec.plans.pop_front();
        }
        rec.plans.push_back(plan.clone());
        rec.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::render::RenderTarget;
    use crate::scene::{Node, Scene};
    use crate::surface::SurfaceState;

    #[test]
    fn keeps_only_recent_plans() {
        let backend = HeadlessBackend::with_capacity(2);
        let recorder = backend.recorder();
        let surface = SurfaceState::new(64, 64, 1.0, 2.0).unwrap();
        let mut target = RenderTarget::new(Box::new(backend), &surface);

        let mut scene = Scene::new();
        let cam = scene.spawn(Node::camera("cam", Camera::default()));
        for _ in 0..5 {
            target.render(&scene, cam).unwrap();
        }

        assert_eq!(recorder.frames(), 5);
        let frames: Vec<u64> = recorder.plans().iter().map(|p| p.frame).collect();
        assert_eq!(frames, vec![3, 4]);
    }
}
