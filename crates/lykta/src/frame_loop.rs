//! # Frame Loop — One Tick per Display Refresh
//!
//! The loop is driven from outside: the host calls [`FrameLoop::tick`]
//! whenever its redraw primitive fires, and the tick ends by asking for the
//! next one. Nothing here blocks or sleeps.
//!
//! ```text
//!  host redraw ──► tick(stage, scheduler)
//!                    │
//!                    ├─ 0. attach delivered assets
//!                    ├─ 1. clock.tick()           → FrameTime
//!                    ├─ 2. animations(scene, time)
//!                    ├─ 3. controller.update(stage)
//!                    ├─ 4. target.render(scene, camera)
//!                    └─ 5. scheduler.schedule_next_frame() ──► host redraw …
//! ```
//!
//! [`FrameLoop::cancel`] is the only way out. A cancelled loop returns from
//! `tick` without rendering and without scheduling, so the chain of redraw
//! requests ends.
//!
//! ## Comparison
//!
//! - **three.js**: `renderer.setAnimationLoop(tick)` or a hand-written
//!   `requestAnimationFrame` chain with `Clock.getElapsedTime()`.
//! - **Bevy**: the `App` runner owns the loop; `Time` is a resource and
//!   animations are systems in `Update`.

use std::time::Instant;

use crate::clock::{FrameClock, FrameTime};
use crate::controls::CameraController;
use crate::error::Result;
use crate::render::FrameStats;
use crate::scene::Scene;
use crate::stage::Stage;

/// The host's "call me again next frame" primitive.
pub trait RedrawScheduler {
    fn schedule_next_frame(&mut self);
}

/// A time-driven animation. Should derive state from
/// [`FrameTime::elapsed`] so it runs at the same speed on any display.
pub type Animation = Box<dyn FnMut(&mut Scene, FrameTime)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Built, not ticked yet.
    Idle,
    Running,
    Cancelled,
}

pub struct FrameLoop {
    clock: FrameClock,
    animations: Vec<Animation>,
    controller: Option<Box<dyn CameraController>>,
    state: LoopState,
    last_stats: Option<FrameStats>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::with_clock(FrameClock::new())
    }

    pub fn with_clock(clock: FrameClock) -> Self {
        Self {
            clock,
            animations: Vec::new(),
            controller: None,
            state: LoopState::Idle,
            last_stats: None,
        }
    }

    pub fn with_animation(mut self, animation: impl FnMut(&mut Scene, FrameTime) + 'static) -> Self {
        self.add_animation(animation);
        self
    }

    pub fn with_controller(mut self, controller: impl CameraController + 'static) -> Self {
        self.set_controller(controller);
        self
    }

    /// Animations run in registration order.
    pub fn add_animation(&mut self, animation: impl FnMut(&mut Scene, FrameTime) + 'static) {
        self.animations.push(Box::new(animation));
    }

    /// Replace the camera controller.
    pub fn set_controller(&mut self, controller: impl CameraController + 'static) {
        self.controller = Some(Box::new(controller));
    }

    pub fn clear_controller(&mut self) {
        self.controller = None;
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == LoopState::Cancelled
    }

    /// Stats of the most recent rendered frame.
    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Stop the loop. Idempotent.
    pub fn cancel(&mut self) {
        if self.state != LoopState::Cancelled {
            log::info!("frame loop cancelled");
            self.state = LoopState::Cancelled;
        }
    }

    pub fn tick(&mut self, stage: &mut Stage, scheduler: &mut dyn RedrawScheduler) -> Result<Option<FrameStats>> {
        self.tick_at(stage, scheduler, Instant::now())
    }

    /// Run one tick as if the current time were `now`.
    ///
    /// Returns `None` if the loop is cancelled. On error the frame is
    /// abandoned and no next frame is scheduled; the host decides whether
    /// to retry or shut down.
    pub fn tick_at(
        &mut self,
        stage: &mut Stage,
        scheduler: &mut dyn RedrawScheduler,
        now: Instant,
    ) -> Result<Option<FrameStats>> {
        match self.state {
            LoopState::Cancelled => return Ok(None),
            LoopState::Idle => {
                log::info!("frame loop started");
                self.clock.start_at(now);
                self.state = LoopState::Running;
            }
            LoopState::Running => {}
        }

        let report = stage.assets.attach_pending(&mut stage.scene);
        if report.attached + report.failed + report.dropped > 0 {
            log::debug!(
                "assets: {} attached, {} failed, {} dropped",
                report.attached,
                report.failed,
                report.dropped
            );
        }

        let time = self.clock.tick_at(now);
        for animation in &mut self.animations {
            animation(&mut stage.scene, time);
        }
        if let Some(controller) = &mut self.controller {
            controller.update(stage)?;
        }
        stage.input.end_frame();

        let stats = stage.render()?;
        self.last_stats = Some(stats);
        scheduler.schedule_next_frame();
        Ok(Some(stats))
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::geometry::Geometry;
    use crate::material::Material;
    use crate::math::Vec3;
    use crate::scene::{Mesh, Node};

    #[derive(Default)]
    struct CountingScheduler(u32);

    impl RedrawScheduler for CountingScheduler {
        fn schedule_next_frame(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn animation_uses_elapsed_time() {
        let (mut stage, recorder) = Stage::headless(800, 600).unwrap();
        let cube = stage.scene.spawn(Node::mesh(
            "cube",
            Mesh::new(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0)), Arc::new(Material::default())),
        ));
        let mut frame_loop = FrameLoop::new().with_animation(move |scene, time| {
            if let Some(node) = scene.get_mut(cube) {
                node.transform.set_euler(0.0, time.elapsed_secs(), 0.0);
            }
        });
        let mut scheduler = CountingScheduler::default();

        let t0 = Instant::now();
        frame_loop.tick_at(&mut stage, &mut scheduler, t0).unwrap();
        frame_loop.tick_at(&mut stage, &mut scheduler, t0 + Duration::from_millis(500)).unwrap();

        let yaw = stage.scene.node(cube).unwrap().transform.euler().y;
        assert!((yaw - 0.5).abs() < 1e-4);
        assert_eq!(recorder.frames(), 2);
        assert_eq!(scheduler.0, 2);
        assert_eq!(frame_loop.state(), LoopState::Running);
    }

    #[test]
    fn cancelled_loop_neither_renders_nor_schedules() {
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        let mut frame_loop = FrameLoop::new();
        let mut scheduler = CountingScheduler::default();

        frame_loop.tick(&mut stage, &mut scheduler).unwrap();
        frame_loop.cancel();
        frame_loop.cancel();
        assert_eq!(frame_loop.tick(&mut stage, &mut scheduler).unwrap(), None);
        assert_eq!(recorder.frames(), 1);
        assert_eq!(scheduler.0, 1);
    }

    #[test]
    fn controller_runs_before_render() {
        struct Recorder(Rc<Cell<u32>>);
        impl CameraController for Recorder {
            fn update(&mut self, stage: &mut Stage) -> Result<()> {
                self.0.set(self.0.get() + 1);
                stage.scene.place_looking_at(stage.camera, Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO)
            }
        }

        let calls = Rc::new(Cell::new(0));
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        let mut frame_loop = FrameLoop::new().with_controller(Recorder(Rc::clone(&calls)));
        frame_loop.tick(&mut stage, &mut CountingScheduler::default()).unwrap();

        assert_eq!(calls.get(), 1);
        let plan = recorder.last().unwrap();
        assert!(plan.view.position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-6));
    }

    #[test]
    fn assets_attach_at_start_of_tick() {
        let (mut stage, recorder) = Stage::headless(64, 64).unwrap();
        let mesh = stage.scene.spawn(Node::mesh("late", Mesh::pending()));
        let mut frame_loop = FrameLoop::new();
        let mut scheduler = CountingScheduler::default();

        frame_loop.tick(&mut stage, &mut scheduler).unwrap();
        assert_eq!(recorder.last().unwrap().draws.len(), 0);

        let sender = stage.assets.sender();
        sender.send(mesh, "cube", crate::assets::Payload::Geometry(Arc::new(Geometry::cuboid(1.0, 1.0, 1.0))));
        sender.send(mesh, "mat", crate::assets::Payload::Material(Arc::new(Material::default())));
        frame_loop.tick(&mut stage, &mut scheduler).unwrap();
        assert_eq!(recorder.last().unwrap().draws.len(), 1);
    }
}
