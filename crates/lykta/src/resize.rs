//! # Resize — Keeping Camera and Output in Step with the Surface
//!
//! When the host window changes size (or moves to a display with another
//! pixel density) three things must agree again before the next frame:
//!
//! ```text
//!  ResizeEvent (w, h, ratio)
//!     │
//!     ├─ validate: w > 0, h > 0, ratio finite and > 0
//!     ├─ clamp ratio to the surface ceiling (default 2)
//!     ├─ surface state + pointer viewport
//!     │
//!     ├─ 1. camera.aspect = w / h
//!     ├─ 2. camera.update_projection()
//!     └─ 3. target.set_size(w, h, clamped ratio)
//! ```
//!
//! The order is fixed. Resizing the output before the projection is updated
//! would let one frame present the new size with the old aspect.
//!
//! Every event is handled synchronously and completely. There is no
//! debouncing; a repeated identical event recomputes the same values and
//! reports [`ResizeOutcome::Unchanged`].

use crate::error::Result;
use crate::stage::Stage;
use crate::surface;

/// A host surface-size change, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    pub width: u32,
    pub height: u32,
    /// Raw device pixel ratio, before clamping.
    pub pixel_ratio: f32,
}

impl ResizeEvent {
    pub fn new(width: u32, height: u32, pixel_ratio: f32) -> Self {
        Self { width, height, pixel_ratio }
    }

    /// From a window's physical size and scale factor. The logical size is
    /// rounded to the nearest pixel and never drops below 1, so any window
    /// that has pixels at all produces a valid event.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let logical = |px: u32| ((px as f64 / scale_factor).round() as u32).max(1);
        Self::new(logical(width), logical(height), scale_factor as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    /// Nothing observable changed.
    Unchanged,
    Resized { width: u32, height: u32, pixel_ratio: f32 },
}

/// Applies [`ResizeEvent`]s to a [`Stage`].
#[derive(Debug, Default)]
pub struct ResizeReconciler {
    handled: u64,
}

impl ResizeReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events handled so far, including unchanged ones.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Apply one event. On error nothing has been modified.
    pub fn reconcile(&mut self, stage: &mut Stage, event: ResizeEvent) -> Result<ResizeOutcome> {
        let ResizeEvent { width, height, pixel_ratio } = event;
        surface::validate_size(width, height)?;
        surface::validate_ratio(pixel_ratio)?;
        let ratio = stage.surface.clamp_ratio(pixel_ratio);
        let aspect = width as f32 / height as f32;
        // Fails early, before anything is touched, if the camera node is gone.
        stage.camera()?;

        let surface_changed = stage.surface.update(width, height, pixel_ratio)?;
        stage.input.set_viewport(width, height);

        let camera = stage.camera_mut()?;
        let aspect_changed = camera.aspect() != aspect;
        camera.set_aspect(aspect)?;
        camera.update_projection();

        let output_changed = stage.target.set_size(width, height, ratio)?;

        self.handled += 1;
        if surface_changed || aspect_changed || output_changed {
            log::debug!("resized to {width}x{height} @{ratio} (requested @{pixel_ratio})");
            Ok(ResizeOutcome::Resized { width, height, pixel_ratio: ratio })
        } else {
            Ok(ResizeOutcome::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn aspect_output_and_ratio_updated_in_one_call() {
        let (mut stage, recorder) = Stage::headless(800, 600).unwrap();
        let mut reconciler = ResizeReconciler::new();

        let outcome = reconciler.reconcile(&mut stage, ResizeEvent::new(1280, 720, 3.0)).unwrap();
        assert_eq!(outcome, ResizeOutcome::Resized { width: 1280, height: 720, pixel_ratio: 2.0 });

        let cam = stage.camera().unwrap();
        assert!((cam.aspect() - 1280.0 / 720.0).abs() < 1e-6);
        assert!(!cam.needs_update());
        assert_eq!(stage.target.output_size().physical(), (2560, 1440));
        assert_eq!(recorder.resizes().last(), Some(&(2560, 1440)));
        assert_eq!(stage.input.viewport(), (1280, 720));
    }

    #[test]
    fn physical_sizes_convert_to_valid_events() {
        assert_eq!(ResizeEvent::from_physical(1600, 1200, 2.0), ResizeEvent::new(800, 600, 2.0));
        assert_eq!(ResizeEvent::from_physical(1001, 600, 2.0).width, 501);
        assert_eq!(ResizeEvent::from_physical(1000, 750, 1.25), ResizeEvent::new(800, 600, 1.25));

        let (mut stage, _recorder) = Stage::headless(800, 600).unwrap();
        let mut reconciler = ResizeReconciler::new();
        let tiny = ResizeEvent::from_physical(1, 600, 2.0);
        assert_eq!((tiny.width, tiny.height), (1, 300));
        reconciler.reconcile(&mut stage, tiny).unwrap();
        assert_eq!(stage.target.output_size().physical(), (2, 600));
    }

    #[test]
    fn identical_events_are_no_ops() {
        let (mut stage, recorder) = Stage::headless(800, 600).unwrap();
        let mut reconciler = ResizeReconciler::new();
        let event = ResizeEvent::new(1024, 768, 1.0);

        reconciler.reconcile(&mut stage, event).unwrap();
        let aspect = stage.camera().unwrap().aspect();
        let projection = stage.camera().unwrap().projection_matrix();
        let resizes = recorder.resizes().len();

        assert_eq!(reconciler.reconcile(&mut stage, event).unwrap(), ResizeOutcome::Unchanged);
        assert_eq!(stage.camera().unwrap().aspect(), aspect);
        assert_eq!(stage.camera().unwrap().projection_matrix(), projection);
        assert_eq!(recorder.resizes().len(), resizes);
        assert_eq!(reconciler.handled(), 2);
    }

    #[test]
    fn invalid_event_changes_nothing() {
        let (mut stage, recorder) = Stage::headless(800, 600).unwrap();
        let mut reconciler = ResizeReconciler::new();

        assert!(matches!(
            reconciler.reconcile(&mut stage, ResizeEvent::new(0, 600, 1.0)),
            Err(Error::InvalidSurfaceSize { .. })
        ));
        assert!(reconciler.reconcile(&mut stage, ResizeEvent::new(800, 600, f32::NAN)).is_err());
        assert_eq!(stage.surface.width(), 800);
        assert_eq!(recorder.resizes().len(), 1);
    }
}
