//! # Controls — Input-Driven Camera Controllers
//!
//! A [`CameraController`] runs once per tick, after animations and before
//! the render, and moves the stage's camera node from pointer input. Two
//! strategies are provided; a frame loop holds at most one.
//!
//! | Controller | Input | Motion |
//! |------------|-------|--------|
//! | [`OrbitControls`] | drag, wheel | accumulates into a desired orbit, eased toward it |
//! | [`CursorOrbit`] | cursor position | camera position is a direct function of the cursor |
//!
//! Both keep the camera aimed at a fixed target through
//! [`Scene::place_looking_at`](crate::scene::Scene::place_looking_at).

mod cursor;
mod orbit;

pub use cursor::CursorOrbit;
pub use orbit::{OrbitControls, Spherical};

use crate::error::Result;
use crate::stage::Stage;

pub trait CameraController {
    /// Consume accumulated input and move `stage.camera`.
    fn update(&mut self, stage: &mut Stage) -> Result<()>;
}
