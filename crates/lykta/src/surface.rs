//! Render surface state: logical size and device pixel ratio.
//!
//! The ratio is clamped to a configured ceiling so very dense displays do
//! not multiply framebuffer memory. Physical (framebuffer) size is the
//! logical size times the effective ratio, rounded.

use crate::error::{Error, Result};

/// Default ceiling for the device pixel ratio.
pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceState {
    width: u32,
    height: u32,
    pixel_ratio: f32,
    max_pixel_ratio: f32,
}

impl SurfaceState {
    /// `pixel_ratio` is the raw device ratio; it is clamped to `max_pixel_ratio`.
    pub fn new(width: u32, height: u32, pixel_ratio: f32, max_pixel_ratio: f32) -> Result<Self> {
        validate_size(width, height)?;
        validate_ratio(pixel_ratio)?;
        validate_ratio(max_pixel_ratio)?;
        Ok(Self {
            width,
            height,
            pixel_ratio: pixel_ratio.min(max_pixel_ratio),
            max_pixel_ratio,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The clamped ratio actually used for rendering.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn max_pixel_ratio(&self) -> f32 {
        self.max_pixel_ratio
    }

    pub fn clamp_ratio(&self, ratio: f32) -> f32 {
        ratio.min(self.max_pixel_ratio)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn physical_size(&self) -> (u32, u32) {
        physical_size(self.width, self.height, self.pixel_ratio)
    }

    /// Apply a new logical size and raw ratio. Returns whether anything changed.
    pub fn update(&mut self, width: u32, height: u32, pixel_ratio: f32) -> Result<bool> {
        validate_size(width, height)?;
        validate_ratio(pixel_ratio)?;
        let ratio = self.clamp_ratio(pixel_ratio);
        let changed = (width, height, ratio) != (self.width, self.height, self.pixel_ratio);
        self.width = width;
        self.height = height;
        self.pixel_ratio = ratio;
        Ok(changed)
    }
}

/// Round a logical size to framebuffer pixels.
pub fn physical_size(width: u32, height: u32, ratio: f32) -> (u32, u32) {
    (
        ((width as f32 * ratio).round() as u32).max(1),
        ((height as f32 * ratio).round() as u32).max(1),
    )
}

pub(crate) fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        Err(Error::InvalidSurfaceSize { width, height })
    } else {
        Ok(())
    }
}

pub(crate) fn validate_ratio(ratio: f32) -> Result<()> {
    if ratio.is_finite() && ratio > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidPixelRatio(ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_clamped_to_ceiling() {
        let s = SurfaceState::new(800, 600, 3.0, DEFAULT_MAX_PIXEL_RATIO).unwrap();
        assert_eq!(s.pixel_ratio(), 2.0);
        assert_eq!(s.physical_size(), (1600, 1200));
    }

    #[test]
    fn fractional_ratio_rounds() {
        let s = SurfaceState::new(801, 601, 1.25, 2.0).unwrap();
        assert_eq!(s.physical_size(), (1001, 751));
    }

    #[test]
    fn update_reports_change() {
        let mut s = SurfaceState::new(800, 600, 1.0, 2.0).unwrap();
        assert!(!s.update(800, 600, 1.0).unwrap());
        assert!(s.update(1024, 768, 1.0).unwrap());
        // 3 and 2 both clamp to 2.
        assert!(s.update(1024, 768, 3.0).unwrap());
        assert!(!s.update(1024, 768, 2.0).unwrap());
    }

    #[test]
    fn zero_size_rejected() {
        assert!(SurfaceState::new(0, 600, 1.0, 2.0).is_err());
        let mut s = SurfaceState::new(800, 600, 1.0, 2.0).unwrap();
        assert!(s.update(800, 0, 1.0).is_err());
        assert!(s.update(800, 600, 0.0).is_err());
        assert_eq!(s.width(), 800);
    }
}
