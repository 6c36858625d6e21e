//! Surface appearance: [`Material`] and [`Texture`].
//!
//! A material is a base color, a shading model, and an optional color map.
//! Materials are shared between meshes through `Arc`; editing one through
//! [`Arc::make_mut`] clones it first if other meshes still hold it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::math::Color;

/// How a surface responds to light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shading {
    /// Unlit. Always drawn at full base color.
    Basic,
    /// Diffuse only.
    Lambert,
    /// Diffuse plus a roughness/metalness specular term.
    Standard { roughness: f32, metalness: f32 },
}

impl Shading {
    /// Whether this model reads scene lights at all.
    pub fn is_lit(&self) -> bool {
        !matches!(self, Shading::Basic)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub shading: Shading,
    pub map: Option<Arc<Texture>>,
}

impl Material {
    pub fn basic(color: Color) -> Self {
        Self { color, shading: Shading::Basic, map: None }
    }

    pub fn lambert(color: Color) -> Self {
        Self { color, shading: Shading::Lambert, map: None }
    }

    /// A standard material. Roughness and metalness are clamped to `[0, 1]`.
    pub fn standard(color: Color, roughness: f32, metalness: f32) -> Self {
        Self {
            color,
            shading: Shading::Standard {
                roughness: roughness.clamp(0.0, 1.0),
                metalness: metalness.clamp(0.0, 1.0),
            },
            map: None,
        }
    }

    pub fn with_map(mut self, map: Arc<Texture>) -> Self {
        self.map = Some(map);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard(Color::WHITE, 1.0, 0.0)
    }
}

/// Process-unique identity of a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

static NEXT_TEXTURE: AtomicU64 = AtomicU64::new(1);

/// Decoded RGBA8 pixel data, ready for upload.
#[derive(Debug, PartialEq)]
pub struct Texture {
    id: TextureId,
    label: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Wrap raw RGBA8 pixels. `pixels` must hold exactly `width * height * 4` bytes.
    pub fn from_rgba8(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let label = label.into();
        if width == 0 || height == 0 {
            return Err(Error::InvalidData(format!("texture '{label}' is {width}x{height}")));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::InvalidData(format!(
                "texture '{label}' has {} bytes, expected {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            id: TextureId(NEXT_TEXTURE.fetch_add(1, Ordering::Relaxed)),
            label,
            width,
            height,
            pixels,
        })
    }

    /// A `size`×`size` two-color checkerboard with 8 cells per side.
    pub fn checker(size: u32, a: Color, b: Color) -> Result<Self> {
        let cell = (size / 8).max(1);
        let to_rgba = |c: Color| {
            let [r, g, b] = c.to_array().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8);
            [r, g, b, 255]
        };
        let (pa, pb) = (to_rgba(a), to_rgba(b));
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let even = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.extend_from_slice(if even { &pa } else { &pb });
            }
        }
        Self::from_rgba8("checker", size, size, pixels)
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// A copy scaled down so neither side exceeds `max_dimension`, keeping
    /// the aspect ratio. `None` when the texture already fits.
    pub fn fit_within(&self, max_dimension: u32) -> Result<Option<Texture>> {
        let max_dimension = max_dimension.max(1);
        if self.width <= max_dimension && self.height <= max_dimension {
            return Ok(None);
        }
        let scale = max_dimension as f64 / self.width.max(self.height) as f64;
        let width = ((self.width as f64 * scale).round() as u32).clamp(1, max_dimension);
        let height = ((self.height as f64 * scale).round() as u32).clamp(1, max_dimension);

        let source = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| Error::InvalidData(format!("texture '{}' pixel buffer is short", self.label)))?;
        let scaled = image::imageops::resize(&source, width, height, image::imageops::FilterType::Triangle);
        Texture::from_rgba8(self.label.clone(), width, height, scaled.into_raw()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_size_must_match_pixels() {
        assert!(Texture::from_rgba8("t", 2, 2, vec![0; 16]).is_ok());
        assert!(Texture::from_rgba8("t", 2, 2, vec![0; 12]).is_err());
        assert!(Texture::from_rgba8("t", 0, 2, Vec::new()).is_err());
    }

    #[test]
    fn oversized_texture_is_scaled_to_fit() {
        let wide = Texture::from_rgba8("wide", 400, 100, vec![200; 400 * 100 * 4]).unwrap();
        let fitted = wide.fit_within(128).unwrap().unwrap();
        assert_eq!((fitted.width(), fitted.height()), (128, 32));
        assert_eq!(fitted.pixels().len(), 128 * 32 * 4);
        assert_eq!(&fitted.pixels()[0..4], &[200, 200, 200, 200]);

        assert!(wide.fit_within(400).unwrap().is_none());
        let sliver = Texture::from_rgba8("sliver", 1000, 1, vec![0; 1000 * 4]).unwrap();
        assert_eq!(sliver.fit_within(10).unwrap().unwrap().height(), 1);
    }

    #[test]
    fn checker_alternates_cells() {
        let t = Texture::checker(16, Color::WHITE, Color::BLACK).unwrap();
        assert_eq!(&t.pixels()[0..4], &[255, 255, 255, 255]);
        // Cell width is 2, so pixel 2 on the first row is the other color.
        assert_eq!(&t.pixels()[8..12], &[0, 0, 0, 255]);
    }

    #[test]
    fn standard_clamps_parameters() {
        let m = Material::standard(Color::WHITE, 2.0, -1.0);
        assert_eq!(m.shading, Shading::Standard { roughness: 1.0, metalness: 0.0 });
        assert!(m.shading.is_lit());
        assert!(!Material::basic(Color::RED).shading.is_lit());
    }

    #[test]
    fn make_mut_clones_shared_material() {
        let shared = Arc::new(Material::lambert(Color::RED));
        let mut mine = Arc::clone(&shared);
        Arc::make_mut(&mut mine).color = Color::BLUE;
        assert_eq!(shared.color, Color::RED);
        assert_eq!(mine.color, Color::BLUE);
    }
}
