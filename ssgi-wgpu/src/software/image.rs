//! Float RGBA images backing the software device's surfaces.

use std::path::Path;

use half::f16;
use image::{Rgba, RgbaImage};

use crate::error::RenderResult;

use crate::targets::{Extent, TargetFormat};

/// Storage format of a software surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelStorage {
    /// Clamped to [0, 1] and quantized to 1/255 on write.
    Unorm8,
    /// Rounded to IEEE half precision on write, like an `Rgba16Float` texture.
    Float16,
}

impl From<TargetFormat> for PixelStorage {
    fn from(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Rgba8Unorm => PixelStorage::Unorm8,
            TargetFormat::Rgba16Float => PixelStorage::Float16,
        }
    }
}

fn quantize_unorm8(v: f32) -> f32 {
    (v.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

fn quantize_f16(v: f32) -> f32 {
    f16::from_f32(v).to_f32()
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    extent: Extent,
    storage: PixelStorage,
    pixels: Vec<[f32; 4]>,
}

impl FloatImage {
    pub fn new(extent: Extent, storage: PixelStorage) -> Self {
        Self {
            extent,
            storage,
            pixels: vec![[0.0; 4]; extent.pixel_count()],
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width
    }

    pub fn height(&self) -> u32 {
        self.extent.height
    }

    pub fn storage(&self) -> PixelStorage {
        self.storage
    }

    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.extent.width as usize + x as usize
    }

    fn encode(&self, value: [f32; 4]) -> [f32; 4] {
        match self.storage {
            PixelStorage::Unorm8 => value.map(quantize_unorm8),
            PixelStorage::Float16 => value.map(quantize_f16),
        }
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels[self.index(x, y)]
    }

    /// Integer texel fetch with coordinates clamped to the image.
    pub fn load(&self, x: i32, y: i32) -> [f32; 4] {
        let x = x.clamp(0, self.extent.width as i32 - 1) as u32;
        let y = y.clamp(0, self.extent.height as i32 - 1) as u32;
        self.get(x, y)
    }

    pub fn set(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let encoded = self.encode(value);
        let i = self.index(x, y);
        self.pixels[i] = encoded;
    }

    pub fn fill(&mut self, value: [f32; 4]) {
        let encoded = self.encode(value);
        self.pixels.fill(encoded);
    }

    /// RGBA8 copy for PNG output.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.extent.width, self.extent.height, |x, y| {
            Rgba(self.get(x, y).map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        })
    }

    /// One channel replicated to gray, opaque.
    pub fn channel_image(&self, channel: usize) -> RgbaImage {
        RgbaImage::from_fn(self.extent.width, self.extent.height, |x, y| {
            let v = (self.get(x, y)[channel].clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgba([v, v, v, 255])
        })
    }

    /// Write a PNG, creating missing parent directories. `channel` picks a
    /// single gray channel instead of rgba.
    pub fn save_png(&self, path: &Path, channel: Option<usize>) -> RenderResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rgba = match channel {
            Some(c) => self.channel_image(c),
            None => self.to_rgba_image(),
        };
        rgba.save(path)?;
        Ok(())
    }
}
