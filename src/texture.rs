use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::math::{Vec2, Vec3};

/// A 2D texture for texture mapping.
///
/// Pixels are stored row-major with `channels` interleaved 8-bit channels per texel.
/// The texture owns its buffer; it is read-only once handed to a scene.
#[derive(Debug)]
pub struct Texture {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u32,
}

impl Texture {
    /// Wraps an already decoded pixel buffer.
    ///
    /// Fails with [`Error::InvalidTexture`] if the buffer length is not
    /// `width * height * channels`, the texture is empty, or `channels` is not 1..=4.
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u32) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if width == 0 || height == 0 || !(1..=4).contains(&channels) || data.len() != expected {
            return Err(Error::InvalidTexture {
                width,
                height,
                channels,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// A 1x1 texture of a single RGB color.
    pub fn solid(rgb: [u8; 3]) -> Self {
        Self {
            data: rgb.to_vec(),
            width: 1,
            height: 1,
            channels: 3,
        }
    }

    /// Load a texture from an image file (PNG, JPG, etc.)
    ///
    /// 8-bit images keep their channel layout; anything else is converted to RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Self::from_image(img)
    }

    pub fn from_image(img: DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        let (data, channels) = match img {
            DynamicImage::ImageLuma8(buf) => (buf.into_raw(), 1),
            DynamicImage::ImageLumaA8(buf) => (buf.into_raw(), 2),
            DynamicImage::ImageRgb8(buf) => (buf.into_raw(), 3),
            DynamicImage::ImageRgba8(buf) => (buf.into_raw(), 4),
            other => (other.to_rgba8().into_raw(), 4),
        };
        Self::new(data, width, height, channels)
    }

    /// Sample the texture at UV coordinates using nearest-neighbor filtering.
    ///
    /// # Wrapping
    /// Only the fractional part of each coordinate is used (`u - floor(u)`), so the
    /// texture repeats. The texel index is `trunc(frac * size - 0.5)`; the half-texel
    /// offset is part of the output format and must not be "corrected".
    ///
    /// Returns RGB in `[0, 1]`. One- and two-channel textures are treated as gray.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let uv = uv.fract_wrap();

        // `as` truncates toward zero and saturates the [-0.5, 0) range to 0.
        let s = ((uv.x * self.width as f32 - 0.5) as u32).min(self.width - 1);
        let t = ((uv.y * self.height as f32 - 0.5) as u32).min(self.height - 1);

        self.texel(s, t)
    }

    /// Fetch a texel by integer coordinates, normalized to `[0, 1]`.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> Vec3 {
        let idx = ((y * self.width + x) * self.channels) as usize;
        let px = &self.data[idx..idx + self.channels as usize];
        if self.channels >= 3 {
            Vec3::new(px[0] as f32, px[1] as f32, px[2] as f32) / 255.0
        } else {
            Vec3::splat(px[0] as f32 / 255.0)
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
