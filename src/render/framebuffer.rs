//! Color and depth buffers.
//!
//! [`FrameBuffer`] owns both buffers for the lifetime of a rasterizer. During a draw
//! it is split into [`Tile`]s: disjoint bands of full-width rows, each handed to
//! exactly one worker, so the compare-then-write depth test never races.

use std::ops::Range;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use rayon::prelude::*;

use crate::error::Result;
use crate::math::Vec3;

/// Depth of a pixel nothing has been drawn to.
pub const DEPTH_CLEAR: f32 = f32::INFINITY;

pub struct FrameBuffer {
    color: Vec<Vec3>,
    depth: Vec<f32>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Allocates a black framebuffer with every depth at [`DEPTH_CLEAR`].
    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            color: vec![Vec3::ZERO; size],
            depth: vec![DEPTH_CLEAR; size],
            width,
            height,
        }
    }

    pub fn clear(&mut self) {
        self.color.fill(Vec3::ZERO);
        self.depth.fill(DEPTH_CLEAR);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All colors, row-major, RGB in `[0, 1]`.
    pub fn colors(&self) -> &[Vec3] {
        &self.color
    }

    /// All depths, row-major.
    pub fn depths(&self) -> &[f32] {
        &self.depth
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn color(&self, x: u32, y: u32) -> Option<Vec3> {
        self.index(x, y).map(|i| self.color[i])
    }

    /// Get the depth at (x, y), or None if out of bounds.
    #[inline]
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    /// Splits the buffers into bands of `rows` full-width rows (the last band may be
    /// shorter), one parallel work item per band.
    pub(crate) fn tiles_mut(&mut self, rows: u32) -> impl IndexedParallelIterator<Item = Tile<'_>> {
        let width = self.width;
        let chunk = (width as usize * rows.max(1) as usize).max(1);
        self.color
            .par_chunks_mut(chunk)
            .zip(self.depth.par_chunks_mut(chunk))
            .enumerate()
            .map(move |(i, (color, depth))| Tile {
                y0: i as u32 * rows.max(1),
                rows: (color.len() / width as usize) as u32,
                color,
                depth,
                width,
            })
    }

    /// Converts to 8-bit RGB: each channel is clamped to `[0, 1]`, scaled by 255
    /// and truncated.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.color[y as usize * self.width as usize + x as usize].clamp(0.0, 1.0);
            Rgb([
                (c.x * 255.0) as u8,
                (c.y * 255.0) as u8,
                (c.z * 255.0) as u8,
            ])
        })
    }

    /// Writes the color buffer as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_rgb_image()
            .save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Exclusive view of a band of rows of a [`FrameBuffer`].
///
/// Coordinates passed to a tile are framebuffer coordinates; `y` must lie in
/// [`Tile::rows`].
pub struct Tile<'a> {
    color: &'a mut [Vec3],
    depth: &'a mut [f32],
    width: u32,
    y0: u32,
    rows: u32,
}

impl Tile<'_> {
    /// Framebuffer rows covered by this tile.
    pub fn rows(&self) -> Range<u32> {
        self.y0..self.y0 + self.rows
    }

    /// Depth-tested write.
    ///
    /// Passes if `depth` is less than or equal to the stored depth (closer or equal
    /// wins, so of two coplanar fragments the later one is kept). On pass the depth
    /// is stored and `shade` is invoked for the color.
    #[inline]
    pub fn test_and_set(&mut self, x: u32, y: u32, depth: f32, shade: impl FnOnce() -> Vec3) -> bool {
        let idx = (y - self.y0) as usize * self.width as usize + x as usize;
        if depth <= self.depth[idx] {
            self.depth[idx] = depth;
            self.color[idx] = shade();
            true
        } else {
            false
        }
    }
}
