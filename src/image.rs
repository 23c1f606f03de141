//! Owned single-channel f32 image in row-major layout (stride == width).
//!
//! Pixel grids decoded from UKSoft files are widened from their on-disk
//! 16-bit samples to f32 so the processing operations in [`crate::ops`] can
//! divide and subtract without overflow concerns. Also provides small I/O
//! helpers: grayscale PNG export and pretty-printed JSON dumps.
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Owned `w × h` f32 grid. Row 0 is the top scan line.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageF32 {
    /// Image width in pixels
    pub w: usize,
    /// Image height in pixels
    pub h: usize,
    /// Number of f32 elements between consecutive rows (equals `w`)
    pub stride: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl ImageF32 {
    /// Construct a zero-initialized buffer of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            stride: w,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            w * h,
            "buffer length {} does not match {w}x{h}",
            data.len()
        );
        Self {
            w,
            h,
            stride: w,
            data,
        }
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.stride + x
    }

    #[inline]
    /// Get the pixel value at (x, y).
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }

    #[inline]
    /// Set the pixel value at (x, y).
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    #[inline]
    /// Borrow row `y` as a slice.
    pub fn row(&self, y: usize) -> &[f32] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }

    /// True when the grid holds no samples (`w == 0` or `h == 0`).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Smallest sample value; 0.0 for an empty grid.
    pub fn min(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Largest sample value; 0.0 for an empty grid.
    pub fn max(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// New grid with every sample multiplied by `k`.
    pub fn scaled(&self, k: f32) -> Self {
        Self {
            w: self.w,
            h: self.h,
            stride: self.stride,
            data: self.data.iter().map(|v| v * k).collect(),
        }
    }
}

/// Save a float grid to an 8-bit grayscale PNG, mapping `[lo, hi]` to
/// `[0, 255]` and clamping everything outside.
pub fn save_grayscale_png(img: &ImageF32, lo: f32, hi: f32, path: &Path) -> Result<()> {
    let span = if hi > lo { hi - lo } else { 1.0 };
    let mut out = GrayImage::new(img.w as u32, img.h as u32);
    for y in 0..img.h {
        for (x, &px) in img.row(y).iter().enumerate() {
            let v = ((px - lo) / span * 255.0).clamp(0.0, 255.0);
            out.put_pixel(x as u32, y as u32, Luma([v as u8]));
        }
    }
    out.save(path)
        .map_err(|e| std::io::Error::other(format!("failed to save {}: {e}", path.display())))?;
    Ok(())
}

/// Serialize a value as pretty JSON to `path`. Handy for dumping a decoded
/// metadata map next to an exported image.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| std::io::Error::other(format!("json serialization failed: {e}")))?;
    fs::write(path, json)?;
    Ok(())
}
