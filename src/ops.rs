//! Post-processing operations on LEEM/LEED pixel grids.
//!
//! All operations are pure: the input grid is left untouched and a new
//! [`ImageF32`] is returned. Each is independently callable; there is no
//! ordering constraint between them.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::ImageF32;

/// Histogram bins used by [`display_levels`].
const LEVEL_BINS: usize = 30;
/// Bins holding fewer samples than this are treated as hot-pixel residue.
const HOT_PIXEL_COUNT: usize = 10;

/// Parameters of the inelastic-background filter.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct InelasticFilter {
    /// Sigma of the Gaussian background estimate, in pixels.
    pub sigma: f32,
}

impl Default for InelasticFilter {
    fn default() -> Self {
        Self { sigma: 15.0 }
    }
}

/// Display contrast range estimated by [`display_levels`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Levels {
    pub min: f32,
    pub max: f32,
}

/// Divide an image by a flat-field CCD frame and rescale to unit maximum.
///
/// Corrects detector response non-uniformity. Fails with
/// [`Error::ShapeMismatch`] when the grids differ in size and with
/// [`Error::DegenerateReference`] when any reference sample is zero or the
/// corrected maximum is zero — never silently produces inf/NaN.
pub fn normalize_on_ccd(img: &ImageF32, ccd: &ImageF32) -> Result<ImageF32> {
    if img.w != ccd.w || img.h != ccd.h {
        return Err(Error::ShapeMismatch {
            w: img.w,
            h: img.h,
            ref_w: ccd.w,
            ref_h: ccd.h,
        });
    }
    if img.is_empty() {
        return Ok(img.clone());
    }
    let mut out = ImageF32::new(img.w, img.h);
    for (o, (&v, &c)) in out.data.iter_mut().zip(img.data.iter().zip(&ccd.data)) {
        if c == 0.0 {
            return Err(Error::DegenerateReference);
        }
        *o = v / c;
    }
    let max = out.max();
    if max <= 0.0 {
        return Err(Error::DegenerateReference);
    }
    Ok(out.scaled(1.0 / max))
}

/// Suppress the diffuse inelastic background of a LEED pattern.
///
/// Scales the grid to unit maximum, subtracts a Gaussian-blurred copy (the
/// low-pass background estimate), and clamps at zero so the result never
/// goes negative.
pub fn filter_inelastic_bkg(img: &ImageF32, params: &InelasticFilter) -> ImageF32 {
    let max = img.max();
    let mut out = if max > 0.0 {
        img.scaled(1.0 / max)
    } else {
        img.clone()
    };
    let background = gaussian_blur(&out, params.sigma);
    for (v, b) in out.data.iter_mut().zip(&background.data) {
        *v = (*v - b).max(0.0);
    }
    debug!("inelastic filter: sigma={} max_in={max}", params.sigma);
    out
}

/// Separable Gaussian blur with replicate-clamped borders.
///
/// Kernel radius is `ceil(3·sigma)`; `sigma <= 0` returns an unchanged
/// copy.
pub fn gaussian_blur(img: &ImageF32, sigma: f32) -> ImageF32 {
    if sigma <= 0.0 || img.is_empty() {
        return img.clone();
    }
    let radius = ((3.0 * sigma).ceil() as usize).max(1);
    let mut kernel = Vec::with_capacity(2 * radius + 1);
    for i in -(radius as isize)..=(radius as isize) {
        kernel.push((-((i * i) as f32) / (2.0 * sigma * sigma)).exp());
    }
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }

    let (w, h) = (img.w, img.h);
    // horizontal
    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &wgt) in kernel.iter().enumerate() {
                let xi = (x as isize + k as isize - radius as isize).clamp(0, w as isize - 1);
                acc += wgt * img.get(xi as usize, y);
            }
            tmp.set(x, y, acc);
        }
    }
    // vertical
    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &wgt) in kernel.iter().enumerate() {
                let yi = (y as isize + k as isize - radius as isize).clamp(0, h as isize - 1);
                acc += wgt * tmp.get(x, yi as usize);
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Estimate good display min/max levels from a 30-bin histogram.
///
/// For LEEM images (`leed == false`) only the square inscribed in the round
/// MCP is considered, since the corners are always dark. Trailing
/// near-empty histogram bins held up by a few hot pixels are dropped when
/// picking the maximum.
pub fn display_levels(img: &ImageF32, leed: bool) -> Levels {
    let samples = if leed {
        img.data.clone()
    } else {
        inner_square(img)
    };
    if samples.is_empty() {
        return Levels { min: 0.0, max: 0.0 };
    }
    let lo = samples.iter().copied().fold(f32::INFINITY, f32::min);
    let hi = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if hi <= lo {
        return Levels { min: lo, max: hi };
    }

    let mut counts = [0usize; LEVEL_BINS];
    let span = hi - lo;
    for &v in &samples {
        let bin = (((v - lo) / span) * LEVEL_BINS as f32) as usize;
        counts[bin.min(LEVEL_BINS - 1)] += 1;
    }
    let edge = |i: usize| lo + span * i as f32 / LEVEL_BINS as f32;

    let max = if counts[LEVEL_BINS - 1] < HOT_PIXEL_COUNT
        && counts[LEVEL_BINS - 2] < HOT_PIXEL_COUNT / 2
    {
        // Hot pixels stretch the histogram; cut back to the first
        // well-populated bin from the top.
        let mut from_top = 0;
        let mut best = 0usize;
        for (i, &c) in counts.iter().rev().enumerate() {
            if c > best {
                best = c;
                from_top = i;
            }
        }
        debug!("display_levels: dropping {from_top} hot-pixel bins");
        edge(LEVEL_BINS - from_top)
    } else {
        edge(LEVEL_BINS - 1)
    };
    Levels { min: lo, max }
}

/// Samples of the square inscribed in the MCP circle, with a small margin.
/// Falls back to the full grid when the image is too small to crop.
fn inner_square(img: &ImageF32) -> Vec<f32> {
    let half_h = inner_half(img.h);
    let half_w = inner_half(img.w);
    if half_h == 0 || half_w == 0 {
        return img.data.clone();
    }
    let (cy, cx) = (img.h / 2, img.w / 2);
    let mut out = Vec::with_capacity(4 * half_h * half_w);
    for y in cy - half_h..cy + half_h {
        out.extend_from_slice(&img.row(y)[cx - half_w..cx + half_w]);
    }
    out
}

fn inner_half(len: usize) -> usize {
    ((len as f32 / (2.0 * std::f32::consts::SQRT_2)) as usize).saturating_sub(5)
}
