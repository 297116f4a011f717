//! Single-scale edge mask extraction.
//!
//! Threshold behavior:
//! - `low_thresh == high_thresh` keeps every suppressed maximum whose
//!   magnitude reaches the threshold.
//! - `low_thresh < high_thresh` runs hysteresis: maxima above `high_thresh`
//!   seed edges that grow through 8-connected maxima above `low_thresh`.
//! - Thresholds given in the wrong order are swapped.
//!
//! Non-maximum suppression runs at every pixel, border pixels included;
//! neighbours outside the raster count as zero magnitude.

use ec_core::{Border, Image, ImageView, try_alloc};
use tracing::trace;

use crate::gradient::{accumulate_tensor, dizenzo_resolve, magnitude, prewitt_backward};
use crate::{Channels, EdgeError, GaussianKernel, smooth_separable};

/// Mask value of an edge pixel. Non-edge pixels are `0`.
pub const EDGE_ON: u8 = 255;

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeConfig {
    /// Pre-smoothing kernel; `None` differentiates the raw input.
    pub smoothing: Option<GaussianKernel>,
    pub low_thresh: f32,
    pub high_thresh: f32,
    /// Border policy of the smoothing pass. Differences always replicate.
    pub border: Border,
}

impl EdgeConfig {
    /// Gaussian pre-smoothing with a single gradient threshold.
    pub fn with_sigma(sigma: f32, thresh: f32) -> Result<Self, EdgeError> {
        let cfg = Self {
            smoothing: Some(GaussianKernel::new(sigma)?),
            low_thresh: thresh,
            high_thresh: thresh,
            border: Border::Replicate,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EdgeError> {
        for value in [self.low_thresh, self.high_thresh] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EdgeError::InvalidThreshold { value });
            }
        }
        Ok(())
    }

    fn ordered_thresholds(&self) -> (f32, f32) {
        let mut low = self.low_thresh;
        let mut high = self.high_thresh;
        if high < low {
            core::mem::swap(&mut high, &mut low);
        }
        (low, high)
    }
}

/// Reusable detector. Scratch buffers are kept between calls and only
/// reallocated when the input size changes.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    width: usize,
    height: usize,
    plane: Vec<f32>,
    tmp: Vec<f32>,
    smooth: Vec<f32>,
    gx: Vec<f32>,
    gy: Vec<f32>,
    mag: Vec<f32>,
    nms: Vec<f32>,
    txx: Vec<f32>,
    tyy: Vec<f32>,
    txy: Vec<f32>,
    stack: Vec<usize>,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the full pipeline and returns a `0`/[`EDGE_ON`] mask of the
    /// input's size.
    pub fn detect(
        &mut self,
        input: &Channels<'_>,
        cfg: &EdgeConfig,
    ) -> Result<Image<u8>, EdgeError> {
        cfg.validate()?;

        let (w, h) = (input.width(), input.height());
        let mut out = Image::try_new_fill(w, h, 0u8)?;
        if w == 0 || h == 0 {
            return Ok(out);
        }
        self.ensure_dims(w, h, input.is_color())?;

        match input {
            Channels::Gray(view) => {
                self.plane_gradient(view, cfg);
                magnitude(&self.gx, &self.gy, &mut self.mag);
            }
            Channels::Rgb(planes) => {
                self.txx.fill(0.0);
                self.tyy.fill(0.0);
                self.txy.fill(0.0);
                for view in planes {
                    self.plane_gradient(view, cfg);
                    accumulate_tensor(&self.gx, &self.gy, &mut self.txx, &mut self.tyy, &mut self.txy);
                }
                dizenzo_resolve(
                    &self.txx,
                    &self.tyy,
                    &self.txy,
                    planes.len(),
                    &mut self.gx,
                    &mut self.gy,
                    &mut self.mag,
                );
            }
        }

        non_max_suppression(w, h, &self.gx, &self.gy, &self.mag, &mut self.nms);

        let (low, high) = cfg.ordered_thresholds();
        let count = hysteresis(w, h, &self.nms, low, high, &mut self.stack, out.data_mut());
        trace!(
            width = w,
            height = h,
            color = input.is_color(),
            sigma = cfg.smoothing.as_ref().map(GaussianKernel::sigma),
            low,
            high,
            count,
            "edge mask"
        );

        Ok(out)
    }

    fn ensure_dims(&mut self, w: usize, h: usize, color: bool) -> Result<(), EdgeError> {
        let n = w * h;
        if self.width != w || self.height != h || self.plane.len() != n {
            for buf in [
                &mut self.plane,
                &mut self.tmp,
                &mut self.smooth,
                &mut self.gx,
                &mut self.gy,
                &mut self.mag,
                &mut self.nms,
            ] {
                *buf = try_alloc(n, 0.0f32)?;
            }
            self.txx.clear();
            self.tyy.clear();
            self.txy.clear();
            self.width = w;
            self.height = h;
        }

        if color && self.txx.len() != n {
            for buf in [&mut self.txx, &mut self.tyy, &mut self.txy] {
                *buf = try_alloc(n, 0.0f32)?;
            }
        }

        self.stack.clear();
        self.stack
            .try_reserve(n)
            .map_err(|_| ec_core::Error::AllocationFailure { len: n })?;
        Ok(())
    }

    /// Smooths one plane and leaves its gradient in `gx`/`gy`.
    fn plane_gradient(&mut self, view: &ImageView<'_, u8>, cfg: &EdgeConfig) {
        let (w, h) = (self.width, self.height);
        copy_u8_to_plane(view, &mut self.plane, w);

        if let Some(kernel) = &cfg.smoothing {
            smooth_separable(
                &self.plane,
                w,
                h,
                kernel,
                cfg.border,
                &mut self.tmp,
                &mut self.smooth,
            );
            prewitt_backward(&self.smooth, w, h, &mut self.gx, &mut self.gy);
        } else {
            prewitt_backward(&self.plane, w, h, &mut self.gx, &mut self.gy);
        }
    }
}

/// One-shot detection with a fresh [`EdgeDetector`].
pub fn detect_edges(input: &Channels<'_>, cfg: &EdgeConfig) -> Result<Image<u8>, EdgeError> {
    EdgeDetector::new().detect(input, cfg)
}

fn copy_u8_to_plane(src: &ImageView<'_, u8>, dst: &mut [f32], dst_w: usize) {
    for y in 0..src.height() {
        let s = src.row(y);
        let d = &mut dst[y * dst_w..(y + 1) * dst_w];
        for (dv, &sv) in d.iter_mut().zip(s.iter()) {
            *dv = sv as f32;
        }
    }
}

fn magnitude_at(mag: &[f32], w: usize, h: usize, x: usize, y: usize, dx: isize, dy: isize) -> f32 {
    let nx = x as isize + dx;
    let ny = y as isize + dy;
    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
        return 0.0;
    }
    mag[ny as usize * w + nx as usize]
}

pub(crate) fn non_max_suppression(
    w: usize,
    h: usize,
    gx: &[f32],
    gy: &[f32],
    mag: &[f32],
    nms: &mut [f32],
) {
    const TAN22_5: f32 = 0.414_213_57;
    const TAN67_5: f32 = 2.414_213_7;

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let m = mag[idx];
            if m <= 0.0 {
                nms[idx] = 0.0;
                continue;
            }

            let gxx = gx[idx];
            let gyy = gy[idx];
            let ax = gxx.abs();
            let ay = gyy.abs();

            let (dx, dy) = if ay <= ax * TAN22_5 {
                (1, 0)
            } else if ay >= ax * TAN67_5 {
                (0, 1)
            } else if gxx * gyy > 0.0 {
                (1, 1)
            } else {
                (1, -1)
            };

            let n1 = magnitude_at(mag, w, h, x, y, dx, dy);
            let n2 = magnitude_at(mag, w, h, x, y, -dx, -dy);
            nms[idx] = if m >= n1 && m >= n2 { m } else { 0.0 };
        }
    }
}

/// Marks accepted maxima in `out` and returns how many were accepted.
pub(crate) fn hysteresis(
    w: usize,
    h: usize,
    nms: &[f32],
    low: f32,
    high: f32,
    stack: &mut Vec<usize>,
    out: &mut [u8],
) -> usize {
    out.fill(0);
    stack.clear();

    for (idx, &v) in nms.iter().enumerate() {
        if v > 0.0 && v >= high {
            out[idx] = EDGE_ON;
            stack.push(idx);
        }
    }

    let mut count = stack.len();

    while let Some(idx) = stack.pop() {
        let x = idx % w;
        let y = idx / w;

        let y0 = y.saturating_sub(1);
        let y1 = (y + 1).min(h - 1);
        let x0 = x.saturating_sub(1);
        let x1 = (x + 1).min(w - 1);

        for ny in y0..=y1 {
            for nx in x0..=x1 {
                let nidx = ny * w + nx;
                let v = nms[nidx];
                if out[nidx] == 0 && v > 0.0 && v >= low {
                    out[nidx] = EDGE_ON;
                    stack.push(nidx);
                    count += 1;
                }
            }
        }
    }

    count
}
