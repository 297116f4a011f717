//! Multi-scale fusion.
//!
//! Every scale of a [`ScaleSchedule`] votes per pixel:
//! `acc(p) = sum_k weight_k * v_k(p)` where `v_k` is the mask byte of a
//! [`ScaleOutput::Mask`] or 255 for a segment pixel of a
//! [`ScaleOutput::Map`]. The fused strength is
//! `round_half_up(acc(p) / sum_k weight_k)`, always in `0..=255` and equal
//! to 255 only where every scale voted at full strength.
//!
//! Accumulation is integer and runs in schedule order. The parallel path
//! detects all scales concurrently, keeps one output per scale and reduces
//! them in schedule order, so it produces the same bytes as the sequential
//! path.

use ec_core::{Image, try_alloc};
use ec_edge::Channels;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{check_cutoff, check_dimensions};
use crate::{
    ContourError, DetectionMode, EdgeMap, EdgeMapKind, GradientDetector, ScaleConfig,
    ScaleDetector, ScaleOutput, ScaleSchedule, extract_segments,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FusionOptions {
    /// Run scales on the rayon pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}

/// Schedule plus a detector whose per-scale kernels are built up front.
#[derive(Debug, Clone)]
pub struct FusionEngine {
    schedule: ScaleSchedule,
    detector: GradientDetector,
    options: FusionOptions,
}

impl FusionEngine {
    pub fn new(schedule: ScaleSchedule) -> Result<Self, ContourError> {
        let detector = GradientDetector::prepared(&schedule)
            .map_err(|e| ContourError::DetectorFailure(Box::new(e)))?;
        Ok(Self {
            schedule,
            detector,
            options: FusionOptions::default(),
        })
    }

    /// Engine for `input`: gray schedule for one channel, DiZenzo for three.
    pub fn for_input(input: &Channels<'_>, grad_thresh: i32) -> Result<Self, ContourError> {
        let mode = if input.is_color() {
            DetectionMode::DiZenzo
        } else {
            DetectionMode::Gray
        };
        Self::new(ScaleSchedule::for_mode(mode, grad_thresh)?)
    }

    pub fn with_options(mut self, options: FusionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schedule(&self) -> &ScaleSchedule {
        &self.schedule
    }

    pub fn options(&self) -> FusionOptions {
        self.options
    }

    /// Soft contour map of `input`.
    #[cfg(feature = "parallel")]
    pub fn fuse(&mut self, input: &Channels<'_>) -> Result<EdgeMap, ContourError> {
        if self.options.parallel {
            fuse_contours_parallel(&self.detector, &self.schedule, input)
        } else {
            fuse_contours_with(&mut self.detector, &self.schedule, input)
        }
    }

    /// Soft contour map of `input`.
    #[cfg(not(feature = "parallel"))]
    pub fn fuse(&mut self, input: &Channels<'_>) -> Result<EdgeMap, ContourError> {
        fuse_contours_with(&mut self.detector, &self.schedule, input)
    }

    /// Fuses, then binarizes at `cutoff` and traces segments.
    pub fn fuse_bw(&mut self, input: &Channels<'_>, cutoff: i32) -> Result<EdgeMap, ContourError> {
        check_cutoff(cutoff)?;
        let soft = self.fuse(input)?;
        extract_segments(&soft.edge_image(), cutoff)
    }
}

/// Soft contour map with the default schedule for `input`.
pub fn fuse_contours(input: &Channels<'_>, grad_thresh: i32) -> Result<EdgeMap, ContourError> {
    check_dimensions(input.width(), input.height())?;
    FusionEngine::for_input(input, grad_thresh)?.fuse(input)
}

/// Binary contour map with segments, fused with the default schedule for
/// `input` and cut at `cutoff`.
pub fn fuse_contours_bw(
    input: &Channels<'_>,
    grad_thresh: i32,
    cutoff: i32,
) -> Result<EdgeMap, ContourError> {
    check_dimensions(input.width(), input.height())?;
    check_cutoff(cutoff)?;
    FusionEngine::for_input(input, grad_thresh)?.fuse_bw(input, cutoff)
}

/// Sequential fusion with a caller-supplied detector.
pub fn fuse_contours_with<D: ScaleDetector>(
    detector: &mut D,
    schedule: &ScaleSchedule,
    input: &Channels<'_>,
) -> Result<EdgeMap, ContourError> {
    let (w, h) = (input.width(), input.height());
    let n = check_dimensions(w, h)?;
    let mut acc = try_alloc(n, 0u64)?;

    for (k, scale) in schedule.scales().iter().enumerate() {
        let out = detector
            .detect(input, scale)
            .map_err(ContourError::DetectorFailure)?;
        accumulate(&mut acc, w, h, &out, scale)?;
        log_scale(k, scale);
    }

    finish(acc, w, h, schedule)
}

/// Parallel fusion: one detector clone per worker, outputs reduced in
/// schedule order.
#[cfg(feature = "parallel")]
pub fn fuse_contours_parallel<D>(
    detector: &D,
    schedule: &ScaleSchedule,
    input: &Channels<'_>,
) -> Result<EdgeMap, ContourError>
where
    D: ScaleDetector + Clone + Send + Sync,
{
    use rayon::prelude::*;

    let (w, h) = (input.width(), input.height());
    let n = check_dimensions(w, h)?;
    let mut acc = try_alloc(n, 0u64)?;

    let outputs: Vec<_> = schedule
        .scales()
        .par_iter()
        .map_init(|| detector.clone(), |det, scale| det.detect(input, scale))
        .collect();

    for (k, (scale, out)) in schedule.scales().iter().zip(outputs).enumerate() {
        let out = out.map_err(ContourError::DetectorFailure)?;
        accumulate(&mut acc, w, h, &out, scale)?;
        log_scale(k, scale);
    }

    finish(acc, w, h, schedule)
}

fn log_scale(k: usize, scale: &ScaleConfig) {
    debug!(
        scale = k,
        sigma = scale.sigma,
        grad_thresh = scale.grad_thresh,
        weight = scale.weight,
        "accumulated scale"
    );
}

fn accumulate(
    acc: &mut [u64],
    w: usize,
    h: usize,
    out: &ScaleOutput,
    scale: &ScaleConfig,
) -> Result<(), ContourError> {
    if out.width() != w || out.height() != h {
        return Err(ContourError::DetectorFailure(Box::new(
            ec_core::Error::SizeMismatch {
                expected: w * h,
                actual: out.width() * out.height(),
            },
        )));
    }

    let weight = u64::from(scale.weight);
    match out {
        ScaleOutput::Mask(mask) => {
            for (a, &v) in acc.iter_mut().zip(mask.data()) {
                *a += weight * u64::from(v);
            }
        }
        ScaleOutput::Map(map) if map.kind() == EdgeMapKind::Binary => {
            for p in map.segments().iter().flat_map(|s| s.iter()) {
                acc[p.index(w)] += weight * 255;
            }
        }
        ScaleOutput::Map(map) => {
            let raster = map.edge_image();
            for y in 0..h {
                for (x, &v) in raster.row(y).iter().enumerate() {
                    acc[y * w + x] += weight * u64::from(v);
                }
            }
        }
    }
    Ok(())
}

fn finish(
    acc: Vec<u64>,
    w: usize,
    h: usize,
    schedule: &ScaleSchedule,
) -> Result<EdgeMap, ContourError> {
    let total = schedule.total_weight();
    let mut strength = try_alloc(acc.len(), 0u8)?;
    let mut max_strength = 0u8;
    for (s, &a) in strength.iter_mut().zip(&acc) {
        *s = normalize(a, total);
        max_strength = max_strength.max(*s);
    }

    debug!(
        width = w,
        height = h,
        scales = schedule.len(),
        total_weight = total,
        max_strength,
        "fused contour strength"
    );

    Ok(EdgeMap::soft(Image::from_vec(w, h, strength)?))
}

/// `round_half_up(acc / total)` clamped to a byte; zero when `total == 0`.
#[inline]
fn normalize(acc: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let q = (2 * acc + total) / (2 * total);
    q.min(255) as u8
}
