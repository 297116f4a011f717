use ec_core::Image;
use ec_edge::{Channels, EdgeConfig, EdgeDetector, EdgeError};
use tracing::debug;

use crate::{DetectorError, EdgeMap, ScaleConfig, ScaleSchedule};

/// Result of one single-scale detection.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleOutput {
    /// Edge or gradient raster; each byte is the pixel's vote.
    Mask(Image<u8>),
    /// Traced map; each segment pixel votes 255.
    Map(EdgeMap),
}

impl ScaleOutput {
    pub fn width(&self) -> usize {
        match self {
            Self::Mask(m) => m.width(),
            Self::Map(m) => m.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Self::Mask(m) => m.height(),
            Self::Map(m) => m.height(),
        }
    }
}

/// Single-scale detector driven by the fusion engine.
///
/// Implementations must be deterministic for fixed input.
pub trait ScaleDetector {
    fn detect(
        &mut self,
        input: &Channels<'_>,
        scale: &ScaleConfig,
    ) -> Result<ScaleOutput, DetectorError>;
}

impl<D: ScaleDetector + ?Sized> ScaleDetector for &mut D {
    fn detect(
        &mut self,
        input: &Channels<'_>,
        scale: &ScaleConfig,
    ) -> Result<ScaleOutput, DetectorError> {
        (**self).detect(input, scale)
    }
}

/// Most scales a [`GradientDetector`] keeps kernels for.
const MAX_CACHED_SCALES: usize = 16;

/// Gaussian + gradient + NMS detector from `ec-edge`.
///
/// Kernels are built once per distinct scale and cached; a detector
/// prepared for a schedule never rebuilds them. The cache holds at most
/// 16 scales, evicting the oldest entry first.
#[derive(Debug, Clone, Default)]
pub struct GradientDetector {
    detector: EdgeDetector,
    configs: Vec<(ScaleConfig, EdgeConfig)>,
}

impl GradientDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precomputes the smoothing kernel of every scale in `schedule`.
    pub fn prepared(schedule: &ScaleSchedule) -> Result<Self, EdgeError> {
        let mut out = Self::new();
        for scale in schedule.scales() {
            out.config_index(scale)?;
        }
        debug!(scales = out.configs.len(), "prepared gradient detector");
        Ok(out)
    }

    fn config_index(&mut self, scale: &ScaleConfig) -> Result<usize, EdgeError> {
        if let Some(i) = self.configs.iter().position(|(s, _)| s == scale) {
            return Ok(i);
        }
        let cfg = EdgeConfig::with_sigma(scale.sigma, scale.grad_thresh)?;
        if self.configs.len() == MAX_CACHED_SCALES {
            self.configs.remove(0);
        }
        self.configs.push((*scale, cfg));
        Ok(self.configs.len() - 1)
    }
}

impl ScaleDetector for GradientDetector {
    fn detect(
        &mut self,
        input: &Channels<'_>,
        scale: &ScaleConfig,
    ) -> Result<ScaleOutput, DetectorError> {
        let i = self.config_index(scale)?;
        let mask = self.detector.detect(input, &self.configs[i].1)?;
        Ok(ScaleOutput::Mask(mask))
    }
}

#[cfg(test)]
mod tests {
    use ec_core::Image;
    use ec_edge::{Channels, EdgeError};

    use super::{GradientDetector, MAX_CACHED_SCALES, ScaleDetector, ScaleOutput};
    use crate::{ScaleConfig, ScaleSchedule};

    #[test]
    fn prepared_detector_caches_each_scale_once() {
        let schedule = ScaleSchedule::dizenzo(32).expect("schedule");
        let mut det = GradientDetector::prepared(&schedule).expect("kernels");
        assert_eq!(det.configs.len(), 8);

        let img = Image::new_fill(6, 6, 10u8);
        let input = Channels::gray(img.as_view());
        for scale in schedule.scales() {
            det.detect(&input, scale).expect("detect");
        }
        assert_eq!(det.configs.len(), 8);
    }

    #[test]
    fn mask_output_matches_input_size() {
        let img = Image::new_fill(7, 3, 0u8);
        let input = Channels::gray(img.as_view());
        let scale = ScaleConfig {
            sigma: 1.0,
            grad_thresh: 10.0,
            weight: 1,
        };

        let out = GradientDetector::new().detect(&input, &scale).expect("detect");
        assert!(matches!(out, ScaleOutput::Mask(_)));
        assert_eq!((out.width(), out.height()), (7, 3));
    }

    #[test]
    fn invalid_scale_surfaces_edge_error() {
        let img = Image::new_fill(2, 2, 0u8);
        let input = Channels::gray(img.as_view());
        let scale = ScaleConfig {
            sigma: -1.0,
            grad_thresh: 10.0,
            weight: 1,
        };

        let err = GradientDetector::new()
            .detect(&input, &scale)
            .expect_err("negative sigma");
        let edge = err.downcast_ref::<EdgeError>().expect("edge error");
        assert_eq!(edge, &EdgeError::InvalidSigma { sigma: -1.0 });
    }

    #[test]
    fn huge_sigma_is_an_error_not_a_panic() {
        let img = Image::new_fill(4, 4, 0u8);
        let input = Channels::gray(img.as_view());
        let scale = ScaleConfig {
            sigma: f32::MAX,
            grad_thresh: 10.0,
            weight: 1,
        };

        let err = GradientDetector::new()
            .detect(&input, &scale)
            .expect_err("oversized kernel");
        let edge = err.downcast_ref::<EdgeError>().expect("edge error");
        assert_eq!(edge, &EdgeError::InvalidSigma { sigma: f32::MAX });
    }

    #[test]
    fn kernel_cache_is_bounded() {
        let img = Image::new_fill(5, 5, 40u8);
        let input = Channels::gray(img.as_view());
        let mut det = GradientDetector::new();

        for k in 0..3 * MAX_CACHED_SCALES {
            let scale = ScaleConfig {
                sigma: 1.0 + 0.1 * k as f32,
                grad_thresh: 10.0,
                weight: 1,
            };
            det.detect(&input, &scale).expect("detect");
            assert!(det.configs.len() <= MAX_CACHED_SCALES);
        }
        assert_eq!(det.configs.len(), MAX_CACHED_SCALES);

        let newest = det.configs.last().map(|(s, _)| s.sigma);
        let expected = 1.0 + 0.1 * (3 * MAX_CACHED_SCALES - 1) as f32;
        assert_eq!(newest, Some(expected));
    }
}
