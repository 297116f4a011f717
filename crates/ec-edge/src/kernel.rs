use crate::EdgeError;

/// Largest supported kernel radius.
pub const MAX_KERNEL_RADIUS: usize = 1 << 16;

/// Sampled 1D Gaussian used for separable smoothing.
///
/// Conventions:
/// - `radius = ceil(3*sigma)`, minimum 1, at most [`MAX_KERNEL_RADIUS`].
/// - taps are symmetric and normalised so `sum(taps) ~= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    sigma: f32,
    radius: usize,
    taps: Vec<f32>,
}

impl GaussianKernel {
    pub fn new(sigma: f32) -> Result<Self, EdgeError> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(EdgeError::InvalidSigma { sigma });
        }

        let reach = (3.0 * f64::from(sigma)).ceil();
        if reach > MAX_KERNEL_RADIUS as f64 {
            return Err(EdgeError::InvalidSigma { sigma });
        }
        let radius = (reach as usize).max(1);
        let sigma2 = sigma * sigma;

        let mut taps = ec_core::try_alloc(2 * radius + 1, 0.0f32)?;
        for (i, t) in taps.iter_mut().enumerate() {
            let x = i as f32 - radius as f32;
            *t = (-(x * x) / (2.0 * sigma2)).exp();
        }

        let sum: f32 = taps.iter().sum();
        for t in &mut taps {
            *t /= sum;
        }

        Ok(Self {
            sigma,
            radius,
            taps,
        })
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}
