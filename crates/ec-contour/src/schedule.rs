use serde::{Deserialize, Serialize};

use crate::ContourError;

/// One single-scale detector invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// Gaussian pre-smoothing sigma.
    pub sigma: f32,
    /// Gradient magnitude threshold.
    pub grad_thresh: f32,
    /// Vote weight in the fused strength.
    pub weight: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// Single-channel gradient.
    Gray,
    /// Three-channel DiZenzo gradient.
    DiZenzo,
}

/// Fixed, ordered list of scales derived from a base gradient threshold.
///
/// - gray: 5 scales, `sigma_k = 1.0 + 0.5k`, `thresh_k = max(1, T(1 - 0.1k))`
/// - DiZenzo: 8 scales, `sigma_k = 1.0 + 0.25k`, `thresh_k = max(1, T(1 - 0.05k))`
///
/// Thresholds relax as sigma grows. All weights are 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleSchedule {
    mode: DetectionMode,
    scales: Vec<ScaleConfig>,
}

impl ScaleSchedule {
    pub fn gray(grad_thresh: i32) -> Result<Self, ContourError> {
        Self::build(DetectionMode::Gray, grad_thresh, 5, 0.5, 0.1)
    }

    pub fn dizenzo(grad_thresh: i32) -> Result<Self, ContourError> {
        Self::build(DetectionMode::DiZenzo, grad_thresh, 8, 0.25, 0.05)
    }

    pub fn for_mode(mode: DetectionMode, grad_thresh: i32) -> Result<Self, ContourError> {
        match mode {
            DetectionMode::Gray => Self::gray(grad_thresh),
            DetectionMode::DiZenzo => Self::dizenzo(grad_thresh),
        }
    }

    fn build(
        mode: DetectionMode,
        grad_thresh: i32,
        count: usize,
        sigma_step: f32,
        thresh_step: f32,
    ) -> Result<Self, ContourError> {
        if grad_thresh <= 0 {
            return Err(ContourError::InvalidThreshold {
                name: "grad_thresh",
                value: grad_thresh,
            });
        }

        let base = grad_thresh as f32;
        let scales = (0..count)
            .map(|k| {
                let k = k as f32;
                ScaleConfig {
                    sigma: 1.0 + sigma_step * k,
                    grad_thresh: (base * (1.0 - thresh_step * k)).max(1.0),
                    weight: 1,
                }
            })
            .collect();

        Ok(Self { mode, scales })
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn scales(&self) -> &[ScaleConfig] {
        &self.scales
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.scales.iter().map(|s| u64::from(s.weight)).sum()
    }
}

/// Top-level detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContourParams {
    pub grad_thresh: i32,
    /// Binarization cutoff on the fused strength, `0..=255`.
    pub cutoff: i32,
}

impl ContourParams {
    pub const fn gray() -> Self {
        Self {
            grad_thresh: 30,
            cutoff: 252,
        }
    }

    pub const fn color() -> Self {
        Self {
            grad_thresh: 32,
            cutoff: 200,
        }
    }

    pub const fn for_mode(mode: DetectionMode) -> Self {
        match mode {
            DetectionMode::Gray => Self::gray(),
            DetectionMode::DiZenzo => Self::color(),
        }
    }
}
