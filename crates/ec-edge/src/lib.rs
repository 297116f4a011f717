//! Single-scale edge detection used as the per-scale building block of
//! multi-scale contour fusion.
//!
//! Coordinates follow the raster convention of `ec-core`: `(x, y)` is
//! `(col, row)` and pixel `(x, y)` lives at `y * width + x`.
//!
//! Pipeline for one scale:
//! 1. separable Gaussian smoothing ([`GaussianKernel`], computed once per scale),
//! 2. backward-difference Prewitt gradient per channel; colour input is fused
//!    with the DiZenzo structure tensor (largest eigenvalue, normalised by the
//!    channel count so a gray image replicated into three planes has the same
//!    magnitude as the gray path),
//! 3. non-maximum suppression along the quantised gradient direction,
//! 4. single threshold (`low == high`) or hysteresis (`low < high`).
//!
//! Backward differences place an edge on the first pixel past an intensity
//! transition, so a step between columns `c - 1` and `c` marks column `c`.

mod channels;
mod detector;
mod error;
mod gradient;
mod kernel;
mod smooth;

pub use channels::Channels;
pub use detector::{EDGE_ON, EdgeConfig, EdgeDetector, detect_edges};
pub use error::EdgeError;
pub use kernel::{GaussianKernel, MAX_KERNEL_RADIUS};
pub use smooth::smooth_separable;
