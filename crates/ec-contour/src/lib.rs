//! Multi-scale contour fusion and segment extraction.
//!
//! A [`FusionEngine`] runs a single-scale detector once per entry of a fixed
//! [`ScaleSchedule`] and fuses the per-scale edge masks into one contour
//! strength raster (`0..=255`), returned as a soft [`EdgeMap`]. The
//! extractor binarizes a strength raster at a cutoff and traces 8-connected
//! chains into [`Segment`]s, producing a binary [`EdgeMap`].
//!
//! Entry points:
//! - [`fuse_contours`]: soft map, no segments.
//! - [`fuse_contours_bw`]: fused, thresholded and traced.
//! - [`fuse_contours_with`]: fusion over any [`ScaleDetector`].
//! - [`extract_segments`]: thresholding and tracing of an existing raster.
//!
//! Gray input uses the gray schedule, three-channel input the DiZenzo
//! schedule. See [`ScaleSchedule`] for the scale values and the `fusion`
//! module docs for the normalisation rule.

mod adapter;
mod edge_map;
mod error;
mod extract;
mod fusion;
mod schedule;

pub use adapter::{GradientDetector, ScaleDetector, ScaleOutput};
pub use edge_map::{EDGE_PIXEL, EdgeMap, EdgeMapKind, Segment};
pub use error::{ContourError, DetectorError, SegmentFault};
pub use extract::extract_segments;
#[cfg(feature = "parallel")]
pub use fusion::fuse_contours_parallel;
pub use fusion::{FusionEngine, FusionOptions, fuse_contours, fuse_contours_bw, fuse_contours_with};
pub use schedule::{ContourParams, DetectionMode, ScaleConfig, ScaleSchedule};
