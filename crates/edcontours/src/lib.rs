//! Umbrella crate for the `edcontours` workspace.
//!
//! Re-exports the raster primitives, the single-scale detector, multi-scale
//! fusion with segment extraction, and the PGM/PPM codec.
//!
//! ```no_run
//! use edcontours::{fuse_contours_bw, read, save_edge_map};
//!
//! let raster = read("scene.ppm")?;
//! let map = fuse_contours_bw(&raster.channels(), 32, 200)?;
//! save_edge_map("scene_edges.pgm", &map)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use ec_contour::*;
pub use ec_core::*;
pub use ec_edge::*;
pub use ec_io::*;
