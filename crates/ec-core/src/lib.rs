//! Foundational raster primitives for multi-scale contour detection.
//!
//! ## Rasters and Stride
//! Owned rasters ([`Image`]) are always contiguous: `data.len() == width * height`
//! and pixel `(row, col)` lives at `row * width + col`. Borrowed views use an
//! element stride (not byte stride) that may be greater than `width`, so a
//! view can cover a padded buffer.
//!
//! ## Coordinates
//! Raster accessors take `(x, y)` = `(col, row)` like the rest of the image
//! ecosystem. Contour output uses [`Pixel`], which stores `(row, col)`
//! explicitly to avoid mixing the two conventions.
//!
//! ## Border Modes
//! Neighbourhood operations resolve out-of-range indices through [`Border`]:
//! replicate the edge element, or mirror around it without repeating it.

mod border;
mod error;
mod geom;
mod image;

pub use border::Border;
pub use error::Error;
pub use geom::Pixel;
pub use image::{Image, ImageView, try_alloc};
