use ec_core::Pixel;

/// Failure reported by a single-scale detector. Passed through unchanged.
pub type DetectorError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum ContourError {
    #[error("invalid raster dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("{name} out of range: {value}")]
    InvalidThreshold { name: &'static str, value: i32 },
    #[error("failed to allocate {len} elements")]
    AllocationFailure { len: usize },
    #[error("single-scale detector failed")]
    DetectorFailure(#[source] DetectorError),
    #[error("segment {index}: {reason}")]
    InvalidSegment { index: usize, reason: SegmentFault },
    #[error(transparent)]
    Core(ec_core::Error),
}

impl From<ec_core::Error> for ContourError {
    fn from(e: ec_core::Error) -> Self {
        match e {
            ec_core::Error::AllocationFailure { len } => Self::AllocationFailure { len },
            other => Self::Core(other),
        }
    }
}

/// Why a caller-supplied segment list cannot form an [`EdgeMap`](crate::EdgeMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentFault {
    #[error("segment is empty")]
    Empty,
    #[error("pixel ({}, {}) lies outside the raster", .0.row, .0.col)]
    OutOfBounds(Pixel),
    #[error("pixel at position {at} is not 8-adjacent to its predecessor")]
    NotAdjacent { at: usize },
    #[error("pixel ({}, {}) is already claimed", .0.row, .0.col)]
    Overlap(Pixel),
}

pub(crate) fn check_dimensions(width: usize, height: usize) -> Result<usize, ContourError> {
    if width == 0 || height == 0 {
        return Err(ContourError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(ContourError::AllocationFailure { len: usize::MAX })
}

pub(crate) fn check_cutoff(cutoff: i32) -> Result<u8, ContourError> {
    u8::try_from(cutoff).map_err(|_| ContourError::InvalidThreshold {
        name: "cutoff",
        value: cutoff,
    })
}

pub(crate) fn push_checked<T>(out: &mut Vec<T>, value: T) -> Result<(), ContourError> {
    out.try_reserve(1)
        .map_err(|_| ContourError::AllocationFailure {
            len: out.len().saturating_add(1),
        })?;
    out.push(value);
    Ok(())
}
