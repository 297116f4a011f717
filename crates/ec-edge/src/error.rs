#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EdgeError {
    #[error("channel {index} is {actual_width}x{actual_height}, expected {width}x{height}")]
    ChannelSizeMismatch {
        index: usize,
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("smoothing sigma out of range: {sigma}")]
    InvalidSigma { sigma: f32 },
    #[error("gradient threshold must be finite and >= 0, got {value}")]
    InvalidThreshold { value: f32 },
    #[error(transparent)]
    Core(#[from] ec_core::Error),
}
