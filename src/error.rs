use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuantizeError {
    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("image contributed no color mass")]
    EmptyImage,

    #[error("bucket step must be a power of two in 1..=256, got {0}")]
    InvalidBucketStep(u32),
}
