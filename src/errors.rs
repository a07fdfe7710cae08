use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoiError {
    #[error("mask buffer of {actual} cells does not match bounds of {expected} cells")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("{actual} slices do not match an outer extent of {expected}")]
    SliceCountMismatch { expected: usize, actual: usize },

    #[error("malformed field '{0}'")]
    MalformedField(String),

    #[error("the slice factory did not produce a 3D ROI")]
    SliceUnavailable,

    #[error("the ROI could not be saved")]
    SaveFailed,
}
