use std::fmt;

/// Why a set of point correspondences cannot determine a homography.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Degeneracy {
    TooFewCorrespondences { got: usize },
    TooManyCorrespondences { got: usize },
    CoincidentPoints,
    CollinearPoints,
    SingularSystem,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degeneracy::TooFewCorrespondences { got } => {
                write!(f, "expected 4 correspondences, got {got}")
            }
            Degeneracy::TooManyCorrespondences { got } => {
                write!(f, "expected exactly 4 correspondences, got {got}")
            }
            Degeneracy::CoincidentPoints => f.write_str("two points coincide"),
            Degeneracy::CollinearPoints => f.write_str("three points are collinear"),
            Degeneracy::SingularSystem => f.write_str("normal equations are singular"),
        }
    }
}

/// Errors returned by the homography solver.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomographyError {
    #[error("degenerate correspondence configuration: {0}")]
    DegenerateConfiguration(Degeneracy),
}

/// Errors returned by the image passes. All of them are checked before any
/// pixel is touched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Two inputs differ in size, or a structuring element does not fit the
    /// image (`expected` is then the image size, `actual` the element size).
    #[error("dimension mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("image has zero width or height")]
    EmptyImage,
    #[error("invalid window size {size}")]
    InvalidWindow { size: usize },
    #[error("invalid image buffer length (expected {expected} samples, got {actual})")]
    BufferLength { expected: usize, actual: usize },
}
