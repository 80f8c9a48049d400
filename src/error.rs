use thiserror::Error;

/// Result type alias for operations that may fail with [`VectorizerError`].
pub type VectorizerResult<T> = std::result::Result<T, VectorizerError>;

/// Error types that can occur during vectorization.
///
/// Only [`Decode`](VectorizerError::Decode) and
/// [`InvalidOptions`](VectorizerError::InvalidOptions) are expected to reach
/// an end user; tracing failures indicate an internal invariant violation.
#[derive(Debug, Error)]
pub enum VectorizerError {
    /// Image loading or decoding error.
    #[error("Image decoding failed: {0}")]
    Decode(#[from] image::ImageError),
    /// A tuning knob is outside its accepted range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    /// Contour tracing hit an inconsistent state on a bilevel grid.
    #[error("Tracing failed: {0}")]
    Tracing(String),
    /// File system I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
