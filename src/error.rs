use thiserror::Error;

/// Errors reported by the video layer.
#[derive(Debug, Error)]
pub enum VideoError {
    /// No memory tier could hold the requested pixel buffer.
    #[error("could not allocate surface of {bytes} bytes")]
    OutOfMemory { bytes: usize },

    #[error("unsupported video mode {0:#04x}")]
    UnsupportedMode(u16),

    /// Source image data does not match its declared dimensions.
    #[error("image data is {actual} bytes, expected {expected}")]
    ImageSize { expected: usize, actual: usize },

    #[error("screenshot failed: {0}")]
    Screenshot(String),
}

impl From<std::io::Error> for VideoError {
    fn from(err: std::io::Error) -> Self {
        VideoError::Screenshot(err.to_string())
    }
}

impl From<png::EncodingError> for VideoError {
    fn from(err: png::EncodingError) -> Self {
        VideoError::Screenshot(err.to_string())
    }
}
