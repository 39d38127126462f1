//! Error types for dnnscale

use thiserror::Error;

/// Result type alias for dnnscale operations
pub type Result<T> = std::result::Result<T, Error>;

/// dnnscale error type
#[derive(Error, Debug)]
pub enum Error {
    // Startup errors
    #[error("unknown model {0}")]
    UnknownModel(String),

    #[error("Failed to load model {name}: {reason}")]
    ModelLoad { name: String, reason: String },

    // Classification errors
    #[error("input/output file is neither a video nor an image: {input} -> {output}")]
    MediaMismatch { input: String, output: String },

    #[error("Unsupported output video extension: {0}")]
    UnsupportedCodec(String),

    // Image errors
    #[error("Failed to read image: {0}")]
    ImageRead(String),

    #[error("Failed to write image: {0}")]
    ImageWrite(String),

    // Video errors
    #[error("Failed to open video: {0}")]
    VideoOpen(String),

    #[error("Decoding failed: {0}")]
    Decode(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Muxer error: {0}")]
    Muxer(String),

    // Processing errors
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Frame geometry mismatch: expected {expected}, got {actual}")]
    FrameGeometry { expected: String, actual: String },

    // Backend errors
    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    // General errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error happened before any media was touched
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownModel(_) | Error::ModelLoad { .. } | Error::Config(_)
        )
    }

    /// Check if this error comes from input/output path classification
    pub fn is_classification_error(&self) -> bool {
        matches!(
            self,
            Error::MediaMismatch { .. } | Error::UnsupportedCodec(_)
        )
    }
}
