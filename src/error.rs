use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the scanning pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("could not load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    /// The detected corners do not admit a perspective transform.
    #[error("degenerate document boundary: {0}")]
    DegenerateQuad(String),

    #[error("text recognition failed: {0}")]
    OcrInvocation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
