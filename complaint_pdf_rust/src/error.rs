//! Error types for the complaint renderer
//!
//! Only [`RenderError::Validation`] and [`RenderError::Fault`] ever reach a
//! caller of [`crate::ComplaintRenderer::render`]. Font and image errors are
//! produced by the asset loaders and absorbed by the renderer, which falls
//! back to the baseline font or skips the image.

use thiserror::Error;

/// Custom error type for renderer operations
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid complaint: {0}")]
    Validation(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("PDF generation error: {0}")]
    Fault(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// True for errors caused by the caller's input rather than the renderer.
    pub fn is_validation(&self) -> bool {
        matches!(self, RenderError::Validation(_))
    }
}

/// Result type alias for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Image(err.to_string())
    }
}

impl From<ttf_parser::FaceParsingError> for RenderError {
    fn from(err: ttf_parser::FaceParsingError) -> Self {
        RenderError::Font(err.to_string())
    }
}
