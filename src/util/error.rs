//! Error types for nutriscan.

use thiserror::Error;

/// Result alias for nutriscan operations.
pub type Result<T> = std::result::Result<T, NutriScanError>;

/// Errors that can occur while turning model output into detection records.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NutriScanError {
    /// No model is attached, or the model produced no output tensor.
    #[error("model unavailable: no raw output tensor to decode")]
    ModelUnavailable,
    /// A kept class label has no entry in the nutrition table.
    #[error("no nutrition entry for label {label:?}")]
    Lookup { label: String },
    /// Tensor length or class count disagrees with the declared layout.
    #[error("tensor shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    /// A dimension is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The provided buffer is smaller than the declared layout.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Row stride is shorter than a row of pixels.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The class label list cannot be used.
    #[error("invalid class labels: {reason}")]
    InvalidLabels { reason: String },
    /// The nutrition table could not be read or parsed.
    #[error("nutrition table error: {reason}")]
    NutritionTable { reason: String },
    /// The inference runtime failed.
    #[error("inference failed: {reason}")]
    Inference { reason: String },
    /// The detection was superseded by a newer request.
    #[error("detection cancelled by a newer request")]
    Cancelled,
    /// Image decoding failed.
    #[error("image I/O error: {reason}")]
    ImageIo { reason: String },
}
