// Analysis error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Analysis error code constants
///
/// Single source of truth for the numeric codes reported by
/// [`AnalysisError::code`].
///
/// Error code range: 3001-3006
pub struct AnalysisErrorCodes {}

impl AnalysisErrorCodes {
    /// Frame has a zero dimension
    pub const EMPTY_FRAME: i32 = 3001;

    /// Pixel buffer length does not match the frame dimensions
    pub const BUFFER_MISMATCH: i32 = 3002;

    /// Cluster count must be within [1, 256]
    pub const INVALID_CLUSTER_COUNT: i32 = 3003;

    /// Threshold outside the 8-bit channel range
    pub const THRESHOLD_OUT_OF_RANGE: i32 = 3004;

    /// Iteration, restart, or normalization parameter is unusable
    pub const INVALID_PARAMETER: i32 = 3005;

    /// Frame could not be decoded from an image source
    pub const DECODE_FAILED: i32 = 3006;
}

/// Log an analysis error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_analysis_error(err: &AnalysisError, context: &str) {
    error!(
        "Analysis error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised synchronously at the analysis call boundary
///
/// Degenerate frames (too few chromatic or saturated pixels) are never
/// errors; they produce the documented sentinel results instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Frame width or height is zero
    EmptyFrame { width: u32, height: u32 },

    /// Pixel buffer does not hold `width * height` pixels
    BufferMismatch { expected: usize, actual: usize },

    /// k-means needs between 1 and 256 clusters
    InvalidClusterCount { clusters: usize },

    /// A threshold fell outside [0, 255]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    /// A numeric parameter is zero, negative, or not finite
    InvalidParameter { name: &'static str, reason: String },

    /// Image source could not be decoded into a frame
    DecodeFailed { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::EmptyFrame { .. } => AnalysisErrorCodes::EMPTY_FRAME,
            AnalysisError::BufferMismatch { .. } => AnalysisErrorCodes::BUFFER_MISMATCH,
            AnalysisError::InvalidClusterCount { .. } => {
                AnalysisErrorCodes::INVALID_CLUSTER_COUNT
            }
            AnalysisError::ThresholdOutOfRange { .. } => {
                AnalysisErrorCodes::THRESHOLD_OUT_OF_RANGE
            }
            AnalysisError::InvalidParameter { .. } => AnalysisErrorCodes::INVALID_PARAMETER,
            AnalysisError::DecodeFailed { .. } => AnalysisErrorCodes::DECODE_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::EmptyFrame { width, height } => {
                format!("Frame must be at least 1x1 (got {}x{})", width, height)
            }
            AnalysisError::BufferMismatch { expected, actual } => {
                format!(
                    "Pixel buffer mismatch: expected {} pixels, got {}",
                    expected, actual
                )
            }
            AnalysisError::InvalidClusterCount { clusters } => {
                format!("Cluster count must be within [1, 256] (got {})", clusters)
            }
            AnalysisError::ThresholdOutOfRange { name, value } => {
                format!("Threshold {} must be within [0, 255] (got {})", name, value)
            }
            AnalysisError::InvalidParameter { name, reason } => {
                format!("Invalid parameter {}: {}", name, reason)
            }
            AnalysisError::DecodeFailed { reason } => {
                format!("Failed to decode frame: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}

impl From<image::ImageError> for AnalysisError {
    fn from(err: image::ImageError) -> Self {
        AnalysisError::DecodeFailed {
            reason: err.to_string(),
        }
    }
}

/// Validate an 8-bit threshold
pub(crate) fn check_threshold(name: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && (0.0..=255.0).contains(&value) {
        Ok(())
    } else {
        Err(AnalysisError::ThresholdOutOfRange { name, value })
    }
}

/// Validate a strictly positive, finite constant
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), AnalysisError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter {
            name,
            reason: format!("must be finite and > 0 (got {})", value),
        })
    }
}
