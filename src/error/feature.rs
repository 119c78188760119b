// Feature extraction error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Feature error code constants
///
/// Error code range: 3001-3005
pub struct FeatureErrorCodes {}

impl FeatureErrorCodes {
    /// Sample buffer was empty (zero-length segment or clip)
    pub const EMPTY_INPUT: i32 = 3001;

    /// Transform parameter is out of range (zero hop, zero FFT size, ...)
    pub const INVALID_PARAMETER: i32 = 3002;

    /// Two matrices that must share a frame axis disagree on frame count
    pub const FRAME_MISMATCH: i32 = 3003;

    /// Transform produced NaN or infinite values
    pub const NON_FINITE_OUTPUT: i32 = 3004;

    /// Matrix width or layout does not match the configured coefficient count
    pub const SHAPE_MISMATCH: i32 = 3005;
}

/// Log a feature error with structured context
///
/// Emits error_code, component and message fields so failures can be
/// grepped out of dataset build logs.
pub fn log_feature_error(err: &FeatureError, context: &str) {
    error!(
        "Feature error in {}: code={}, component=SpectralTransform, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Feature extraction errors
///
/// These cover the spectral transform, frame alignment and tensor assembly.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureError {
    /// Empty sample buffer reached the spectral transform
    EmptyInput { context: String },

    /// Invalid transform parameter
    InvalidParameter { name: &'static str, value: usize },

    /// Frame counts differ where equality is required
    FrameMismatch { expected: usize, actual: usize },

    /// NaN/Inf detected in transform output
    NonFiniteOutput { stage: &'static str },

    /// Coefficient width does not match
    ShapeMismatch { expected: usize, actual: usize },
}

impl ErrorCode for FeatureError {
    fn code(&self) -> i32 {
        match self {
            FeatureError::EmptyInput { .. } => FeatureErrorCodes::EMPTY_INPUT,
            FeatureError::InvalidParameter { .. } => FeatureErrorCodes::INVALID_PARAMETER,
            FeatureError::FrameMismatch { .. } => FeatureErrorCodes::FRAME_MISMATCH,
            FeatureError::NonFiniteOutput { .. } => FeatureErrorCodes::NON_FINITE_OUTPUT,
            FeatureError::ShapeMismatch { .. } => FeatureErrorCodes::SHAPE_MISMATCH,
        }
    }

    fn message(&self) -> String {
        match self {
            FeatureError::EmptyInput { context } => {
                format!("Empty sample buffer in {}", context)
            }
            FeatureError::InvalidParameter { name, value } => {
                format!("Invalid parameter {} = {}", name, value)
            }
            FeatureError::FrameMismatch { expected, actual } => {
                format!(
                    "Frame count mismatch: expected {}, got {}",
                    expected, actual
                )
            }
            FeatureError::NonFiniteOutput { stage } => {
                format!("Non-finite values produced by {}", stage)
            }
            FeatureError::ShapeMismatch { expected, actual } => {
                format!(
                    "Coefficient width mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FeatureError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for FeatureError {}
