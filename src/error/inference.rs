// Inference error types and constants

use crate::error::{AudioError, ErrorCode, FeatureError};
use log::error;
use std::fmt;

/// Inference error code constants
///
/// Error code range: 5001-5005
pub struct InferenceErrorCodes {}

impl InferenceErrorCodes {
    /// Feature extraction failed for the uploaded clip
    pub const FEATURE: i32 = 5001;

    /// Uploaded audio could not be decoded
    pub const DECODE: i32 = 5002;

    /// No classifier loaded in the model handle
    pub const MODEL_NOT_LOADED: i32 = 5003;

    /// Classifier returned a score vector of unexpected length
    pub const SCORE_SHAPE: i32 = 5004;

    /// Classifier failed to load or evaluate
    pub const MODEL: i32 = 5005;
}

/// Log an inference error with structured context
pub fn log_inference_error(err: &InferenceError, context: &str) {
    error!(
        "Inference error in {}: code={}, component=InferencePipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Online inference errors
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    Feature(FeatureError),
    Decode { details: String },
    ModelNotLoaded,
    ScoreShape { expected: usize, actual: usize },
    Model { details: String },
}

impl ErrorCode for InferenceError {
    fn code(&self) -> i32 {
        match self {
            InferenceError::Feature(_) => InferenceErrorCodes::FEATURE,
            InferenceError::Decode { .. } => InferenceErrorCodes::DECODE,
            InferenceError::ModelNotLoaded => InferenceErrorCodes::MODEL_NOT_LOADED,
            InferenceError::ScoreShape { .. } => InferenceErrorCodes::SCORE_SHAPE,
            InferenceError::Model { .. } => InferenceErrorCodes::MODEL,
        }
    }

    fn message(&self) -> String {
        match self {
            InferenceError::Feature(inner) => format!("Feature extraction: {}", inner.message()),
            InferenceError::Decode { details } => format!("Failed to decode upload: {}", details),
            InferenceError::ModelNotLoaded => "No classifier loaded".to_string(),
            InferenceError::ScoreShape { expected, actual } => {
                format!(
                    "Classifier returned {} scores, expected {}",
                    actual, expected
                )
            }
            InferenceError::Model { details } => format!("Classifier error: {}", details),
        }
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InferenceError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InferenceError {}

impl From<AudioError> for InferenceError {
    fn from(err: AudioError) -> Self {
        InferenceError::Decode {
            details: err.message(),
        }
    }
}

impl From<FeatureError> for InferenceError {
    fn from(err: FeatureError) -> Self {
        InferenceError::Feature(err)
    }
}
