// Error types for the genre feature pipeline
//
// This module defines custom error types for audio decoding, feature
// extraction, dataset construction and inference, each carrying a stable
// numeric code so the CLI and HTTP layers can report failures consistently.

mod audio;
mod dataset;
mod feature;
mod inference;

pub use audio::{AudioError, AudioErrorCodes};
pub use dataset::{log_dataset_error, DatasetError, DatasetErrorCodes};
pub use feature::{log_feature_error, FeatureError, FeatureErrorCodes};
pub use inference::{log_inference_error, InferenceError, InferenceErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and HTTP boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
