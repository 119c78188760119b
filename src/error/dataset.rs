// Dataset error types and constants

use crate::error::{AudioError, ErrorCode, FeatureError};
use log::warn;
use std::fmt;

/// Dataset error code constants
///
/// Error code range: 4001-4009
pub struct DatasetErrorCodes {}

impl DatasetErrorCodes {
    /// Filesystem access failed
    pub const IO: i32 = 4001;

    /// Audio file could not be decoded
    pub const DECODE: i32 = 4002;

    /// Audio container or sample layout is not supported
    pub const UNSUPPORTED_FORMAT: i32 = 4003;

    /// A class directory is not part of the configured label set
    pub const UNEXPECTED_LABEL: i32 = 4004;

    /// Corpus collections disagree in length or shape
    pub const SCHEMA_MISMATCH: i32 = 4005;

    /// Corpus JSON could not be (de)serialized
    pub const SERIALIZATION: i32 = 4006;

    /// No samples were accepted or the corpus is empty
    pub const EMPTY_DATASET: i32 = 4007;

    /// A configured label has no directory on disk
    pub const MISSING_LABEL: i32 = 4008;

    /// Feature or segmentation parameters are unusable
    pub const INVALID_CONFIG: i32 = 4009;
}

/// Log a recoverable dataset error (skipped file) with structured context
pub fn log_dataset_error(err: &DatasetError, context: &str) {
    warn!(
        "Dataset error in {}: code={}, component=DatasetBuilder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Dataset construction and corpus loading errors
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// Filesystem error (missing root, unreadable directory, write failure)
    Io { path: String, details: String },

    /// Audio decode failure for a single file
    Decode { path: String, details: String },

    /// Unsupported audio layout
    UnsupportedFormat { path: String, details: String },

    /// Directory name outside the validated label enumeration
    UnexpectedLabel { label: String },

    /// Data-integrity failure between corpus collections
    SchemaMismatch { details: String },

    /// JSON encode/decode failure
    Serialization { details: String },

    /// Nothing to work with
    EmptyDataset,

    /// Configured label absent from the dataset root
    MissingLabel { label: String },

    /// Rejected configuration parameter
    InvalidConfig { details: String },
}

impl ErrorCode for DatasetError {
    fn code(&self) -> i32 {
        match self {
            DatasetError::Io { .. } => DatasetErrorCodes::IO,
            DatasetError::Decode { .. } => DatasetErrorCodes::DECODE,
            DatasetError::UnsupportedFormat { .. } => DatasetErrorCodes::UNSUPPORTED_FORMAT,
            DatasetError::UnexpectedLabel { .. } => DatasetErrorCodes::UNEXPECTED_LABEL,
            DatasetError::SchemaMismatch { .. } => DatasetErrorCodes::SCHEMA_MISMATCH,
            DatasetError::Serialization { .. } => DatasetErrorCodes::SERIALIZATION,
            DatasetError::EmptyDataset => DatasetErrorCodes::EMPTY_DATASET,
            DatasetError::MissingLabel { .. } => DatasetErrorCodes::MISSING_LABEL,
            DatasetError::InvalidConfig { .. } => DatasetErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            DatasetError::Io { path, details } => {
                format!("I/O error at {}: {}", path, details)
            }
            DatasetError::Decode { path, details } => {
                format!("Failed to decode {}: {}", path, details)
            }
            DatasetError::UnsupportedFormat { path, details } => {
                format!("Unsupported audio format in {}: {}", path, details)
            }
            DatasetError::UnexpectedLabel { label } => {
                format!("Unexpected class directory '{}'", label)
            }
            DatasetError::SchemaMismatch { details } => {
                format!("Corpus schema mismatch: {}", details)
            }
            DatasetError::Serialization { details } => {
                format!("Corpus serialization failed: {}", details)
            }
            DatasetError::EmptyDataset => "Dataset contains no samples".to_string(),
            DatasetError::MissingLabel { label } => {
                format!("Configured label '{}' has no directory", label)
            }
            DatasetError::InvalidConfig { details } => {
                format!("Invalid dataset configuration: {}", details)
            }
        }
    }
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DatasetError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DatasetError {}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Serialization {
            details: err.to_string(),
        }
    }
}

impl From<AudioError> for DatasetError {
    fn from(err: AudioError) -> Self {
        let path = err.source_name().unwrap_or("<memory>").to_string();
        match err {
            AudioError::Io { details, .. } => DatasetError::Io { path, details },
            AudioError::UnsupportedFormat { details, .. } => {
                DatasetError::UnsupportedFormat { path, details }
            }
            other => DatasetError::Decode {
                path,
                details: other.message(),
            },
        }
    }
}

impl From<FeatureError> for DatasetError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::InvalidParameter { .. } => DatasetError::InvalidConfig {
                details: err.message(),
            },
            other => DatasetError::SchemaMismatch {
                details: other.message(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_error_codes() {
        assert_eq!(
            DatasetError::Io {
                path: "a".into(),
                details: "b".into()
            }
            .code(),
            4001
        );
        assert_eq!(
            DatasetError::Decode {
                path: "a".into(),
                details: "b".into()
            }
            .code(),
            4002
        );
        assert_eq!(
            DatasetError::UnexpectedLabel {
                label: "jazz".into()
            }
            .code(),
            4004
        );
        assert_eq!(
            DatasetError::SchemaMismatch {
                details: "x".into()
            }
            .code(),
            4005
        );
        assert_eq!(DatasetError::EmptyDataset.code(), 4007);
    }

    #[test]
    fn test_serde_error_conversion() {
        let json_err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let err: DatasetError = json_err.into();
        assert_eq!(err.code(), DatasetErrorCodes::SERIALIZATION);
    }

    #[test]
    fn test_feature_error_becomes_schema_mismatch() {
        let err: DatasetError = FeatureError::FrameMismatch {
            expected: 130,
            actual: 12,
        }
        .into();
        match err {
            DatasetError::SchemaMismatch { details } => assert!(details.contains("130")),
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_parameter_is_config_error() {
        let err: DatasetError = FeatureError::InvalidParameter {
            name: "hop_length",
            value: 0,
        }
        .into();
        assert_eq!(err.code(), DatasetErrorCodes::INVALID_CONFIG);
        assert!(err.message().contains("hop_length"));
    }

    #[test]
    fn test_audio_error_keeps_path() {
        let err: DatasetError = AudioError::Decode {
            source: "blues/a.wav".into(),
            details: "truncated".into(),
        }
        .into();
        match err {
            DatasetError::Decode { path, .. } => assert_eq!(path, "blues/a.wav"),
            other => panic!("Expected Decode, got {:?}", other),
        }
    }
}
