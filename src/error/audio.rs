// Audio decode and resampling error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 2001-2005
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// File could not be opened or read
    pub const IO: i32 = 2001;

    /// Container or sample data is corrupt
    pub const DECODE: i32 = 2002;

    /// Bit depth / channel layout not handled by the loader
    pub const UNSUPPORTED_FORMAT: i32 = 2003;

    /// Sample-rate conversion failed
    pub const RESAMPLE: i32 = 2004;

    /// Decoded stream holds no samples
    pub const EMPTY_AUDIO: i32 = 2005;
}

/// Audio decode errors
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    Io { source: String, details: String },
    Decode { source: String, details: String },
    UnsupportedFormat { source: String, details: String },
    Resample { details: String },
    EmptyAudio { source: String },
}

impl AudioError {
    /// Name of the file or upload the error refers to, if any
    pub fn source_name(&self) -> Option<&str> {
        match self {
            AudioError::Io { source, .. }
            | AudioError::Decode { source, .. }
            | AudioError::UnsupportedFormat { source, .. }
            | AudioError::EmptyAudio { source } => Some(source),
            AudioError::Resample { .. } => None,
        }
    }
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::Io { .. } => AudioErrorCodes::IO,
            AudioError::Decode { .. } => AudioErrorCodes::DECODE,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::Resample { .. } => AudioErrorCodes::RESAMPLE,
            AudioError::EmptyAudio { .. } => AudioErrorCodes::EMPTY_AUDIO,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::Io { source, details } => {
                format!("Failed to read {}: {}", source, details)
            }
            AudioError::Decode { source, details } => {
                format!("Failed to decode {}: {}", source, details)
            }
            AudioError::UnsupportedFormat { source, details } => {
                format!("Unsupported audio format in {}: {}", source, details)
            }
            AudioError::Resample { details } => format!("Resampling failed: {}", details),
            AudioError::EmptyAudio { source } => format!("{} contains no samples", source),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}
