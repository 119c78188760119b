//! Configuration management for the feature pipeline
//!
//! This module provides runtime configuration loading from JSON files so the
//! transform parameters, segmentation policy and serving thresholds can be
//! changed without recompilation. The same `FeatureConfig` value drives the
//! dataset builder and the inference pipeline; sharing it is what keeps the
//! offline and online tensors identical.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FeatureError;

/// Fixed pipeline sample rate in Hz
pub const SAMPLE_RATE: u32 = 22_050;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub serving: ServingConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Spectral transform and segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Sample rate every clip is resampled to before extraction
    pub sample_rate: u32,
    /// Nominal track length used to derive the segment size
    pub track_duration_s: u32,
    /// Number of cepstral coefficients kept per frame
    pub n_mfcc: usize,
    /// Number of mel bands
    pub n_mels: usize,
    /// STFT window size in samples
    pub n_fft: usize,
    /// Hop between frames in samples
    pub hop_length: usize,
    /// Segments per track in the offline path
    pub num_segments: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            track_duration_s: 30,
            n_mfcc: 13,
            n_mels: 128,
            n_fft: 2048,
            hop_length: 512,
            num_segments: 10,
        }
    }
}

impl FeatureConfig {
    /// Width of the concatenated (mfcc + mel) coefficient axis
    pub fn coefficient_union(&self) -> usize {
        self.n_mfcc + self.n_mels
    }

    /// Reject parameter combinations that would make the transform degenerate
    pub fn validate(&self) -> Result<(), FeatureError> {
        let checks: [(&'static str, usize); 7] = [
            ("sample_rate", self.sample_rate as usize),
            ("track_duration_s", self.track_duration_s as usize),
            ("n_mfcc", self.n_mfcc),
            ("n_mels", self.n_mels),
            ("n_fft", self.n_fft),
            ("hop_length", self.hop_length),
            ("num_segments", self.num_segments),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(FeatureError::InvalidParameter { name, value });
            }
        }
        if self.n_mfcc > self.n_mels {
            return Err(FeatureError::InvalidParameter {
                name: "n_mfcc",
                value: self.n_mfcc,
            });
        }
        Ok(())
    }
}

/// Online inference parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Seconds kept from the start of an uploaded clip
    pub clip_seconds: u32,
    /// Explicit target frame count; derived from `clip_seconds` when absent
    #[serde(default)]
    pub target_frames: Option<usize>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            clip_seconds: 3,
            target_frames: None,
        }
    }
}

impl InferenceConfig {
    /// Samples kept from an uploaded clip
    pub fn clip_samples(&self, features: &FeatureConfig) -> usize {
        features.sample_rate as usize * self.clip_seconds as usize
    }

    /// Target frame count handed to the frame aligner at inference time
    pub fn resolved_target_frames(&self, features: &FeatureConfig) -> usize {
        self.target_frames.unwrap_or_else(|| {
            self.clip_samples(features)
                .div_ceil(features.hop_length.max(1))
        })
    }
}

/// Serving boundary parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingConfig {
    /// Class names in classifier output order
    pub labels: Vec<String>,
    /// Fallback class that overrides the arg-max decision
    pub unknown_label: String,
    /// Percentage at or above which the fallback class wins
    pub unknown_threshold_percent: f32,
    /// Socket address for the HTTP server
    pub bind_addr: String,
    /// Token required for administrative routes
    pub admin_token: String,
    /// Classifier file loaded at startup
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            labels: vec![
                "blues".to_string(),
                "classical".to_string(),
                "unknown".to_string(),
            ],
            unknown_label: "unknown".to_string(),
            unknown_threshold_percent: 0.014,
            bind_addr: "127.0.0.1:5000".to_string(),
            admin_token: "genre-admin".to_string(),
            model_path: None,
        }
    }
}

/// Dataset walk parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Validated label enumeration; empty means "discover from directories"
    #[serde(default)]
    pub expected_labels: Vec<String>,
    /// Worker threads for per-file extraction (0 = available parallelism)
    #[serde(default)]
    pub workers: usize,
    /// File extensions treated as audio
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["wav".to_string()]
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            expected_labels: Vec::new(),
            workers: 0,
            extensions: default_extensions(),
        }
    }
}

impl DatasetConfig {
    /// Number of worker threads to spawn
    pub fn resolved_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration, or the defaults when the file is missing or
    /// invalid (a warning is logged in both cases)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Reject configurations the feature and inference pipelines cannot run
    pub fn validate(&self) -> Result<(), FeatureError> {
        self.features.validate()?;
        if self.inference.clip_seconds == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "clip_seconds",
                value: 0,
            });
        }
        if self.inference.target_frames == Some(0) {
            return Err(FeatureError::InvalidParameter {
                name: "target_frames",
                value: 0,
            });
        }
        Ok(())
    }

    /// Load from an optional path, defaulting when none is given
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::default(),
        }
    }
}
