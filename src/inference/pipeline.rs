// InferencePipeline - one uploaded clip to a (1, T_infer, n_mfcc + n_mels) batch
//
// Steps:
// 1. Decode and resample to the pipeline rate (audio::loader)
// 2. Keep the first `clip_seconds` of audio, no segmentation
// 3. FeaturePipeline with the PadAll policy (same transform code as the corpus)
// 4. Single-item batch handed to the classifier unchanged
// 5. DecisionPolicy turns the scores into a Prediction

use std::path::Path;

use super::classifier::GenreClassifier;
use super::prediction::{DecisionPolicy, Prediction};
use crate::analysis::{FeaturePipeline, InferenceBatch};
use crate::audio::{AudioClip, AudioLoader};
use crate::config::AppConfig;
use crate::error::{FeatureError, InferenceError};

pub struct InferencePipeline {
    features: FeaturePipeline,
    loader: AudioLoader,
    clip_samples: usize,
    width: usize,
    labels: Vec<String>,
    policy: DecisionPolicy,
}

impl InferencePipeline {
    pub fn new(config: &AppConfig) -> Result<Self, InferenceError> {
        let features = FeaturePipeline::for_inference(&config.features, &config.inference)?;
        let clip_samples = config.inference.clip_samples(&config.features);
        if clip_samples == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "clip_seconds",
                value: 0,
            }
            .into());
        }

        tracing::debug!(
            "[InferencePipeline] clip={} samples, target_frames={}",
            clip_samples,
            features.target_frames()
        );

        Ok(Self {
            features,
            loader: AudioLoader::new(config.features.sample_rate),
            clip_samples,
            width: config.features.coefficient_union(),
            labels: config.serving.labels.clone(),
            policy: DecisionPolicy::from_config(&config.serving),
        })
    }

    pub fn target_frames(&self) -> usize {
        self.features.target_frames()
    }

    pub fn clip_samples(&self) -> usize {
        self.clip_samples
    }

    /// Shape of every batch this pipeline produces
    pub fn batch_shape(&self) -> (usize, usize, usize) {
        (1, self.target_frames(), self.width)
    }

    /// Configured class names (used when the model carries none)
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Features for raw samples already at the pipeline rate
    pub fn prepare_samples(&self, samples: &[f32]) -> Result<InferenceBatch, InferenceError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptyInput {
                context: "inference clip".to_string(),
            }
            .into());
        }
        let head = &samples[..self.clip_samples.min(samples.len())];
        let tensor = self.features.tensor(head)?;
        Ok(tensor.into_batch())
    }

    pub fn prepare_clip(&self, clip: &AudioClip) -> Result<InferenceBatch, InferenceError> {
        if clip.sample_rate != self.loader.target_sample_rate() {
            return Err(InferenceError::Decode {
                details: format!(
                    "clip is {} Hz, pipeline expects {} Hz",
                    clip.sample_rate,
                    self.loader.target_sample_rate()
                ),
            });
        }
        self.prepare_samples(clip.head(self.clip_samples))
    }

    pub fn prepare_path(&self, path: &Path) -> Result<InferenceBatch, InferenceError> {
        let clip = self.loader.load_path(path)?;
        self.prepare_clip(&clip)
    }

    /// Features for an in-memory upload
    pub fn prepare_bytes(&self, bytes: &[u8], name: &str) -> Result<InferenceBatch, InferenceError> {
        let clip = self.loader.load_bytes(bytes, name)?;
        self.prepare_clip(&clip)
    }

    /// Run `model` on a prepared batch and apply the decision policy
    pub fn predict(
        &self,
        model: &dyn GenreClassifier,
        batch: &InferenceBatch,
    ) -> Result<Prediction, InferenceError> {
        let (_, frames, width) = batch.shape();
        if let Some(expected) = model.input_shape() {
            if expected != (frames, width) {
                return Err(InferenceError::Model {
                    details: format!(
                        "model expects ({}, {}) inputs, pipeline produced ({}, {})",
                        expected.0, expected.1, frames, width
                    ),
                });
            }
        }

        let scores = model.predict(batch)?;
        let [row] = scores.as_slice() else {
            return Err(InferenceError::ScoreShape {
                expected: 1,
                actual: scores.len(),
            });
        };
        if row.len() != model.class_count() {
            return Err(InferenceError::ScoreShape {
                expected: model.class_count(),
                actual: row.len(),
            });
        }

        let labels = model.labels().unwrap_or(self.labels.as_slice());
        self.policy.decide(row, labels)
    }

    pub fn classify_path(
        &self,
        model: &dyn GenreClassifier,
        path: &Path,
    ) -> Result<Prediction, InferenceError> {
        let batch = self.prepare_path(path)?;
        self.predict(model, &batch)
    }

    pub fn classify_bytes(
        &self,
        model: &dyn GenreClassifier,
        bytes: &[u8],
        name: &str,
    ) -> Result<Prediction, InferenceError> {
        let batch = self.prepare_bytes(bytes, name)?;
        self.predict(model, &batch)
    }
}
