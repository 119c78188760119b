// Classifier boundary and the nearest-centroid baseline
//
// `GenreClassifier` is the seam the serving path talks to: a batch of
// (frames, n_mfcc + n_mels) tensors in, one probability-like score vector per
// item out. Any model honoring that contract can sit behind a `ModelHandle`.
//
// `CentroidClassifier` is a small baseline implementation: each tensor is
// averaged over time, standardized per coefficient, and scored by a softmax
// over negative distances to per-class centroids.

use std::fs;
use std::path::Path;

use ndarray::{Array1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::analysis::InferenceBatch;
use crate::dataset::TrainingSet;
use crate::error::{DatasetError, InferenceError};

/// Model contract used by the inference pipeline and the HTTP layer
pub trait GenreClassifier: Send + Sync {
    /// Number of scores produced per item
    fn class_count(&self) -> usize;

    /// Class names in score order, when the model carries them
    fn labels(&self) -> Option<&[String]> {
        None
    }

    /// Expected (frames, width) of each item, when the model is shape-bound
    fn input_shape(&self) -> Option<(usize, usize)> {
        None
    }

    /// Score every item of `batch`; each inner vector sums to 1
    fn predict(&self, batch: &InferenceBatch) -> Result<Vec<Vec<f32>>, InferenceError>;
}

/// Nearest-centroid classifier over time-averaged feature tensors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidClassifier {
    pub labels: Vec<String>,
    pub frames: usize,
    pub width: usize,
    /// Per-coefficient mean used for standardization
    pub mean: Vec<f32>,
    /// Per-coefficient standard deviation (floored away from zero)
    pub scale: Vec<f32>,
    /// One standardized centroid per class, in label order
    pub centroids: Vec<Vec<f32>>,
}

const MIN_SCALE: f32 = 1e-6;

impl CentroidClassifier {
    /// Fit centroids from a training set
    ///
    /// # Errors
    /// - `EmptyDataset` for an empty set
    /// - `MissingLabel` when a mapped class has no samples
    pub fn fit(set: &TrainingSet) -> Result<Self, DatasetError> {
        let (samples, frames, width) = set.shape();
        if samples == 0 {
            return Err(DatasetError::EmptyDataset);
        }

        let pooled: Vec<Array1<f32>> = (0..samples)
            .map(|i| time_average(set.inputs.item(i)))
            .collect();

        let mut mean = Array1::<f32>::zeros(width);
        for vector in &pooled {
            mean += vector;
        }
        mean /= samples as f32;

        let mut variance = Array1::<f32>::zeros(width);
        for vector in &pooled {
            let diff = vector - &mean;
            variance += &(&diff * &diff);
        }
        variance /= samples as f32;
        let scale = variance.mapv(|v| v.sqrt().max(MIN_SCALE));

        let classes = set.mapping.len();
        let mut sums = vec![Array1::<f32>::zeros(width); classes];
        let mut counts = vec![0usize; classes];
        for (vector, &label) in pooled.iter().zip(&set.labels) {
            let standardized = (vector - &mean) / &scale;
            sums[label] += &standardized;
            counts[label] += 1;
        }

        let mut centroids = Vec::with_capacity(classes);
        for (label, (sum, count)) in sums.into_iter().zip(counts).enumerate() {
            if count == 0 {
                return Err(DatasetError::MissingLabel {
                    label: set.mapping.get(label).unwrap_or_default().to_string(),
                });
            }
            centroids.push((sum / count as f32).to_vec());
        }

        tracing::info!(
            "[CentroidClassifier] Fitted {} classes on {} samples of shape ({}, {})",
            classes,
            samples,
            frames,
            width
        );

        Ok(Self {
            labels: set.mapping.names().to_vec(),
            frames,
            width,
            mean: mean.to_vec(),
            scale: scale.to_vec(),
            centroids,
        })
    }

    /// Scores for a single (frames, width) item
    pub fn score(&self, item: ArrayView2<'_, f32>) -> Result<Vec<f32>, InferenceError> {
        if item.dim() != (self.frames, self.width) {
            return Err(InferenceError::Model {
                details: format!(
                    "input shape {:?} does not match trained shape ({}, {})",
                    item.dim(),
                    self.frames,
                    self.width
                ),
            });
        }

        let pooled = time_average(item);
        let standardized: Vec<f32> = pooled
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((v, m), s)| (v - m) / s)
            .collect();

        let norm = (self.width as f32).sqrt();
        let logits: Vec<f32> = self
            .centroids
            .iter()
            .map(|centroid| {
                let distance = centroid
                    .iter()
                    .zip(&standardized)
                    .map(|(c, v)| (c - v) * (c - v))
                    .sum::<f32>()
                    .sqrt();
                -distance / norm
            })
            .collect();

        Ok(softmax(&logits))
    }

    /// Fraction of items in `set` whose arg-max matches the label
    pub fn accuracy(&self, set: &TrainingSet) -> Result<f32, InferenceError> {
        if set.labels.is_empty() {
            return Ok(0.0);
        }
        let scores = self.predict(&set.inputs)?;
        let correct = scores
            .iter()
            .zip(&set.labels)
            .filter(|(row, label)| argmax(row) == Some(**label))
            .count();
        Ok(correct as f32 / set.labels.len() as f32)
    }

    pub fn save(&self, path: &Path) -> Result<(), InferenceError> {
        let json = serde_json::to_string(self).map_err(|e| InferenceError::Model {
            details: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| InferenceError::Model {
            details: format!("failed to write {}: {}", path.display(), e),
        })
    }

    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let json = fs::read_to_string(path).map_err(|e| InferenceError::Model {
            details: format!("failed to read {}: {}", path.display(), e),
        })?;
        let model: Self = serde_json::from_str(&json).map_err(|e| InferenceError::Model {
            details: format!("failed to parse {}: {}", path.display(), e),
        })?;

        if model.centroids.len() != model.labels.len()
            || model.mean.len() != model.width
            || model.scale.len() != model.width
            || model.centroids.iter().any(|c| c.len() != model.width)
        {
            return Err(InferenceError::Model {
                details: format!("inconsistent model file {}", path.display()),
            });
        }
        Ok(model)
    }
}

impl GenreClassifier for CentroidClassifier {
    fn class_count(&self) -> usize {
        self.labels.len()
    }

    fn labels(&self) -> Option<&[String]> {
        Some(&self.labels)
    }

    fn input_shape(&self) -> Option<(usize, usize)> {
        Some((self.frames, self.width))
    }

    fn predict(&self, batch: &InferenceBatch) -> Result<Vec<Vec<f32>>, InferenceError> {
        (0..batch.len()).map(|i| self.score(batch.item(i))).collect()
    }
}

fn time_average(item: ArrayView2<'_, f32>) -> Array1<f32> {
    item.mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(item.ncols()))
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Index of the first maximum
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
