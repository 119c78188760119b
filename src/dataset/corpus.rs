// Corpus - the serializable training set produced by the dataset builder
//
// On disk the corpus is one JSON document with four fields:
//   mapping          ordered class names
//   labels           one label id per accepted segment
//   mfcc             per segment, a (frame, n_mfcc) matrix
//   mel_spectrogram  per segment, a (frame, n_mels) matrix
// The three per-segment sequences are parallel and always equally long.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use super::labels::LabelMapping;
use crate::analysis::{AlignedFeatureTensor, AlignedWindow, InferenceBatch};
use crate::error::DatasetError;

/// Row-major nested matrix as stored in JSON
pub type NestedMatrix = Vec<Vec<f32>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    pub mapping: LabelMapping,
    pub labels: Vec<usize>,
    pub mfcc: Vec<NestedMatrix>,
    pub mel_spectrogram: Vec<NestedMatrix>,
}

/// Class counts and feature shapes of a corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusSummary {
    pub samples: usize,
    pub classes: Vec<ClassCount>,
    pub frames: Option<usize>,
    pub mfcc_width: Option<usize>,
    pub mel_width: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassCount {
    pub label: usize,
    pub name: String,
    pub samples: usize,
}

/// Inputs and labels ready for a classifier
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// (samples, frames, n_mfcc + n_mels)
    pub inputs: InferenceBatch,
    pub labels: Vec<usize>,
    pub mapping: LabelMapping,
}

impl Corpus {
    pub fn new(mapping: LabelMapping) -> Self {
        Self {
            mapping,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Append one accepted segment
    pub fn push(&mut self, label: usize, window: &AlignedWindow) {
        self.labels.push(label);
        self.mfcc.push(to_nested(window.mfcc.view()));
        self.mel_spectrogram.push(to_nested(window.mel.view()));
    }

    /// Check the parallel-sequence and shape invariants
    ///
    /// # Errors
    /// `SchemaMismatch` describing the first violation found
    pub fn validate(&self) -> Result<(), DatasetError> {
        if self.mfcc.len() != self.mel_spectrogram.len() || self.mfcc.len() != self.labels.len() {
            return Err(DatasetError::SchemaMismatch {
                details: format!(
                    "{} mfcc matrices, {} mel matrices, {} labels",
                    self.mfcc.len(),
                    self.mel_spectrogram.len(),
                    self.labels.len()
                ),
            });
        }

        if let Some(&label) = self.labels.iter().find(|&&l| l >= self.mapping.len()) {
            return Err(DatasetError::SchemaMismatch {
                details: format!(
                    "label {} outside mapping of {} classes",
                    label,
                    self.mapping.len()
                ),
            });
        }

        let mut reference: Option<(usize, usize, usize)> = None;
        for (i, (mfcc, mel)) in self.mfcc.iter().zip(&self.mel_spectrogram).enumerate() {
            let shape = (mfcc.len(), width(mfcc, i, "mfcc")?, width(mel, i, "mel")?);
            if mel.len() != mfcc.len() {
                return Err(DatasetError::SchemaMismatch {
                    details: format!(
                        "sample {}: mfcc has {} frames, mel has {}",
                        i,
                        mfcc.len(),
                        mel.len()
                    ),
                });
            }
            match reference {
                None => reference = Some(shape),
                Some(expected) if expected != shape => {
                    return Err(DatasetError::SchemaMismatch {
                        details: format!(
                            "sample {} has shape {:?}, expected {:?}",
                            i, shape, expected
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// Write the corpus as JSON
    pub fn save(&self, path: &Path) -> Result<(), DatasetError> {
        let file = File::create(path).map_err(|e| io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|e| io_error(path, e))?;
        tracing::info!(
            "[Corpus] Saved {} samples ({} classes) to {}",
            self.len(),
            self.mapping.len(),
            path.display()
        );
        Ok(())
    }

    /// Read and validate a corpus JSON file
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let corpus: Corpus = serde_json::from_reader(BufReader::new(file))?;
        corpus.validate()?;
        Ok(corpus)
    }

    pub fn summary(&self) -> CorpusSummary {
        let classes = self
            .mapping
            .names()
            .iter()
            .enumerate()
            .map(|(label, name)| ClassCount {
                label,
                name: name.clone(),
                samples: self.labels.iter().filter(|&&l| l == label).count(),
            })
            .collect();

        CorpusSummary {
            samples: self.len(),
            classes,
            frames: self.mfcc.first().map(Vec::len),
            mfcc_width: self.mfcc.first().and_then(|m| m.first()).map(Vec::len),
            mel_width: self
                .mel_spectrogram
                .first()
                .and_then(|m| m.first())
                .map(Vec::len),
        }
    }

    /// Concatenate each sample's MFCC and mel matrices into aligned tensors
    pub fn tensors(&self) -> Result<Vec<AlignedFeatureTensor>, DatasetError> {
        self.validate()?;
        self.mfcc
            .iter()
            .zip(&self.mel_spectrogram)
            .enumerate()
            .map(|(i, (mfcc, mel))| -> Result<AlignedFeatureTensor, DatasetError> {
                let mfcc = to_array(mfcc, i, "mfcc")?;
                let mel = to_array(mel, i, "mel")?;
                Ok(AlignedFeatureTensor::from_frame_major(
                    mfcc.view(),
                    mel.view(),
                )?)
            })
            .collect()
    }

    /// Training inputs of shape (samples, frames, n_mfcc + n_mels) plus labels
    ///
    /// # Errors
    /// `SchemaMismatch` when the collections disagree, `EmptyDataset` when
    /// there is nothing to train on
    pub fn training_set(&self) -> Result<TrainingSet, DatasetError> {
        if self.is_empty() && self.mfcc.is_empty() && self.mel_spectrogram.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        let tensors = self.tensors()?;
        Ok(TrainingSet {
            inputs: InferenceBatch::from_tensors(&tensors)?,
            labels: self.labels.clone(),
            mapping: self.mapping.clone(),
        })
    }

    /// Subset of samples by index, mapping unchanged
    pub fn select(&self, indices: &[usize]) -> Corpus {
        Corpus {
            mapping: self.mapping.clone(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            mfcc: indices.iter().map(|&i| self.mfcc[i].clone()).collect(),
            mel_spectrogram: indices
                .iter()
                .map(|&i| self.mel_spectrogram[i].clone())
                .collect(),
        }
    }
}

impl TrainingSet {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.inputs.shape()
    }

    pub fn as_array(&self) -> &Array3<f32> {
        self.inputs.as_array()
    }
}

fn to_nested(matrix: ArrayView2<'_, f32>) -> NestedMatrix {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

fn width(matrix: &NestedMatrix, sample: usize, kind: &str) -> Result<usize, DatasetError> {
    let cols = matrix.first().map(Vec::len).unwrap_or(0);
    if matrix.iter().any(|row| row.len() != cols) {
        return Err(DatasetError::SchemaMismatch {
            details: format!("sample {}: ragged {} rows", sample, kind),
        });
    }
    Ok(cols)
}

fn to_array(matrix: &NestedMatrix, sample: usize, kind: &str) -> Result<Array2<f32>, DatasetError> {
    let cols = width(matrix, sample, kind)?;
    let flat: Vec<f32> = matrix.iter().flatten().copied().collect();
    Array2::from_shape_vec((matrix.len(), cols), flat).map_err(|e| DatasetError::SchemaMismatch {
        details: format!("sample {}: {} matrix: {}", sample, kind, e),
    })
}

fn io_error(path: &Path, err: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.display().to_string(),
        details: err.to_string(),
    }
}
