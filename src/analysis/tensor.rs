// Aligned feature tensors handed to the classifier
//
// Canonical layout: (frame, coefficient) with the MFCC columns first and the
// mel columns after them. Both the corpus loader (concatenating stored
// frame-major matrices) and the inference path (stacking coefficient-major
// matrices) build tensors through this module, so the two layouts cannot
// drift apart.

use ndarray::{concatenate, Array2, Array3, ArrayView2, Axis};

use super::features::FeatureMatrix;
use crate::error::FeatureError;

/// (frame, mfcc + mel) tensor for one window of audio
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFeatureTensor {
    data: Array2<f32>,
    n_mfcc: usize,
}

impl AlignedFeatureTensor {
    /// Concatenate frame-major matrices along the coefficient axis
    ///
    /// # Arguments
    /// * `mfcc` - shape (frames, n_mfcc)
    /// * `mel` - shape (frames, n_mels)
    ///
    /// # Errors
    /// `FrameMismatch` when the frame counts differ; nothing is truncated
    pub fn from_frame_major<'a>(
        mfcc: ArrayView2<'a, f32>,
        mel: ArrayView2<'a, f32>,
    ) -> Result<Self, FeatureError> {
        if mfcc.nrows() != mel.nrows() {
            return Err(FeatureError::FrameMismatch {
                expected: mfcc.nrows(),
                actual: mel.nrows(),
            });
        }

        let data = concatenate(Axis(1), &[mfcc, mel]).map_err(|_| {
            FeatureError::FrameMismatch {
                expected: mfcc.nrows(),
                actual: mel.nrows(),
            }
        })?;

        Ok(Self {
            data,
            n_mfcc: mfcc.ncols(),
        })
    }

    /// Stack MFCC rows above mel rows (coefficient-major) and transpose
    ///
    /// # Arguments
    /// * `mfcc` - shape (n_mfcc, frames)
    /// * `mel` - shape (n_mels, frames)
    pub fn stack(mfcc: &FeatureMatrix, mel: &FeatureMatrix) -> Result<Self, FeatureError> {
        if mfcc.ncols() != mel.ncols() {
            return Err(FeatureError::FrameMismatch {
                expected: mfcc.ncols(),
                actual: mel.ncols(),
            });
        }
        Self::from_frame_major(mfcc.t(), mel.t())
    }

    pub fn frames(&self) -> usize {
        self.data.nrows()
    }

    /// Width of the coefficient axis (n_mfcc + n_mels)
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn n_mfcc(&self) -> usize {
        self.n_mfcc
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f32> {
        self.data
    }

    /// Reshape into a single-item batch of shape (1, frames, width)
    pub fn into_batch(self) -> InferenceBatch {
        InferenceBatch {
            data: self.data.insert_axis(Axis(0)),
        }
    }
}

/// (batch, frame, coefficient) tensor accepted by classifiers
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceBatch {
    data: Array3<f32>,
}

impl InferenceBatch {
    /// Stack equally shaped tensors into one batch
    pub fn from_tensors(tensors: &[AlignedFeatureTensor]) -> Result<Self, FeatureError> {
        let Some(first) = tensors.first() else {
            return Err(FeatureError::EmptyInput {
                context: "batch".to_string(),
            });
        };
        for tensor in tensors {
            if tensor.frames() != first.frames() {
                return Err(FeatureError::FrameMismatch {
                    expected: first.frames(),
                    actual: tensor.frames(),
                });
            }
            if tensor.width() != first.width() {
                return Err(FeatureError::ShapeMismatch {
                    expected: first.width(),
                    actual: tensor.width(),
                });
            }
        }

        let views: Vec<_> = tensors.iter().map(|t| t.data.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(|_| FeatureError::ShapeMismatch {
            expected: first.width(),
            actual: 0,
        })?;
        Ok(Self { data })
    }

    /// (batch, frames, width)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_array(&self) -> &Array3<f32> {
        &self.data
    }

    /// View of one item as (frames, width)
    pub fn item(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn matrix(rows: usize, cols: usize, offset: f32) -> FeatureMatrix {
        Array2::from_shape_fn((rows, cols), |(r, c)| offset + (r * 100 + c) as f32)
    }

    #[test]
    fn test_stack_layout() {
        let mfcc = matrix(13, 130, 0.0);
        let mel = matrix(128, 130, 10_000.0);
        let tensor = AlignedFeatureTensor::stack(&mfcc, &mel).unwrap();

        assert_eq!(tensor.frames(), 130);
        assert_eq!(tensor.width(), 141);
        assert_eq!(tensor.as_array()[[5, 2]], mfcc[[2, 5]]);
        assert_eq!(tensor.as_array()[[5, 13 + 7]], mel[[7, 5]]);
    }

    #[test]
    fn test_stack_matches_frame_major_concatenation() {
        let mfcc = matrix(13, 40, 0.0);
        let mel = matrix(128, 40, 5.0);

        let stacked = AlignedFeatureTensor::stack(&mfcc, &mel).unwrap();
        let concatenated =
            AlignedFeatureTensor::from_frame_major(mfcc.t(), mel.t()).unwrap();
        assert_eq!(stacked, concatenated);
    }

    fn join(mfcc: &FeatureMatrix, mel: &FeatureMatrix) -> AlignedFeatureTensor {
        AlignedFeatureTensor::from_frame_major(mfcc.view(), mel.view()).unwrap()
    }

    #[test]
    fn test_frame_major_views_from_separate_owners() {
        let mfcc = matrix(20, 3, 0.0);
        let tensor = {
            let mel = matrix(20, 5, 1_000.0);
            join(&mfcc, &mel)
        };

        assert_eq!(tensor.frames(), 20);
        assert_eq!(tensor.n_mfcc(), 3);
        assert_eq!(tensor.as_array()[[4, 3]], 1_000.0 + 400.0);
    }

    #[test]
    fn test_mismatched_frames_rejected() {
        let mfcc = matrix(13, 129, 0.0);
        let mel = matrix(128, 130, 0.0);
        assert_eq!(
            AlignedFeatureTensor::stack(&mfcc, &mel),
            Err(FeatureError::FrameMismatch {
                expected: 129,
                actual: 130
            })
        );
        assert!(AlignedFeatureTensor::from_frame_major(mfcc.t(), mel.t()).is_err());
    }

    #[test]
    fn test_into_batch_shape() {
        let tensor =
            AlignedFeatureTensor::stack(&matrix(13, 130, 0.0), &matrix(128, 130, 0.0)).unwrap();
        let expected = tensor.as_array().clone();
        let batch = tensor.into_batch();

        assert_eq!(batch.shape(), (1, 130, 141));
        assert_eq!(batch.item(0), expected.view());
    }

    #[test]
    fn test_batch_from_tensors_rejects_mixed_frames() {
        let a = AlignedFeatureTensor::stack(&matrix(13, 10, 0.0), &matrix(128, 10, 0.0)).unwrap();
        let b = AlignedFeatureTensor::stack(&matrix(13, 11, 0.0), &matrix(128, 11, 0.0)).unwrap();

        let batch = InferenceBatch::from_tensors(&[a.clone(), a.clone()]).unwrap();
        assert_eq!(batch.shape(), (2, 10, 141));
        assert_eq!(batch.item(1).slice(s![.., ..13]), a.as_array().slice(s![.., ..13]));
        assert!(InferenceBatch::from_tensors(&[a, b]).is_err());
        assert!(InferenceBatch::from_tensors(&[]).is_err());
    }
}
