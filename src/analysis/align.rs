// FrameAligner - fixes the frame axis of a feature matrix to a target length
//
// Input matrices are in (coefficient, frame) layout. Short matrices are
// right-padded with zeros, long ones keep their leading frames. No reflection,
// no repetition.

use ndarray::{s, Array2};

use super::features::FeatureMatrix;

/// Pads or truncates feature matrices to an exact frame count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAligner {
    target_frames: usize,
}

impl FrameAligner {
    pub fn new(target_frames: usize) -> Self {
        Self { target_frames }
    }

    pub fn target_frames(&self) -> usize {
        self.target_frames
    }

    /// Align the frame (column) axis of `matrix` to the target
    pub fn align(&self, matrix: &FeatureMatrix) -> FeatureMatrix {
        pad_or_truncate(matrix, self.target_frames)
    }
}

/// Right-pad with zeros or right-truncate the frame axis to `target` columns
pub fn pad_or_truncate(matrix: &FeatureMatrix, target: usize) -> FeatureMatrix {
    let frames = matrix.ncols();
    if frames == target {
        return matrix.clone();
    }

    let mut aligned = Array2::<f32>::zeros((matrix.nrows(), target));
    let keep = frames.min(target);
    aligned
        .slice_mut(s![.., ..keep])
        .assign(&matrix.slice(s![.., ..keep]));
    aligned
}
