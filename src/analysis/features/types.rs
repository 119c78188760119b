// Types module - feature matrices produced by the spectral transform
//
// Matrices leave the transform in (coefficient, frame) layout. Alignment
// operates on that layout; transposition to (frame, coefficient) happens only
// when a tensor or corpus entry is assembled.

use ndarray::Array2;

/// Feature matrix in (coefficient, frame) layout
pub type FeatureMatrix = Array2<f32>;

/// Both feature kinds extracted from one window of audio
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralFeatures {
    /// Cepstral coefficients, shape (n_mfcc, frames)
    pub mfcc: FeatureMatrix,

    /// Mel power spectrogram in dB relative to the window peak,
    /// shape (n_mels, frames)
    pub mel_db: FeatureMatrix,
}

impl SpectralFeatures {
    /// Frame count of the MFCC matrix (the data-quality gate reads this)
    pub fn mfcc_frames(&self) -> usize {
        self.mfcc.ncols()
    }

    /// Frame count of the mel matrix
    pub fn mel_frames(&self) -> usize {
        self.mel_db.ncols()
    }
}
