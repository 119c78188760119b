// SpectralTransform - MFCC and mel-spectrogram extraction
//
// This module turns a mono PCM buffer at the pipeline sample rate into the two
// feature kinds the genre classifier consumes. Both kinds share one power
// spectrogram and one mel projection, so their frame axes always agree.
//
// Module organization:
// - types: FeatureMatrix alias and SpectralFeatures pair
// - fft: centered STFT producing power spectra
// - mel: Slaney mel filterbank
// - cepstral: decibel conversion and orthonormal DCT-II
// - mod.rs: Coordinator (SpectralTransform)
//
// Pipeline:
// 1. STFT power spectrogram (n_fft / 2 + 1, frames)
// 2. Mel projection (n_mels, frames)
// 3. mel_db = power_to_db(mel, ref = max)      -> clip-relative decibels
// 4. mfcc   = DCT(power_to_db(mel, ref = 1.0)) -> first n_mfcc rows

mod cepstral;
mod fft;
mod mel;
mod types;

pub use cepstral::{power_to_db, DbReference};
pub use mel::{hz_to_mel, mel_to_hz};
pub use types::{FeatureMatrix, SpectralFeatures};

use cepstral::DctBasis;
use fft::StftProcessor;
use mel::MelFilterbank;

use crate::config::FeatureConfig;
use crate::error::FeatureError;

/// SpectralTransform coordinates the MFCC / mel extraction pipeline
///
/// Construction pre-computes the FFT plan, Hann window, mel filterbank and
/// DCT basis; `extract` is then a pure function of the sample buffer and can
/// be shared across worker threads.
pub struct SpectralTransform {
    stft: StftProcessor,
    filterbank: MelFilterbank,
    dct: DctBasis,
    n_mfcc: usize,
}

impl SpectralTransform {
    /// Create a transform from the shared feature configuration
    pub fn new(config: &FeatureConfig) -> Result<Self, FeatureError> {
        config.validate()?;

        Ok(Self {
            stft: StftProcessor::new(config.n_fft, config.hop_length)?,
            filterbank: MelFilterbank::new(config.sample_rate, config.n_fft, config.n_mels)?,
            dct: DctBasis::new(config.n_mfcc, config.n_mels),
            n_mfcc: config.n_mfcc,
        })
    }

    pub fn n_mfcc(&self) -> usize {
        self.n_mfcc
    }

    pub fn n_mels(&self) -> usize {
        self.filterbank.n_mels()
    }

    /// Frames produced for a buffer of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        self.stft.frame_count(len)
    }

    /// Extract MFCC and mel-dB matrices from a sample buffer
    ///
    /// # Errors
    /// - `EmptyInput` for a zero-length buffer
    /// - `NonFiniteOutput` when the buffer carries NaN/Inf samples
    pub fn extract(&self, samples: &[f32]) -> Result<SpectralFeatures, FeatureError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptyInput {
                context: "spectral transform".to_string(),
            });
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(FeatureError::NonFiniteOutput { stage: "input" });
        }

        let power = self.stft.power_spectrogram(samples)?;
        let mel_power = self.filterbank.apply(&power)?;

        let mel_db = power_to_db(&mel_power, DbReference::Max);
        let mfcc = self.dct.apply(&power_to_db(&mel_power, DbReference::Unity));

        if mfcc.iter().any(|v| !v.is_finite()) {
            return Err(FeatureError::NonFiniteOutput { stage: "mfcc" });
        }
        if mel_db.iter().any(|v| !v.is_finite()) {
            return Err(FeatureError::NonFiniteOutput { stage: "mel" });
        }

        Ok(SpectralFeatures { mfcc, mel_db })
    }
}
