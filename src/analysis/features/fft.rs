// FFT module - short-time Fourier transform
//
// Frames are centered on multiples of the hop length: the signal is padded
// with n_fft/2 zeros on both sides before framing, so a buffer of `len`
// samples yields 1 + len / hop frames (even n_fft). Each frame is windowed
// with a periodic Hann window and reduced to its power spectrum.

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::FeatureError;

/// STFT processor producing power spectrograms
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_length: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size (2048 for the genre pipeline)
    /// * `hop_length` - Stride between frame centers in samples
    pub fn new(n_fft: usize, hop_length: usize) -> Result<Self, FeatureError> {
        if n_fft == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "n_fft",
                value: n_fft,
            });
        }
        if hop_length == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "hop_length",
                value: hop_length,
            });
        }

        // Periodic Hann (denominator n_fft, not n_fft - 1) to match spectral
        // analysis convention
        let window = (0..n_fft)
            .map(|i| {
                0.5 * (1.0 - ((2.0 * std::f32::consts::PI * i as f32) / n_fft as f32).cos())
            })
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Ok(Self {
            fft,
            n_fft,
            hop_length,
            window,
        })
    }

    /// Number of frequency bins per frame
    pub fn n_freqs(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of centered frames produced for a buffer of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        let pad = self.n_fft / 2;
        let padded = len + 2 * pad;
        if padded < self.n_fft {
            return 0;
        }
        1 + (padded - self.n_fft) / self.hop_length
    }

    /// Compute the power spectrogram of a sample buffer
    ///
    /// # Returns
    /// Matrix of shape (n_fft / 2 + 1, frame_count(len)) holding |X|^2
    pub fn power_spectrogram(&self, samples: &[f32]) -> Result<Array2<f32>, FeatureError> {
        if samples.is_empty() {
            return Err(FeatureError::EmptyInput {
                context: "stft".to_string(),
            });
        }

        let pad = self.n_fft / 2;
        let mut padded = vec![0.0f32; samples.len() + 2 * pad];
        padded[pad..pad + samples.len()].copy_from_slice(samples);

        let num_frames = self.frame_count(samples.len());
        let n_freqs = self.n_freqs();
        let mut spectrogram = Array2::<f32>::zeros((n_freqs, num_frames));

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];

        for frame_idx in 0..num_frames {
            let start = frame_idx * self.hop_length;
            let frame = &padded[start..start + self.n_fft];

            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * w, 0.0);
            }

            self.fft.process_with_scratch(&mut buffer, &mut scratch);

            for (bin, c) in buffer.iter().take(n_freqs).enumerate() {
                spectrogram[[bin, frame_idx]] = c.norm_sqr();
            }
        }

        Ok(spectrogram)
    }
}
