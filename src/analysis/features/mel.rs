// Mel module - Slaney mel filterbank
//
// Triangular filters evenly spaced on the Slaney mel scale (linear below
// 1 kHz, logarithmic above) and area-normalized so each filter integrates to
// roughly the same energy. Filter weights are evaluated at the exact FFT bin
// frequencies rather than snapped to integer bins.
//
// References:
// - Slaney, M. (1998). Auditory Toolbox. Technical Report #1998-010.

use ndarray::Array2;

use crate::error::FeatureError;

const F_SP: f32 = 200.0 / 3.0;
const MIN_LOG_HZ: f32 = 1000.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

fn log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Convert frequency in Hz to the Slaney mel scale
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert Slaney mel value back to Hz
pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Pre-computed mel filterbank matrix of shape (n_mels, n_fft / 2 + 1)
pub struct MelFilterbank {
    weights: Array2<f32>,
}

impl MelFilterbank {
    /// Build a filterbank spanning 0 Hz to Nyquist
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Result<Self, FeatureError> {
        if n_mels == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "n_mels",
                value: n_mels,
            });
        }
        if n_fft == 0 {
            return Err(FeatureError::InvalidParameter {
                name: "n_fft",
                value: n_fft,
            });
        }

        let n_freqs = n_fft / 2 + 1;
        let nyquist = sample_rate as f32 / 2.0;

        let fft_freqs: Vec<f32> = (0..n_freqs)
            .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
            .collect();

        let mel_min = hz_to_mel(0.0);
        let mel_max = hz_to_mel(nyquist);
        let mel_points: Vec<f32> = (0..n_mels + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
            .collect();

        let mut weights = Array2::<f32>::zeros((n_mels, n_freqs));
        for m in 0..n_mels {
            let lower_hz = mel_points[m];
            let center_hz = mel_points[m + 1];
            let upper_hz = mel_points[m + 2];
            let rise = (center_hz - lower_hz).max(f32::EPSILON);
            let fall = (upper_hz - center_hz).max(f32::EPSILON);
            let enorm = 2.0 / (upper_hz - lower_hz).max(f32::EPSILON);

            for (k, &freq) in fft_freqs.iter().enumerate() {
                let lower = (freq - lower_hz) / rise;
                let upper = (upper_hz - freq) / fall;
                let w = lower.min(upper).max(0.0);
                weights[[m, k]] = w * enorm;
            }
        }

        Ok(Self { weights })
    }

    pub fn n_mels(&self) -> usize {
        self.weights.nrows()
    }

    #[cfg(test)]
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Project a (n_freqs, frames) power spectrogram onto the mel axis
    pub fn apply(&self, power: &Array2<f32>) -> Result<Array2<f32>, FeatureError> {
        if power.nrows() != self.weights.ncols() {
            return Err(FeatureError::ShapeMismatch {
                expected: self.weights.ncols(),
                actual: power.nrows(),
            });
        }
        Ok(self.weights.dot(power))
    }
}
