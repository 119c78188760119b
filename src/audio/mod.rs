// Audio module - decoding and sample-rate normalization
//
// Every buffer entering the analysis pipeline is mono f32 at the configured
// pipeline rate (22050 Hz by default). Resampling happens here, on load, and
// never inside the feature code.
//
// Module organization:
// - loader: WAV decode from a path or an in-memory upload, mono downmix
// - resample: rubato FFT resampler

pub mod loader;
pub mod resample;

pub use loader::{load_bytes, load_path, AudioLoader};
pub use resample::resample;

/// Mono PCM buffer at a known sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Leading `max_samples` samples (the whole clip when shorter)
    pub fn head(&self, max_samples: usize) -> &[f32] {
        &self.samples[..max_samples.min(self.samples.len())]
    }
}
