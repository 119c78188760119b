// WAV loader - decode, downmix to mono, resample to the pipeline rate

use std::io::{Cursor, Read};
use std::path::Path;

use super::resample::resample;
use super::AudioClip;
use crate::error::AudioError;

/// Decoder bound to a fixed output sample rate
#[derive(Debug, Clone, Copy)]
pub struct AudioLoader {
    target_sample_rate: u32,
}

impl AudioLoader {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Load a WAV file from disk
    pub fn load_path(&self, path: &Path) -> Result<AudioClip, AudioError> {
        load_path(path, self.target_sample_rate)
    }

    /// Decode an in-memory WAV payload (an HTTP upload, for example)
    pub fn load_bytes(&self, bytes: &[u8], name: &str) -> Result<AudioClip, AudioError> {
        load_bytes(bytes, name, self.target_sample_rate)
    }
}

/// Load a WAV file and convert it to mono at `target_sample_rate`
pub fn load_path(path: &Path, target_sample_rate: u32) -> Result<AudioClip, AudioError> {
    let source = path.display().to_string();
    let reader = hound::WavReader::open(path).map_err(|err| map_hound_error(&source, err))?;
    decode(reader, &source, target_sample_rate)
}

/// Decode WAV bytes and convert them to mono at `target_sample_rate`
pub fn load_bytes(bytes: &[u8], name: &str, target_sample_rate: u32) -> Result<AudioClip, AudioError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|err| map_hound_error(name, err))?;
    decode(reader, name, target_sample_rate)
}

fn decode<R: Read>(
    mut reader: hound::WavReader<R>,
    source: &str,
    target_sample_rate: u32,
) -> Result<AudioClip, AudioError> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat {
            source: source.to_string(),
            details: "zero channels".to_string(),
        });
    }

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|err| map_hound_error(source, err))?,
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 | 16 | 24 | 32 => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|v| v as f32 / scale))
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|err| map_hound_error(source, err))?
            }
            bits => {
                return Err(AudioError::UnsupportedFormat {
                    source: source.to_string(),
                    details: format!("bits_per_sample={}", bits),
                })
            }
        },
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    if mono.is_empty() {
        return Err(AudioError::EmptyAudio {
            source: source.to_string(),
        });
    }

    let samples = if spec.sample_rate == target_sample_rate {
        mono
    } else {
        tracing::debug!(
            "[AudioLoader] Resampling {} from {} Hz to {} Hz",
            source,
            spec.sample_rate,
            target_sample_rate
        );
        resample(&mono, spec.sample_rate, target_sample_rate)?
    };

    Ok(AudioClip::new(samples, target_sample_rate))
}

/// Average interleaved channels into one
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn map_hound_error(source: &str, err: hound::Error) -> AudioError {
    let source = source.to_string();
    match err {
        hound::Error::IoError(io) => AudioError::Io {
            source,
            details: io.to_string(),
        },
        hound::Error::Unsupported | hound::Error::TooWide => AudioError::UnsupportedFormat {
            source,
            details: err.to_string(),
        },
        other => AudioError::Decode {
            source,
            details: other.to_string(),
        },
    }
}
