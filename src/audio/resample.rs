// Sample-rate conversion with rubato's synchronous FFT resampler

use rubato::{FftFixedInOut, Resampler};

use crate::error::AudioError;

/// Nominal chunk size handed to the resampler; rubato may adjust it
const CHUNK_SIZE: usize = 1024;

/// Resample a mono buffer from `from_rate` to `to_rate`
///
/// The output is trimmed to `ceil(len * to_rate / from_rate)` samples with the
/// resampler's group delay removed, so timing lines up with the input.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Resample {
            details: format!("invalid rates {} -> {}", from_rate, to_rate),
        });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1).map_err(
            |e| AudioError::Resample {
                details: format!("failed to create resampler: {}", e),
            },
        )?;

    let expected = (samples.len() as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let mut pos = 0;
    while output.len() < expected + delay {
        let chunk_len = resampler.input_frames_next();
        let end = (pos + chunk_len).min(samples.len());
        let mut chunk = if pos < end {
            samples[pos..end].to_vec()
        } else {
            Vec::new()
        };
        chunk.resize(chunk_len, 0.0);
        pos = end;

        let wave_in = vec![chunk];
        let processed = resampler
            .process(&wave_in, None)
            .map_err(|e| AudioError::Resample {
                details: e.to_string(),
            })?;
        output.extend_from_slice(&processed[0]);
    }

    Ok(output[delay..delay + expected].to_vec())
}
