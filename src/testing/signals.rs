//! Deterministic synthetic signals.

use std::f32::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Pure tone of `len` samples
pub fn sine_wave(sample_rate: u32, frequency_hz: f32, len: usize, amplitude: f32) -> Vec<f32> {
    let step = frequency_hz / sample_rate as f32;
    let mut phase = 0.0f32;
    (0..len)
        .map(|_| {
            let value = (2.0 * PI * phase).sin() * amplitude;
            phase += step;
            if phase >= 1.0 {
                phase -= 1.0;
            }
            value
        })
        .collect()
}

/// Uniform white noise in [-amplitude, amplitude), reproducible per seed
pub fn white_noise(len: usize, amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    if amplitude <= 0.0 {
        return vec![0.0; len];
    }
    (0..len).map(|_| rng.gen_range(-amplitude..amplitude)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_bounds() {
        let signal = sine_wave(22_050, 440.0, 1_000, 0.5);
        assert_eq!(signal.len(), 1_000);
        assert!(signal.iter().all(|s| s.abs() <= 0.5 + 1e-6));
        assert_eq!(signal[0], 0.0);
    }

    #[test]
    fn test_white_noise_is_seeded() {
        assert_eq!(white_noise(64, 0.3, 9), white_noise(64, 0.3, 9));
        assert_ne!(white_noise(64, 0.3, 9), white_noise(64, 0.3, 10));
        assert!(white_noise(64, 0.0, 1).iter().all(|&s| s == 0.0));
    }
}
