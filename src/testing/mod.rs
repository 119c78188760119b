//! Test harness utilities shared by unit tests, integration tests and the CLI
//! smoke commands.
//!
//! Everything here is deterministic: synthetic signals are seeded, WAV
//! fixtures are written with fixed specs, and scratch directories are unique
//! per call so parallel tests never collide.

pub mod signals;
pub mod wav;

pub use signals::{sine_wave, white_noise};
pub use wav::{scratch_dir, write_wav_f32, write_wav_i16};
