// Genre Features - audio feature extraction and genre inference
// MFCC and mel-spectrogram tensors shared by dataset building and serving

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod testing;

#[cfg(feature = "http")]
pub mod http;

// Re-exports for convenience
pub use analysis::{AlignedFeatureTensor, FeaturePipeline, InferenceBatch, SpectralTransform};
pub use audio::{AudioClip, AudioLoader};
pub use config::AppConfig;
pub use dataset::{Corpus, DatasetBuilder};
pub use error::ErrorCode;
pub use inference::{GenreClassifier, InferencePipeline, ModelHandle, Prediction};
