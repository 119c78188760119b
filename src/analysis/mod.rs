// Analysis module - feature extraction and alignment for genre classification
//
// Everything between a mono 22050 Hz sample buffer and a fixed-shape tensor
// lives here. The dataset builder and the inference pipeline both go through
// `FeaturePipeline`; neither re-implements any of these stages.
//
// Module organization:
// - features: SpectralTransform (STFT, mel filterbank, dB, DCT)
// - align: FrameAligner (zero pad / truncate the frame axis)
// - segment: Segmenter (equal non-overlapping windows per track)
// - tensor: AlignedFeatureTensor and InferenceBatch (canonical layout)
// - pipeline: FeaturePipeline with the corpus and serving alignment policies

pub mod align;
pub mod features;
pub mod pipeline;
pub mod segment;
pub mod tensor;

pub use align::{pad_or_truncate, FrameAligner};
pub use features::{FeatureMatrix, SpectralFeatures, SpectralTransform};
pub use pipeline::{AlignedWindow, AlignmentPolicy, FeaturePipeline, WindowOutcome};
pub use segment::Segmenter;
pub use tensor::{AlignedFeatureTensor, InferenceBatch};
