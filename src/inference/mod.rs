// Inference module - online counterpart of the dataset builder
//
// Module organization:
// - pipeline: InferencePipeline (decode, truncate, shared feature pipeline)
// - classifier: GenreClassifier trait and the CentroidClassifier baseline
// - handle: ModelHandle (lazy load, shared read access, explicit reload)
// - prediction: DecisionPolicy and Prediction (percentages, unknown override)

pub mod classifier;
pub mod handle;
pub mod pipeline;
pub mod prediction;

pub use classifier::{argmax, softmax, CentroidClassifier, GenreClassifier};
pub use handle::{ModelHandle, SharedClassifier};
pub use pipeline::InferencePipeline;
pub use prediction::{ClassPercentage, DecisionPolicy, Prediction};
