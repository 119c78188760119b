// Dataset module - offline corpus construction
//
// Module organization:
// - labels: LabelMapping (class names by label id) and LabelRegistry
//   (validated enumeration from configuration)
// - corpus: Corpus JSON document, validation, training tensors
// - builder: DatasetBuilder (parallel directory walk, ordered coordinator)
// - split: seeded stratified train / validation / test split

pub mod builder;
pub mod corpus;
pub mod labels;
pub mod split;

pub use builder::{discover_labels, BuildReport, ClassReport, DatasetBuilder, SkippedFile};
pub use corpus::{ClassCount, Corpus, CorpusSummary, NestedMatrix, TrainingSet};
pub use labels::{LabelMapping, LabelRegistry};
pub use split::{stratified_split, DatasetSplits, SplitConfig};
