// Stratified train / validation / test split
//
// Each class is shuffled with a seeded StdRng and cut independently, so class
// proportions carry over to every partition and the same seed always yields
// the same split.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEST_FRACTION: f32 = 0.25;
pub const DEFAULT_VALIDATION_FRACTION: f32 = 0.2;
pub const DEFAULT_SPLIT_SEED: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Share of all samples held out for testing
    pub test_fraction: f32,
    /// Share of the remaining samples held out for validation
    pub validation_fraction: f32,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            validation_fraction: DEFAULT_VALIDATION_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
        }
    }
}

/// Sample indices per partition, each sorted ascending
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSplits {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub test: Vec<usize>,
}

impl DatasetSplits {
    /// Split `labels` into train / validation / test partitions
    pub fn stratified(labels: &[usize], config: &SplitConfig) -> Self {
        let all: Vec<usize> = (0..labels.len()).collect();
        let (rest, test) = stratified_split(&all, labels, config.test_fraction, config.seed);
        let (train, validation) = stratified_split(
            &rest,
            labels,
            config.validation_fraction,
            config.seed.wrapping_add(1),
        );
        Self {
            train,
            validation,
            test,
        }
    }
}

/// Hold out `fraction` of `indices` per class
///
/// Returns (kept, held_out). The held-out count per class is
/// `round(class_size * fraction)`, clamped so a class with two or more samples
/// keeps at least one on each side.
pub fn stratified_split(
    indices: &[usize],
    labels: &[usize],
    fraction: f32,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let fraction = fraction.clamp(0.0, 1.0);
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &index in indices {
        by_class.entry(labels[index]).or_default().push(index);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut kept = Vec::with_capacity(indices.len());
    let mut held_out = Vec::new();

    for (_, mut members) in by_class {
        members.shuffle(&mut rng);
        let size = members.len();
        let mut take = (size as f32 * fraction).round() as usize;
        if size >= 2 && fraction > 0.0 && fraction < 1.0 {
            take = take.clamp(1, size - 1);
        }
        held_out.extend_from_slice(&members[..take]);
        kept.extend_from_slice(&members[take..]);
    }

    kept.sort_unstable();
    held_out.sort_unstable();
    (kept, held_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<usize> {
        let mut labels = vec![0; 40];
        labels.extend(vec![1; 20]);
        labels.extend(vec![2; 20]);
        labels
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let labels = labels();
        let splits = DatasetSplits::stratified(&labels, &SplitConfig::default());

        let mut all: Vec<usize> = splits
            .train
            .iter()
            .chain(&splits.validation)
            .chain(&splits.test)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..labels.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_class_proportions_preserved() {
        let labels = labels();
        let splits = DatasetSplits::stratified(&labels, &SplitConfig::default());

        let count = |set: &[usize], class: usize| set.iter().filter(|&&i| labels[i] == class).count();
        assert_eq!(count(&splits.test, 0), 10);
        assert_eq!(count(&splits.test, 1), 5);
        assert_eq!(count(&splits.test, 2), 5);
        assert_eq!(count(&splits.validation, 0), 6);
        assert_eq!(count(&splits.validation, 1), 3);
        assert_eq!(splits.train.len(), 80 - 20 - 12);
    }

    #[test]
    fn test_same_seed_same_split() {
        let labels = labels();
        let config = SplitConfig::default();
        assert_eq!(
            DatasetSplits::stratified(&labels, &config),
            DatasetSplits::stratified(&labels, &config)
        );

        let other = SplitConfig { seed: 7, ..config };
        assert_ne!(
            DatasetSplits::stratified(&labels, &config).test,
            DatasetSplits::stratified(&labels, &other).test
        );
    }

    #[test]
    fn test_small_class_keeps_a_training_sample() {
        let labels = vec![0, 0, 1, 1, 1, 1];
        let (kept, held) = stratified_split(&[0, 1, 2, 3, 4, 5], &labels, 0.9, 3);
        assert!(kept.iter().any(|&i| labels[i] == 0));
        assert!(held.iter().any(|&i| labels[i] == 0));
    }
}
