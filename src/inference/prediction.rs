// Prediction - turns classifier scores into the serving response
//
// Scores are normalized to percentages summing to 100 and rounded to two
// decimals. The label is the arg-max class unless the "unknown" class reaches
// the configured percentage threshold, in which case it wins outright.

use serde::{Deserialize, Serialize};

use super::classifier::argmax;
use crate::config::ServingConfig;
use crate::error::InferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPercentage {
    pub label: String,
    pub percent: f32,
}

/// Decision for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Arg-max class before the unknown override
    pub top_label: String,
    pub unknown_override: bool,
    pub percentages: Vec<ClassPercentage>,
}

/// Unknown-class override policy
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    pub unknown_label: String,
    pub threshold_percent: f32,
}

impl DecisionPolicy {
    pub fn new(unknown_label: impl Into<String>, threshold_percent: f32) -> Self {
        Self {
            unknown_label: unknown_label.into(),
            threshold_percent,
        }
    }

    pub fn from_config(config: &ServingConfig) -> Self {
        Self::new(config.unknown_label.clone(), config.unknown_threshold_percent)
    }

    /// Decide a label for one score vector
    ///
    /// # Errors
    /// - `ScoreShape` when `scores` and `labels` differ in length
    /// - `Model` when the scores cannot be normalized
    pub fn decide(&self, scores: &[f32], labels: &[String]) -> Result<Prediction, InferenceError> {
        if scores.len() != labels.len() || scores.is_empty() {
            return Err(InferenceError::ScoreShape {
                expected: labels.len(),
                actual: scores.len(),
            });
        }

        let total: f32 = scores.iter().sum();
        if !total.is_finite() || total <= 0.0 || scores.iter().any(|s| *s < 0.0) {
            return Err(InferenceError::Model {
                details: format!("scores cannot be normalized: {:?}", scores),
            });
        }

        let percentages: Vec<ClassPercentage> = scores
            .iter()
            .zip(labels)
            .map(|(score, label)| ClassPercentage {
                label: label.clone(),
                percent: round2(score / total * 100.0),
            })
            .collect();

        let top = argmax(scores).unwrap_or(0);
        let top_label = labels[top].clone();

        let unknown_override = percentages
            .iter()
            .find(|p| p.label == self.unknown_label)
            .map(|p| p.percent >= self.threshold_percent)
            .unwrap_or(false);

        let label = if unknown_override {
            self.unknown_label.clone()
        } else {
            top_label.clone()
        };

        Ok(Prediction {
            label,
            top_label,
            unknown_override,
            percentages,
        })
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from_config(&ServingConfig::default())
    }
}

/// Two-decimal rounding, ties to even
fn round2(value: f32) -> f32 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["blues", "classical", "unknown"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_percentages_rounded_to_two_decimals() {
        let prediction = DecisionPolicy::new("unknown", 50.0)
            .decide(&[0.123456, 0.876544, 0.0], &labels())
            .unwrap();

        assert_eq!(prediction.percentages[0].percent, 12.35);
        assert_eq!(prediction.percentages[1].percent, 87.65);
        assert_eq!(prediction.label, "classical");
        assert!(!prediction.unknown_override);
    }

    #[test]
    fn test_unknown_overrides_argmax_at_threshold() {
        let policy = DecisionPolicy::default();
        // 0.0002 of the mass is 0.02 percent, above the 0.014 default
        let prediction = policy.decide(&[0.9, 0.0998, 0.0002], &labels()).unwrap();

        assert_eq!(prediction.top_label, "blues");
        assert_eq!(prediction.label, "unknown");
        assert!(prediction.unknown_override);
    }

    #[test]
    fn test_unknown_below_threshold_ignored() {
        let policy = DecisionPolicy::default();
        let prediction = policy.decide(&[0.9, 0.09999, 0.00001], &labels()).unwrap();
        assert_eq!(prediction.label, "blues");
        assert_eq!(prediction.percentages[2].percent, 0.0);
    }

    #[test]
    fn test_unnormalized_scores_are_rescaled() {
        let prediction = DecisionPolicy::new("unknown", 100.0)
            .decide(&[2.0, 6.0, 0.0], &labels())
            .unwrap();
        assert_eq!(prediction.percentages[0].percent, 25.0);
        assert_eq!(prediction.percentages[1].percent, 75.0);
    }

    #[test]
    fn test_rounding_ties_go_to_even() {
        // 0.125 and 0.375 are exact in binary, so the x100 values are exact ties
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_length_mismatch() {
        let err = DecisionPolicy::default()
            .decide(&[0.5, 0.5], &labels())
            .unwrap_err();
        assert_eq!(
            err,
            InferenceError::ScoreShape {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_labels_without_unknown_class() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let prediction = DecisionPolicy::default().decide(&[0.3, 0.7], &labels).unwrap();
        assert_eq!(prediction.label, "b");
    }
}
