// Label enumeration - class directories to integer label ids
//
// With a configured enumeration the label id of a class is its position in
// that enumeration, so corpus ids line up with the serving label order.
// Without one, class directories are visited in sorted order and a class's id
// is its visit position.

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

/// Ordered class names; `mapping[i]` is the class with label id `i`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMapping(Vec<String>);

impl LabelMapping {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Record the next visited class directory and return its label id
    pub fn push(&mut self, name: impl Into<String>) -> usize {
        self.0.push(name.into());
        self.0.len() - 1
    }

    pub fn get(&self, label: usize) -> Option<&str> {
        self.0.get(label).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for LabelMapping {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

/// Validated label enumeration loaded once from configuration
///
/// An empty enumeration accepts whatever class directories exist.
#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    expected: Vec<String>,
}

impl LabelRegistry {
    pub fn new(expected: Vec<String>) -> Self {
        Self { expected }
    }

    pub fn is_open(&self) -> bool {
        self.expected.is_empty()
    }

    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Build the mapping for the class directories found on disk
    ///
    /// The mapping follows the configured enumeration order when one is set,
    /// otherwise the visit order of `visited`.
    ///
    /// # Errors
    /// - `EmptyDataset` when there are no class directories
    /// - `UnexpectedLabel` for a directory outside the enumeration
    /// - `MissingLabel` for an enumerated class with no directory
    pub fn resolve(&self, visited: &[String]) -> Result<LabelMapping, DatasetError> {
        if visited.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }

        if self.is_open() {
            return Ok(LabelMapping::from(visited.to_vec()));
        }

        if let Some(unexpected) = visited.iter().find(|name| !self.expected.contains(name)) {
            return Err(DatasetError::UnexpectedLabel {
                label: unexpected.clone(),
            });
        }
        if let Some(missing) = self.expected.iter().find(|label| !visited.contains(label)) {
            return Err(DatasetError::MissingLabel {
                label: missing.clone(),
            });
        }

        Ok(LabelMapping::from(self.expected.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_label_is_position_in_visit_order() {
        let mapping = LabelRegistry::default()
            .resolve(&names(&["blues", "classical", "unknown"]))
            .unwrap();

        assert_eq!(mapping.index_of("classical"), Some(1));
        assert_eq!(mapping.get(1), Some("classical"));
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_configured_enumeration_sets_label_order() {
        let registry = LabelRegistry::new(names(&["unknown", "blues", "classical"]));
        let mapping = registry
            .resolve(&names(&["blues", "classical", "unknown"]))
            .unwrap();

        assert_eq!(mapping.names(), names(&["unknown", "blues", "classical"]).as_slice());
        assert_eq!(mapping.index_of("unknown"), Some(0));
        assert_eq!(mapping.index_of("classical"), Some(2));
    }

    #[test]
    fn test_unexpected_directory_fails_fast() {
        let registry = LabelRegistry::new(names(&["blues", "classical"]));
        let err = registry
            .resolve(&names(&["blues", "classical", "jazz"]))
            .unwrap_err();
        assert_eq!(
            err,
            DatasetError::UnexpectedLabel {
                label: "jazz".into()
            }
        );
    }

    #[test]
    fn test_missing_expected_label() {
        let registry = LabelRegistry::new(names(&["blues", "classical", "unknown"]));
        let err = registry.resolve(&names(&["blues", "unknown"])).unwrap_err();
        assert_eq!(
            err,
            DatasetError::MissingLabel {
                label: "classical".into()
            }
        );
    }

    #[test]
    fn test_empty_root_rejected() {
        assert_eq!(
            LabelRegistry::default().resolve(&[]),
            Err(DatasetError::EmptyDataset)
        );
    }

    #[test]
    fn test_mapping_serializes_as_plain_list() {
        let mapping = LabelMapping::from(names(&["blues", "classical"]));
        assert_eq!(
            serde_json::to_string(&mapping).unwrap(),
            r#"["blues","classical"]"#
        );
    }
}
