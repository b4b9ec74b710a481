//! Ordered class labels matching the detector's score channels.

use crate::util::{NutriScanError, NutriScanResult};
use std::collections::HashSet;

/// Labels of the bundled food detector, in score-channel order.
pub const DEFAULT_FOOD_LABELS: [&str; 3] = ["Ayam_Goreng", "Nasi_Putih", "Telur_Goreng"];

/// Immutable, ordered list of class labels.
///
/// Index `i` names score channel `i` of the detector output. The order is
/// fixed by the model's training configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassLabels {
    labels: Vec<String>,
}

impl ClassLabels {
    /// Builds a label list, rejecting empty lists, empty names and duplicates.
    pub fn new<I, S>(labels: I) -> NutriScanResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(NutriScanError::InvalidLabels {
                reason: "label list is empty".to_string(),
            });
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.is_empty() {
                return Err(NutriScanError::InvalidLabels {
                    reason: "label names must not be empty".to_string(),
                });
            }
            if !seen.insert(label.as_str()) {
                return Err(NutriScanError::InvalidLabels {
                    reason: format!("duplicate label {label:?}"),
                });
            }
        }
        Ok(Self { labels })
    }

    /// Labels of the bundled food detector.
    pub fn default_foods() -> Self {
        Self {
            labels: DEFAULT_FOOD_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Returns the label for a class index.
    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed list.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates labels in channel order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::ClassLabels;
    use crate::util::NutriScanError;

    #[test]
    fn keeps_order() {
        let labels = ClassLabels::new(["b", "a", "c"]).unwrap();
        assert_eq!(labels.get(0), Some("b"));
        assert_eq!(labels.get(2), Some("c"));
        assert_eq!(labels.get(3), None);
        assert_eq!(labels.iter().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn rejects_duplicates_and_empty() {
        assert!(matches!(
            ClassLabels::new(["a", "a"]),
            Err(NutriScanError::InvalidLabels { .. })
        ));
        assert!(ClassLabels::new(Vec::<String>::new()).is_err());
        assert!(ClassLabels::new([""]).is_err());
    }

    #[test]
    fn default_foods_has_three_classes() {
        let labels = ClassLabels::default_foods();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get(0), Some("Ayam_Goreng"));
    }
}
