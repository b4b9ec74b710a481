//! Nutrition lookup keyed by raw class label.
//!
//! The table is read once from a JSON object of the form
//! `{"Nasi_Putih": {"calories": 204, "portion": "1 piring (150 g)"}, ...}` and
//! is read-only afterwards.

use crate::labels::ClassLabels;
use crate::util::{NutriScanError, NutriScanResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Calories and serving description for one food class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionEntry {
    /// Energy per portion in kcal.
    pub calories: u32,
    /// Human-readable portion size.
    pub portion: String,
}

/// Read-only map from raw label to nutrition entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NutritionTable {
    entries: HashMap<String, NutritionEntry>,
}

impl NutritionTable {
    /// Builds a table from `(label, entry)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, NutritionEntry)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parses a table from a JSON object.
    pub fn from_json_str(json: &str) -> NutriScanResult<Self> {
        let entries: HashMap<String, NutritionEntry> =
            serde_json::from_str(json).map_err(|err| NutriScanError::NutritionTable {
                reason: err.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// Parses a table from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> NutriScanResult<Self> {
        let entries: HashMap<String, NutritionEntry> =
            serde_json::from_reader(reader).map_err(|err| NutriScanError::NutritionTable {
                reason: err.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// Loads a table from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> NutriScanResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|err| NutriScanError::NutritionTable {
            reason: format!("{}: {err}", path.display()),
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Looks up a label by its exact raw name.
    pub fn resolve(&self, label: &str) -> NutriScanResult<&NutritionEntry> {
        self.entries.get(label).ok_or_else(|| NutriScanError::Lookup {
            label: label.to_string(),
        })
    }

    /// Looks up a label without producing an error.
    pub fn get(&self, label: &str) -> Option<&NutritionEntry> {
        self.entries.get(label)
    }

    /// Fails with [`NutriScanError::Lookup`] on the first class label that
    /// has no entry.
    pub fn check_labels(&self, labels: &ClassLabels) -> NutriScanResult<()> {
        for label in labels.iter() {
            self.resolve(label)?;
        }
        Ok(())
    }

    /// Labels present in the table, in arbitrary order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Turns a raw label into display text.
///
/// Underscores become spaces, then the text is capitalized: the first
/// character is uppercased and the rest lowercased, so `"Ayam_Goreng"`
/// displays as `"Ayam goreng"`. This is stricter than a plain capitalize,
/// which would keep the inner capital and show `"Ayam Goreng"`. Lookups
/// always use the raw label.
pub fn display_text(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
