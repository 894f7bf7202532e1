//! Summary Tables
//! Ordered label → value pairs handed to chart consumers.

use serde::Serialize;

/// Bucket for codes without a label map entry, nulls, and malformed values.
pub const UNMAPPED_LABEL: &str = "Não mapeado";

/// Label-to-value table with a deterministic order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryTable {
    entries: Vec<(String, f64)>,
}

impl SummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to `label`, appending the label if it is new.
    pub fn add(&mut self, label: &str, value: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| l == label) {
            entry.1 += value;
        } else {
            self.entries.push((label.to_string(), value));
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.entries.push((label.into(), value));
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every value is zero (including an empty table).
    pub fn is_all_zero(&self) -> bool {
        self.entries.iter().all(|(_, v)| *v == 0.0)
    }

    pub fn max_value(&self) -> f64 {
        self.entries.iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }

    /// Copy sorted by value descending; ties keep their insertion order.
    pub fn sorted_by_value(&self) -> SummaryTable {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        SummaryTable { entries }
    }
}

impl FromIterator<(String, f64)> for SummaryTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
