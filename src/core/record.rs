//! Raw transactional records as delivered by the ingestion layer.

use serde::Serialize;
use std::collections::BTreeMap;

/// One transactional observation.
///
/// The date is kept as raw text; it is validated when the records are prepared
/// so that a bad row is reported instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    /// Date as it appeared in the source table.
    pub date: String,
    /// Numeric target (e.g. average price).
    pub target: f64,
    /// Categorical breakdowns such as `type` or `region`.
    pub categories: BTreeMap<String, String>,
    /// Volume breakdowns such as `Total Volume` or `Small Bags`.
    pub volumes: BTreeMap<String, f64>,
}

impl RawRecord {
    /// Create a record with only a date and a target.
    pub fn new(date: impl Into<String>, target: f64) -> Self {
        Self {
            date: date.into(),
            target,
            categories: BTreeMap::new(),
            volumes: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.categories.insert(name.into(), value.into());
        self
    }

    pub fn with_volume(mut self, name: impl Into<String>, value: f64) -> Self {
        self.volumes.insert(name.into(), value);
        self
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        self.categories.get(name).map(String::as_str)
    }

    pub fn volume(&self, name: &str) -> Option<f64> {
        self.volumes.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let record = RawRecord::new("2015-12-27", 1.33)
            .with_category("type", "conventional")
            .with_category("region", "Albany")
            .with_volume("Total Volume", 64236.62);

        assert_eq!(record.date, "2015-12-27");
        assert_eq!(record.category("type"), Some("conventional"));
        assert_eq!(record.category("region"), Some("Albany"));
        assert_eq!(record.category("missing"), None);
        assert_eq!(record.volume("Total Volume"), Some(64236.62));
        assert_eq!(record.volume("4046"), None);
    }
}
