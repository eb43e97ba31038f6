//! CSV ingestion of transactional sale records.
//!
//! The reader maps named header columns onto [`RawRecord`] fields. Dates stay
//! raw text; they are validated by [`crate::prepare`].

use crate::core::RawRecord;
use crate::error::{ForecastError, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Which header columns feed which record fields.
///
/// The date and target columns must exist. Category and volume columns are
/// picked up when present in the header and ignored otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: String,
    pub target: String,
    pub categories: Vec<String>,
    pub volumes: Vec<String>,
}

impl ColumnMapping {
    /// Mapping with only a date and a target column.
    pub fn new(date: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            target: target.into(),
            categories: Vec::new(),
            volumes: Vec::new(),
        }
    }

    /// Layout of the weekly avocado sales table.
    pub fn avocado() -> Self {
        Self::new("Date", "AveragePrice")
            .with_categories(["type", "region"])
            .with_volumes([
                "Total Volume",
                "4046",
                "4225",
                "4770",
                "Total Bags",
                "Small Bags",
                "Large Bags",
                "XLarge Bags",
            ])
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_volumes<I, S>(mut self, volumes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.volumes = volumes.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::avocado()
    }
}

/// Header positions resolved from a [`ColumnMapping`].
struct ColumnIndex {
    date: usize,
    target: (String, usize),
    categories: Vec<(String, usize)>,
    volumes: Vec<(String, usize)>,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &String| {
            position(name).ok_or_else(|| ForecastError::MissingColumn(name.clone()))
        };
        let optional = |names: &[String]| -> Vec<(String, usize)> {
            names
                .iter()
                .filter_map(|name| match position(name) {
                    Some(idx) => Some((name.clone(), idx)),
                    None => {
                        debug!(column = %name, "mapped column not in header, skipping");
                        None
                    }
                })
                .collect()
        };

        Ok(Self {
            date: required(&mapping.date)?,
            target: (mapping.target.clone(), required(&mapping.target)?),
            categories: optional(&mapping.categories),
            volumes: optional(&mapping.volumes),
        })
    }
}

/// Read records from any CSV source with a header row.
pub fn read_records<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Vec<RawRecord>> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let index = ColumnIndex::resolve(reader.headers()?, mapping)?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = result?;
        records.push(parse_row(row, &line, &index)?);
    }

    debug!(
        rows = records.len(),
        categories = index.categories.len(),
        volumes = index.volumes.len(),
        "read records"
    );
    Ok(records)
}

/// Read records from a CSV file.
pub fn read_records_from_path(path: impl AsRef<Path>, mapping: &ColumnMapping) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening records file");
    read_records(File::open(path)?, mapping)
}

fn parse_row(row: usize, line: &StringRecord, index: &ColumnIndex) -> Result<RawRecord> {
    let cell = |idx: usize| line.get(idx).unwrap_or("");

    let (target_name, target_idx) = &index.target;
    let target_text = cell(*target_idx);
    let target = parse_number(row, target_name, target_text)?.ok_or_else(|| {
        ForecastError::InvalidValue {
            row,
            column: target_name.clone(),
            value: target_text.to_string(),
        }
    })?;

    let mut record = RawRecord::new(cell(index.date), target);
    for (name, idx) in &index.categories {
        record = record.with_category(name.clone(), cell(*idx));
    }
    for (name, idx) in &index.volumes {
        if let Some(value) = parse_number(row, name, cell(*idx))? {
            record = record.with_volume(name.clone(), value);
        }
    }
    Ok(record)
}

/// Parse a numeric cell; an empty cell is `None`.
fn parse_number(row: usize, column: &str, text: &str) -> Result<Option<f64>> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|_| ForecastError::InvalidValue {
            row,
            column: column.to_string(),
            value: text.to_string(),
        })
}
