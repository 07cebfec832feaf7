//! Raw CSV columns of a row that are worth showing next to the candidates.

use crate::models::{CsvConfig, ImportedRow};

/// Columns with a non-blank value, minus the ones already mapped onto the
/// row's amount and date.
pub fn displayable_raw_values<'a>(
    row: &'a ImportedRow,
    csv_config: Option<&CsvConfig>,
) -> Vec<(&'a str, &'a str)> {
    let mapped: Vec<&str> = csv_config
        .map(|config| config.columns.mapped_columns().collect())
        .unwrap_or_default();

    row.raw_value
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .filter(|(key, _)| !mapped.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}
