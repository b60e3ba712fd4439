//! In-memory view of a sweep-results CSV.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context};

/// Tabular results of a simulation campaign: lowercased column names and
/// one numeric row per run. Cells that do not parse as numbers (failed
/// runs, placeholders) become NaN.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ResultsTable {
    /// Load a semicolon-delimited results table. The header row is required;
    /// every record must have the same width as the header.
    pub fn from_csv_path(path: &Path) -> anyhow::Result<ResultsTable> {
        let file = File::open(path)
            .with_context(|| format!("opening results file {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(file);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Vec<f64> = record
                .iter()
                .map(|cell| cell.parse::<f64>().unwrap_or(f64::NAN))
                .collect();
            rows.push(row);
        }
        Ok(ResultsTable { columns, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Fetch a column by lowercase name.
    pub fn column(&self, name: &str) -> anyhow::Result<Vec<f64>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| anyhow!("column '{}' not found in results table", name))?;
        Ok(self.rows.iter().map(|row| row[index]).collect())
    }

    /// Stable sort of rows by the given columns, first key primary.
    /// NaN keys order after all finite values.
    pub fn sort_by_columns(&mut self, keys: &[String]) -> anyhow::Result<()> {
        let mut key_indices = Vec::with_capacity(keys.len());
        for key in keys {
            let index = self.column_index(key).ok_or_else(|| {
                anyhow!("sweep parameter column '{}' not found in results table", key)
            })?;
            key_indices.push(index);
        }
        self.rows.sort_by(|a, b| {
            for &index in &key_indices {
                let order = a[index].total_cmp(&b[index]);
                if order != std::cmp::Ordering::Equal {
                    return order;
                }
            }
            std::cmp::Ordering::Equal
        });
        Ok(())
    }
}
