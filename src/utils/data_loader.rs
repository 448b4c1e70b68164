//! Loading feature tables from disk

use crate::error::{AttributionError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Data loader for the tabular formats polars reads natively
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned when inferring the CSV schema
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set the number of rows used for CSV schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a delimited text file with a header row
    pub fn load_csv(&self, path: &Path, delimiter: u8) -> Result<DataFrame> {
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| AttributionError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| AttributionError::DataError(e.to_string()))
    }

    /// Load a JSON file
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| AttributionError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => self.load_csv(path, b','),
            "tsv" => self.load_csv(path, b'\t'),
            "parquet" | "pq" => self.load_parquet(path),
            "json" => self.load_json(path),
            other => Err(AttributionError::DataError(format!(
                "unsupported file format: '{}'",
                other
            ))),
        }
    }
}
