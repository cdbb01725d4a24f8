// ============================================================
// Layer 4 - Source Loader
// ============================================================
// Reads one CSV source into a RawRecordSet using the csv crate.
//
// Contract:
//   - every row and every column comes back verbatim
//     (no trimming, no renaming, no type parsing)
//   - an unreadable path is PipelineError::Io
//   - a file that is not well-formed CSV (bad quoting, invalid
//     UTF-8, rows with a different field count than the header)
//     is PipelineError::MalformedTable
//   - an empty file (no header row) is PipelineError::MissingHeader
//
// Unlike a directory walk, a missing source is fatal: there is
// no meaningful "demo mode" with one of the three tables absent.
//
// Reference: csv crate documentation (ReaderBuilder)
//            Rust Book §9 (Error Handling)

use std::{fs::File, path::Path};

use csv::ReaderBuilder;

use crate::domain::error::{PipelineError, Result};
use crate::domain::record_set::RawRecordSet;
use crate::domain::schema::SourceKind;
use crate::domain::traits::RecordSource;

/// Loads a single comma-separated source table.
pub struct CsvLoader {
    path:   String,
    source: SourceKind,
}

impl CsvLoader {
    pub fn new(path: impl Into<String>, source: SourceKind) -> Self {
        Self { path: path.into(), source }
    }
}

impl RecordSource for CsvLoader {
    fn load(&self) -> Result<RawRecordSet> {
        let path = Path::new(&self.path);

        let file = File::open(path).map_err(|e| PipelineError::Io {
            path:   self.path.clone(),
            source: e,
        })?;

        // flexible(false): a ragged row is a malformed table, not a
        // row we quietly pad or truncate
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(file);

        let malformed = |e: csv::Error| PipelineError::MalformedTable {
            path:   self.path.clone(),
            source: e,
        };

        let headers: Vec<String> = reader
            .headers()
            .map_err(malformed)?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.is_empty() {
            return Err(PipelineError::MissingHeader { path: self.path.clone() });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(malformed)?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        tracing::info!(
            "Loaded {} source '{}': {} rows x {} columns",
            self.source,
            path.display(),
            rows.len(),
            headers.len(),
        );

        Ok(RawRecordSet {
            source: self.source,
            origin: self.path.clone(),
            headers,
            rows,
        })
    }
}
