// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer only sees these traits, so a source
// can come from CSV today and from something else tomorrow
// without the pipeline changing.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::Result;
use crate::domain::record_set::RawRecordSet;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce one raw source table.
///
/// Implementations:
///   - CsvLoader → reads a delimited file from disk
pub trait RecordSource {
    /// Load the whole table. Rows and columns come back verbatim.
    fn load(&self) -> Result<RawRecordSet>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A fitted model that maps one feature row to a class label.
///
/// Implementations:
///   - RandomForest → soft-voting ensemble of CART trees
pub trait Classifier {
    /// Predict the label of a single row of features
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict every row; the default just loops.
    fn predict_rows<'a, I>(&self, rows: I) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        rows.into_iter().map(|row| self.predict_row(row)).collect()
    }
}
