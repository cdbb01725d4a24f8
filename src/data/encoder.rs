// ============================================================
// Layer 4 - Feature Encoder
// ============================================================
// Turns the CombinedRecordSet into a fully numeric, imputed and
// standardized FeatureMatrix plus its LabelVector.
//
// Steps (applied in order):
//   1. Categorical codes    → string form, nulls → "Unknown",
//                             code = rank in the sorted label set
//   2. Target filter        → drop rows whose label is missing or
//                             not numeric
//   3. Numeric coercion     → every feature column to f64;
//                             non-numeric tokens become missing
//                             (counted per column and logged)
//   4. Drop empty columns   → columns missing in every row
//   5. Mean imputation      → per column, over observed values
//   6. Standardization      → zero mean, unit variance
//                             (population statistics)
//
// The categorical vocabularies are fitted per run from whatever
// labels the combined set contains; they are returned in the
// EncodingSummary but never persisted.
//
// Reference: ndarray crate documentation (Array2, Axis)
//            Rust Book §13 (Iterators and Closures)

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array1, Array2, Axis};

use crate::domain::error::{PipelineError, Result};
use crate::domain::record_set::{CombinedRecordSet, Value};
use crate::domain::schema::{FieldKind, LogicalSchema, TARGET};

// ─── FeatureMatrix ────────────────────────────────────────────────────────────
/// A dense, fully numeric feature table with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values:  Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }
}

/// What the encoder did to the data, for logging and reporting.
#[derive(Debug, Clone, Default)]
pub struct EncodingSummary {
    pub rows_in:         usize,
    pub rows_dropped:    usize,
    pub dropped_columns: Vec<String>,
    /// column → non-numeric tokens turned into missing values
    pub coerced:         BTreeMap<String, usize>,
    /// column → cells filled with the column mean
    pub imputed:         BTreeMap<String, usize>,
    /// categorical column → fitted labels, index = code
    pub vocabularies:    BTreeMap<String, Vec<String>>,
}

impl EncodingSummary {
    pub fn rows_kept(&self) -> usize {
        self.rows_in - self.rows_dropped
    }
}

/// Encoder output: features, labels and the bookkeeping.
#[derive(Debug, Clone)]
pub struct EncodedFeatures {
    pub matrix:  FeatureMatrix,
    pub labels:  Array1<f64>,
    pub summary: EncodingSummary,
}

// ─── FeatureEncoder ───────────────────────────────────────────────────────────
pub struct FeatureEncoder<'a> {
    schema: &'a LogicalSchema,
}

impl<'a> FeatureEncoder<'a> {
    pub fn new(schema: &'a LogicalSchema) -> Self {
        Self { schema }
    }

    pub fn encode(&self, combined: CombinedRecordSet) -> Result<EncodedFeatures> {
        let CombinedRecordSet { columns, mut rows, .. } = combined;
        let mut summary = EncodingSummary { rows_in: rows.len(), ..Default::default() };

        let target_idx = columns
            .iter()
            .position(|c| c == TARGET)
            .ok_or_else(|| PipelineError::schema("combined record set", "no 'target' column"))?;

        // ── Step 1: categorical columns → integer codes ───────────────────────
        for (col, name) in columns.iter().enumerate() {
            if self.schema.kind_of(name) != Some(FieldKind::Categorical) {
                continue;
            }
            let labels: Vec<String> = rows.iter().map(|r| r[col].category_label()).collect();
            let vocabulary: Vec<String> = labels
                .iter()
                .cloned()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            for (row, label) in rows.iter_mut().zip(&labels) {
                // vocabulary is built from these labels, the search cannot miss
                let code = vocabulary.binary_search(label).unwrap_or_default();
                row[col] = Value::Number(code as f64);
            }
            tracing::debug!("Encoded '{}' with {} categories", name, vocabulary.len());
            summary.vocabularies.insert(name.clone(), vocabulary);
        }

        // ── Step 2: drop rows without a numeric target ────────────────────────
        let mut targets = Vec::with_capacity(rows.len());
        rows.retain(|row| match row[target_idx].to_number() {
            Some(t) => {
                targets.push(t);
                true
            }
            None => false,
        });
        summary.rows_dropped = summary.rows_in - rows.len();
        if summary.rows_dropped > 0 {
            tracing::warn!(
                "Dropped {} row(s) with a missing or non-numeric target label",
                summary.rows_dropped,
            );
        }
        if rows.is_empty() {
            return Err(PipelineError::empty("no rows with a numeric target label remain"));
        }

        // ── Step 3: coerce every feature column to numeric ────────────────────
        let mut feature_names = Vec::new();
        let mut feature_cols: Vec<Vec<Option<f64>>> = Vec::new();
        for (col, name) in columns.iter().enumerate() {
            if col == target_idx {
                continue;
            }
            let (parsed, coerced) = coerce_column(rows.iter().map(|r| &r[col]));
            if coerced > 0 {
                tracing::info!("'{}': {} non-numeric value(s) coerced to missing", name, coerced);
                summary.coerced.insert(name.clone(), coerced);
            }
            feature_names.push(name.clone());
            feature_cols.push(parsed);
        }

        // ── Step 4: drop columns with no observed value ───────────────────────
        let mut kept_names = Vec::new();
        let mut kept_cols  = Vec::new();
        for (name, col) in feature_names.into_iter().zip(feature_cols) {
            if col.iter().all(Option::is_none) {
                summary.dropped_columns.push(name);
            } else {
                kept_names.push(name);
                kept_cols.push(col);
            }
        }
        if !summary.dropped_columns.is_empty() {
            tracing::warn!("Dropped all-missing column(s): {:?}", summary.dropped_columns);
        }
        if kept_cols.is_empty() {
            return Err(PipelineError::empty("every feature column is entirely missing"));
        }

        // ── Step 5: mean imputation ───────────────────────────────────────────
        let mut dense: Vec<Vec<f64>> = Vec::with_capacity(kept_cols.len());
        for (name, col) in kept_names.iter().zip(&kept_cols) {
            let (filled, n_imputed) = impute_mean(col);
            if n_imputed > 0 {
                tracing::debug!("'{}': imputed {} missing value(s)", name, n_imputed);
                summary.imputed.insert(name.clone(), n_imputed);
            }
            dense.push(filled);
        }

        // ── Step 6: standardization ───────────────────────────────────────────
        let n_rows = rows.len();
        let mut values = Array2::from_shape_fn((n_rows, dense.len()), |(r, c)| dense[c][r]);
        standardize(&mut values);

        tracing::info!(
            "Feature matrix: {} rows x {} columns ({} dropped)",
            values.nrows(),
            values.ncols(),
            summary.dropped_columns.len(),
        );

        Ok(EncodedFeatures {
            matrix: FeatureMatrix::new(kept_names, values),
            labels: Array1::from(targets),
            summary,
        })
    }
}

// ─── Numeric Helpers ──────────────────────────────────────────────────────────

/// Parse a column to numbers. Returns the parsed column and how
/// many present-but-unparseable tokens were turned into None.
pub fn coerce_column<'v>(cells: impl Iterator<Item = &'v Value>) -> (Vec<Option<f64>>, usize) {
    let mut coerced = 0usize;
    let parsed = cells
        .map(|cell| {
            let n = cell.to_number();
            if n.is_none() && !cell.is_missing() {
                coerced += 1;
            }
            n
        })
        .collect();
    (parsed, coerced)
}

/// Fill None with the mean of the observed values.
/// Returns the dense column and the number of filled cells.
pub fn impute_mean(column: &[Option<f64>]) -> (Vec<f64>, usize) {
    let observed: Vec<f64> = column.iter().flatten().copied().collect();
    let mean = if observed.is_empty() {
        0.0
    } else {
        observed.iter().sum::<f64>() / observed.len() as f64
    };
    let filled = column.iter().map(|v| v.unwrap_or(mean)).collect();
    (filled, column.len() - observed.len())
}

/// Scale every column in place to zero mean and unit population
/// variance. A constant column is only centred (scale 1).
pub fn standardize(values: &mut Array2<f64>) {
    for mut col in values.axis_iter_mut(Axis(1)) {
        let n = col.len() as f64;
        if n == 0.0 {
            continue;
        }
        let mean = col.sum() / n;
        let var  = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std  = var.sqrt();
        let scale = if std > f64::EPSILON { std } else { 1.0 };
        col.mapv_inplace(|v| (v - mean) / scale);
    }
}
