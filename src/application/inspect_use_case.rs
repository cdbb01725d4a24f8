// ============================================================
// Layer 2 - InspectUseCase
// ============================================================
// Runs only the harmonization half of the pipeline (load,
// normalize, unify) and reports what came out: rows per source
// and how many cells are missing in each unified column.
//
// Useful before a long training run to see which columns the
// encoder is going to impute heavily or drop outright. A column
// exclusive to one source is missing for every row of the other
// two by construction; the origin column makes that visible.

use std::fmt;

use anyhow::Result;

use crate::application::train_use_case::{harmonize, TrainConfig};
use crate::domain::record_set::CombinedRecordSet;
use crate::domain::schema::{FieldOrigin, LogicalSchema, SourceKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMissingness {
    pub name:    String,
    pub origin:  FieldOrigin,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRows {
    pub source:             SourceKind,
    pub rows:               usize,
    /// features no other source collects
    pub exclusive_features: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarmonizationSummary {
    pub total_rows: usize,
    pub per_source: Vec<SourceRows>,
    pub columns:    Vec<ColumnMissingness>,
}

impl HarmonizationSummary {
    pub fn from_combined(schema: &LogicalSchema, combined: &CombinedRecordSet) -> Self {
        let per_source = SourceKind::ALL
            .iter()
            .map(|&source| SourceRows {
                source,
                rows:               combined.rows_from(source),
                exclusive_features: schema.exclusive_to(source).count(),
            })
            .collect();

        let columns = combined
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnMissingness {
                name:    name.clone(),
                origin:  schema.field(name).map_or(FieldOrigin::Shared, |f| f.origin),
                missing: combined.missing_in(idx),
            })
            .collect();

        Self {
            total_rows: combined.n_rows(),
            per_source,
            columns,
        }
    }
}

impl fmt::Display for HarmonizationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Combined rows: {}", self.total_rows)?;
        for s in &self.per_source {
            writeln!(
                f,
                "  {:<20} {:>8} rows, {} exclusive features",
                s.source.name(),
                s.rows,
                s.exclusive_features,
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:<26} {:<20} {:>8} {:>8}", "column", "origin", "missing", "share")?;
        for col in &self.columns {
            let share = if self.total_rows == 0 {
                0.0
            } else {
                col.missing as f64 / self.total_rows as f64
            };
            let origin = match col.origin {
                FieldOrigin::Shared         => "shared",
                FieldOrigin::Exclusive(src) => src.name(),
            };
            writeln!(
                f,
                "{:<26} {:<20} {:>8} {:>7.1}%",
                col.name,
                origin,
                col.missing,
                share * 100.0,
            )?;
        }
        Ok(())
    }
}

pub struct InspectUseCase {
    config: TrainConfig,
}

impl InspectUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<HarmonizationSummary> {
        let schema   = LogicalSchema::cardiovascular();
        let combined = harmonize(&self.config, &schema)?;
        let summary  = HarmonizationSummary::from_combined(&schema, &combined);

        tracing::info!(
            "Harmonized {} rows into {} columns",
            summary.total_rows,
            summary.columns.len(),
        );
        Ok(summary)
    }
}
