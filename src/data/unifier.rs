// ============================================================
// Layer 4 - Schema Unifier
// ============================================================
// Stacks the normalized record sets onto one union schema.
//
//   personal indicators  ┐
//   clinical records     ├─► reindex onto union columns ─► concat
//   heart failure        ┘
//
// The union is every LogicalSchema field that at least one set
// carries, in LogicalSchema order. A source that does not carry
// a column gets Value::Missing in it (structural missingness,
// which the encoder's imputer deals with later).
//
// Union-then-concatenate keeps each source's exclusive clinical
// features; an intersection would leave only the four shared
// columns.
//
// Row order is preserved within each source, and sources are
// concatenated in the order given.

use crate::domain::error::{PipelineError, Result};
use crate::domain::record_set::{CombinedRecordSet, NormalizedRecordSet, Value};
use crate::domain::schema::LogicalSchema;

/// Reindex and concatenate. Consumes the normalized sets.
pub fn unify(schema: &LogicalSchema, sets: Vec<NormalizedRecordSet>) -> Result<CombinedRecordSet> {
    for set in &sets {
        if let Some(stray) = set.columns.iter().find(|c| !schema.contains(c)) {
            return Err(PipelineError::schema(
                set.source.name(),
                format!("column '{stray}' is not part of the logical schema"),
            ));
        }
    }

    let columns: Vec<String> = schema
        .names()
        .filter(|name| sets.iter().any(|s| s.column_index(name).is_some()))
        .map(str::to_string)
        .collect();

    let total_rows: usize = sets.iter().map(NormalizedRecordSet::n_rows).sum();
    let mut rows    = Vec::with_capacity(total_rows);
    let mut origins = Vec::with_capacity(total_rows);

    for set in sets {
        // position of each union column inside this set, if any
        let mapping: Vec<Option<usize>> =
            columns.iter().map(|c| set.column_index(c)).collect();

        let supplied = mapping.iter().filter(|m| m.is_some()).count();
        tracing::debug!(
            "Reindexing {}: {} of {} union columns supplied",
            set.source,
            supplied,
            columns.len(),
        );

        let source = set.source;
        for mut row in set.rows {
            let unified: Vec<Value> = mapping
                .iter()
                .map(|m| match m {
                    Some(idx) => std::mem::replace(&mut row[*idx], Value::Missing),
                    None      => Value::Missing,
                })
                .collect();
            rows.push(unified);
            origins.push(source);
        }
    }

    tracing::info!(
        "Combined record set: {} rows x {} columns",
        rows.len(),
        columns.len(),
    );

    Ok(CombinedRecordSet { columns, rows, origins })
}
