// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from three raw CSV files to one numeric matrix.
//
//   heart_2020_cleaned.csv   clinical_records.csv   heart.csv
//            │                        │                 │
//            ▼                        ▼                 ▼
//   CsvLoader             → RawRecordSet (verbatim)
//            │
//            ▼
//   SchemaNormalizer      → NormalizedRecordSet (per source)
//            │
//            ▼
//   unify                 → CombinedRecordSet (union schema)
//            │
//            ▼
//   FeatureEncoder        → FeatureMatrix + labels
//            │
//            ▼
//   split_train_test      → train / held-out row indices
//
// Each module is one step; each step returns a new owned value.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads one CSV source with the csv crate
pub mod loader;

/// Renames columns, normalizes age, backfills missing features
pub mod normalizer;

/// Reindexes normalized sets onto the union schema and stacks them
pub mod unifier;

/// Categorical codes, numeric coercion, imputation, scaling
pub mod encoder;

/// Seeded shuffle-and-split
pub mod splitter;
