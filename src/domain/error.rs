// ============================================================
// Layer 3 - Pipeline Errors
// ============================================================
// One error enum for every fatal condition the pipeline can hit.
// Library-style code below the application layer returns
// `domain::error::Result<T>`; the application and CLI layers wrap
// these in anyhow with extra context.
//
// Label imbalance is NOT here: it is a warning that
// ends up inside the evaluation report (see infra::metrics).

use thiserror::Error;

/// Result alias used by the data and ml layers
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file could not be opened or read
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Source file opened fine but is not well-formed CSV
    #[error("'{path}' is not well-formed tabular data: {source}")]
    MalformedTable {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Source file is empty: no header row to read columns from
    #[error("'{path}' is not well-formed tabular data: no header row")]
    MissingHeader { path: String },

    /// A value or column does not fit the logical schema
    #[error("schema error in {dataset}: {detail}")]
    Schema { dataset: String, detail: String },

    /// Nothing left to train on
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// Reducer asked for more components than the matrix can give
    #[error("cannot project {available} feature column(s) onto {requested} components")]
    Dimensionality { requested: usize, available: usize },
}

impl PipelineError {
    pub fn schema(dataset: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Schema {
            dataset: dataset.into(),
            detail:  detail.into(),
        }
    }

    pub fn empty(reason: impl Into<String>) -> Self {
        Self::EmptyDataset(reason.into())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_dataset() {
        let err = PipelineError::schema("clinical records", "row 3, column 'age': bad");
        assert_eq!(
            err.to_string(),
            "schema error in clinical records: row 3, column 'age': bad"
        );
    }

    #[test]
    fn test_missing_header_reads_as_malformed_table() {
        let err = PipelineError::MissingHeader { path: "heart.csv".into() };
        assert_eq!(
            err.to_string(),
            "'heart.csv' is not well-formed tabular data: no header row"
        );
    }

    #[test]
    fn test_dimensionality_message() {
        let err = PipelineError::Dimensionality { requested: 6, available: 4 };
        assert!(err.to_string().contains("4 feature column(s)"));
    }
}
