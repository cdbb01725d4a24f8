// ============================================================
// Layer 3 - Record Sets
// ============================================================
// The three table shapes that flow through the pipeline:
//
//   RawRecordSet         → verbatim CSV contents, one per source
//   NormalizedRecordSet  → renamed + value-transformed, still
//                          one per source
//   CombinedRecordSet    → union-schema concatenation of all
//                          normalized sets
//
// Cells after normalization are `Value`s. A cell is either
// missing, an already-parsed number, or the original text token.
// Numeric coercion of text is deferred to the feature encoder so
// that it can count how many tokens it had to throw away.

use crate::domain::schema::{SourceKind, UNKNOWN_TOKEN};

// ─── Value ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Build a cell from a raw CSV field. Blank fields are missing.
    pub fn from_token(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Value::Missing
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// String form used when fitting a categorical vocabulary.
    /// Missing cells become the "Unknown" token.
    pub fn category_label(&self) -> String {
        match self {
            Value::Missing   => UNKNOWN_TOKEN.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s)   => s.clone(),
        }
    }

    /// Lossy numeric view: text that does not parse to a finite
    /// number yields None, exactly like a missing cell.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Missing   => None,
            Value::Number(n) => n.is_finite().then_some(*n),
            Value::Text(s)   => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

// ─── RawRecordSet ─────────────────────────────────────────────────────────────
/// A source table exactly as read from disk.
#[derive(Debug, Clone)]
pub struct RawRecordSet {
    pub source:  SourceKind,
    /// Where the table came from, for error messages
    pub origin:  String,
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<String>>,
}

impl RawRecordSet {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

// ─── NormalizedRecordSet ──────────────────────────────────────────────────────
/// A source table whose columns are all logical-schema names.
#[derive(Debug, Clone)]
pub struct NormalizedRecordSet {
    pub source:  SourceKind,
    pub columns: Vec<String>,
    pub rows:    Vec<Vec<Value>>,
}

impl NormalizedRecordSet {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// ─── CombinedRecordSet ────────────────────────────────────────────────────────
/// All sources stacked onto the union schema.
/// `origins[i]` is the source that contributed `rows[i]`.
#[derive(Debug, Clone)]
pub struct CombinedRecordSet {
    pub columns: Vec<String>,
    pub rows:    Vec<Vec<Value>>,
    pub origins: Vec<SourceKind>,
}

impl CombinedRecordSet {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of missing cells in column `index`
    pub fn missing_in(&self, index: usize) -> usize {
        self.rows.iter().filter(|row| row[index].is_missing()).count()
    }

    pub fn rows_from(&self, source: SourceKind) -> usize {
        self.origins.iter().filter(|&&o| o == source).count()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_token_is_missing() {
        assert_eq!(Value::from_token("   "), Value::Missing);
        assert_eq!(Value::from_token(" Yes "), Value::Text("Yes".into()));
    }

    #[test]
    fn test_category_label_of_missing_is_unknown() {
        assert_eq!(Value::Missing.category_label(), "Unknown");
        assert_eq!(Value::Number(1.0).category_label(), "1");
    }

    #[test]
    fn test_to_number_rejects_garbage_and_non_finite() {
        assert_eq!(Value::Text("3.5".into()).to_number(), Some(3.5));
        assert_eq!(Value::Text("abc".into()).to_number(), None);
        assert_eq!(Value::Text("NaN".into()).to_number(), None);
        assert_eq!(Value::Missing.to_number(), None);
    }

    #[test]
    fn test_combined_missing_count() {
        let combined = CombinedRecordSet {
            columns: vec!["a".into()],
            rows:    vec![vec![Value::Missing], vec![Value::Number(1.0)]],
            origins: vec![SourceKind::ClinicalRecords, SourceKind::HeartFailure],
        };
        assert_eq!(combined.missing_in(0), 1);
        assert_eq!(combined.rows_from(SourceKind::HeartFailure), 1);
    }
}
