// ============================================================
// Layer 4 - Schema Normalizer
// ============================================================
// Turns one RawRecordSet into a NormalizedRecordSet whose
// columns are all LogicalSchema names.
//
// Three transformations, per source:
//
//   1. Column renaming
//        "AgeCategory" → canonical "agecategory" → logical "age"
//      Headers are canonicalised first (trim, lower-case,
//      spaces → underscores) so the mapping tables below only
//      deal with one spelling. Columns not retained are dropped.
//
//   2. Age normalisation
//      Bucketed sources (personal indicators):
//        "55-59"        → 55         (bucket lower bound)
//        "75+"          → 80         (prefix + OPEN_BRACKET_OFFSET)
//        "80 or older"  → 80         (sentinel top bucket)
//        "63"           → 63         (integer passthrough)
//      Numeric sources (clinical records, heart failure):
//        "60.667"       → 60.667     (parsed as-is, fraction kept)
//      Anything else is a SchemaError. The whole run fails fast
//      rather than training on a silently corrupted age column.
//
//   3. Feature backfill
//      A source that never recorded a categorical feature the
//      others have (smoking, for the heart failure table) gets
//      the explicit "Unknown" token instead of a null, so the
//      category stays meaningful instead of missing-at-random.
//
// Reference: Rust Book §8 (Strings, HashMaps)
//            Rust Book §9 (Recoverable Errors with Result)

use std::collections::HashMap;

use crate::domain::error::{PipelineError, Result};
use crate::domain::record_set::{NormalizedRecordSet, RawRecordSet, Value};
use crate::domain::schema::{LogicalSchema, SourceKind, AGE, TARGET, UNKNOWN_TOKEN};

/// Added to the prefix of an open-ended bucket such as "75+"
pub const OPEN_BRACKET_OFFSET: i64 = 5;

/// Literal label of the open-ended top age bucket
pub const TOP_BUCKET_LABEL: &str = "80 or older";

/// Age assigned to the top bucket
pub const TOP_BUCKET_AGE: i64 = 80;

// ─── Age Normalisation ────────────────────────────────────────────────────────

/// Convert one raw age token to an integer age.
/// Returns None when the token matches none of the known formats;
/// the caller turns that into a SchemaError.
pub fn normalize_age(raw: &str) -> Option<i64> {
    let token = raw.trim();

    if token.eq_ignore_ascii_case(TOP_BUCKET_LABEL) {
        return Some(TOP_BUCKET_AGE);
    }

    if let Some((lower, upper)) = token.split_once('-') {
        // both bounds must be integers, e.g. "55-59"
        let lower = lower.trim().parse::<i64>().ok()?;
        upper.trim().parse::<i64>().ok()?;
        return Some(lower);
    }

    if let Some(prefix) = token.strip_suffix('+') {
        return prefix
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|p| p.checked_add(OPEN_BRACKET_OFFSET));
    }

    if let Ok(age) = token.parse::<i64>() {
        return Some(age);
    }

    // a fractional age inside a bucketed column; truncate
    numeric_age(token).map(|a| a.trunc() as i64)
}

/// Age of a source that records it as a plain number. The value is
/// kept exactly, fraction included.
pub fn numeric_age(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|a| a.is_finite())
}

/// Canonical spelling of a source header: trimmed, lower-case,
/// spaces replaced with underscores.
pub fn canonical_header(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

// ─── Source Profiles ──────────────────────────────────────────────────────────
/// Everything the normalizer needs to know about one source.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub source:   SourceKind,
    /// canonical source header → logical name
    pub renames:  &'static [(&'static str, &'static str)],
    /// logical columns kept, in output order
    pub retained: &'static [&'static str],
    /// logical column → constant value for features the source lacks
    pub backfill: &'static [(&'static str, &'static str)],
    /// labels are spelled "Yes" / "No"
    pub yes_no_target: bool,
    /// age arrives as bucket labels ("55-59", "80 or older")
    pub bucketed_age: bool,
}

impl SourceProfile {
    pub fn for_source(source: SourceKind) -> Self {
        match source {
            SourceKind::PersonalIndicators => Self {
                source,
                renames: &[
                    ("heartdisease",     TARGET),
                    ("agecategory",      AGE),
                    ("physicalhealth",   "physical_health"),
                    ("mentalhealth",     "mental_health"),
                    ("diffwalking",      "diff_walking"),
                    ("physicalactivity", "physical_activity"),
                    ("genhealth",        "gen_health"),
                    ("sleeptime",        "sleep_time"),
                ],
                retained: &[
                    TARGET, AGE, "sex", "smoking",
                    "bmi", "physical_health", "mental_health", "diff_walking",
                    "physical_activity", "gen_health", "sleep_time",
                ],
                backfill: &[],
                yes_no_target: true,
                bucketed_age:  true,
            },
            SourceKind::ClinicalRecords => Self {
                source,
                renames: &[("death_event", TARGET)],
                retained: &[
                    TARGET, AGE, "sex", "smoking",
                    "anaemia", "creatinine_phosphokinase", "diabetes", "ejection_fraction",
                    "high_blood_pressure", "platelets", "serum_creatinine", "serum_sodium",
                ],
                backfill: &[],
                yes_no_target: false,
                bucketed_age:  false,
            },
            SourceKind::HeartFailure => Self {
                source,
                renames: &[
                    ("heartdisease",   TARGET),
                    ("chestpaintype",  "chest_pain_type"),
                    ("restingbp",      "resting_bp"),
                    ("fastingbs",      "fasting_bs"),
                    ("restingecg",     "resting_ecg"),
                    ("exerciseangina", "exercise_angina"),
                ],
                retained: &[
                    TARGET, AGE, "sex", "smoking",
                    "chest_pain_type", "resting_bp", "cholesterol", "fasting_bs",
                    "resting_ecg", "maxhr", "exercise_angina", "oldpeak", "st_slope",
                ],
                backfill: &[("smoking", UNKNOWN_TOKEN)],
                yes_no_target: false,
                bucketed_age:  false,
            },
        }
    }

    fn logical_name<'a>(&self, canonical: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(from, _)| *from == canonical)
            .map(|(_, to)| *to)
            .unwrap_or(canonical)
    }
}

// ─── SchemaNormalizer ─────────────────────────────────────────────────────────

/// Where a retained column's values come from
enum ColumnSource {
    Raw(usize),
    Constant(&'static str),
}

pub struct SchemaNormalizer<'a> {
    schema:         &'a LogicalSchema,
    yes_no_targets: bool,
}

impl<'a> SchemaNormalizer<'a> {
    pub fn new(schema: &'a LogicalSchema) -> Self {
        Self { schema, yes_no_targets: true }
    }

    /// Map "Yes"/"No" labels to 1/0 for sources that spell them that way
    pub fn with_yes_no_targets(mut self, enabled: bool) -> Self {
        self.yes_no_targets = enabled;
        self
    }

    /// Normalize using the built-in profile of the raw set's source
    pub fn normalize(&self, raw: &RawRecordSet) -> Result<NormalizedRecordSet> {
        self.normalize_with(raw, &SourceProfile::for_source(raw.source))
    }

    pub fn normalize_with(
        &self,
        raw:     &RawRecordSet,
        profile: &SourceProfile,
    ) -> Result<NormalizedRecordSet> {
        let dataset = raw.source.name();
        if profile.source != raw.source {
            return Err(PipelineError::schema(
                dataset,
                format!("normalized with the {} profile", profile.source),
            ));
        }

        // ── Step 1: rename headers ────────────────────────────────────────────
        let mut by_logical: HashMap<&str, usize> = HashMap::new();
        let canonical: Vec<String> = raw.headers.iter().map(|h| canonical_header(h)).collect();
        for (idx, name) in canonical.iter().enumerate() {
            let logical = profile.logical_name(name.as_str());
            if by_logical.insert(logical, idx).is_some() {
                return Err(PipelineError::schema(
                    dataset,
                    format!("more than one column maps to '{logical}'"),
                ));
            }
        }

        // ── Step 2: resolve every retained column ─────────────────────────────
        let mut columns = Vec::with_capacity(profile.retained.len());
        let mut sources = Vec::with_capacity(profile.retained.len());
        for &name in profile.retained {
            if !self.schema.contains(name) {
                return Err(PipelineError::schema(
                    dataset,
                    format!("retained column '{name}' is not part of the logical schema"),
                ));
            }

            let source = match by_logical.get(name) {
                Some(&idx) => ColumnSource::Raw(idx),
                None => match profile.backfill.iter().find(|(col, _)| *col == name) {
                    Some(&(_, value)) => ColumnSource::Constant(value),
                    None => {
                        return Err(PipelineError::schema(
                            dataset,
                            format!("required column '{name}' not found in '{}'", raw.origin),
                        ))
                    }
                },
            };
            columns.push(name.to_string());
            sources.push(source);
        }

        for mandatory in [TARGET, AGE] {
            if !columns.iter().any(|c| c == mandatory) {
                return Err(PipelineError::schema(
                    dataset,
                    format!("mandatory column '{mandatory}' is not retained"),
                ));
            }
        }

        let dropped: Vec<&str> = raw
            .headers
            .iter()
            .zip(&canonical)
            .filter(|(_, c)| !columns.iter().any(|kept| kept == profile.logical_name(c)))
            .map(|(h, _)| h.as_str())
            .collect();
        if !dropped.is_empty() {
            tracing::debug!("{}: dropping unmapped columns {:?}", dataset, dropped);
        }

        // ── Step 3: transform values row by row ───────────────────────────────
        let map_yes_no = self.yes_no_targets && profile.yes_no_target;
        let mut rows = Vec::with_capacity(raw.n_rows());

        for (row_no, raw_row) in raw.rows.iter().enumerate() {
            let mut row = Vec::with_capacity(columns.len());

            for (name, source) in columns.iter().zip(&sources) {
                let value = match source {
                    ColumnSource::Constant(v) => Value::Text((*v).to_string()),
                    ColumnSource::Raw(idx) => {
                        let token = raw_row.get(*idx).map(String::as_str).unwrap_or("");
                        match name.as_str() {
                            AGE => {
                                let age = if profile.bucketed_age {
                                    normalize_age(token).map(|a| a as f64)
                                } else {
                                    numeric_age(token)
                                };
                                let age = age.ok_or_else(|| {
                                    PipelineError::schema(
                                        dataset,
                                        format!(
                                            "row {}, column '{}': unrecognised age format '{}'",
                                            row_no + 1,
                                            raw.headers[*idx],
                                            token,
                                        ),
                                    )
                                })?;
                                Value::Number(age)
                            }
                            TARGET if map_yes_no => yes_no_label(token),
                            _ => Value::from_token(token),
                        }
                    }
                };
                row.push(value);
            }
            rows.push(row);
        }

        let backfilled = sources
            .iter()
            .filter(|s| matches!(s, ColumnSource::Constant(_)))
            .count();
        tracing::info!(
            "Normalized {}: {} rows, {} columns ({} backfilled)",
            dataset,
            rows.len(),
            columns.len(),
            backfilled,
        );

        Ok(NormalizedRecordSet {
            source: raw.source,
            columns,
            rows,
        })
    }
}

/// "Yes" → 1, "No" → 0, anything else passes through untouched so
/// the encoder's target filter gets the final say.
fn yes_no_label(token: &str) -> Value {
    let t = token.trim();
    if t.eq_ignore_ascii_case("yes") {
        Value::Number(1.0)
    } else if t.eq_ignore_ascii_case("no") {
        Value::Number(0.0)
    } else {
        Value::from_token(t)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(source: SourceKind, headers: &[&str], rows: &[&[&str]]) -> RawRecordSet {
        RawRecordSet {
            source,
            origin:  "test.csv".into(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows:    rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_age_bucket_formats() {
        assert_eq!(normalize_age("55-59"), Some(55));
        assert_eq!(normalize_age("75+"), Some(80));
        assert_eq!(normalize_age("80 or older"), Some(80));
        assert_eq!(normalize_age("63"), Some(63));
        assert_eq!(normalize_age(" 18-24 "), Some(18));
    }

    #[test]
    fn test_fractional_age_truncates() {
        assert_eq!(normalize_age("60.667"), Some(60));
    }

    #[test]
    fn test_open_bucket_overflow_is_unrecognised() {
        assert_eq!(normalize_age("9223372036854775807+"), None);
    }

    #[test]
    fn test_clinical_age_keeps_fraction() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::ClinicalRecords,
            &[
                "age", "anaemia", "creatinine_phosphokinase", "diabetes", "ejection_fraction",
                "high_blood_pressure", "platelets", "serum_creatinine", "serum_sodium",
                "sex", "smoking", "time", "DEATH_EVENT",
            ],
            &[&["60.667", "1", "315", "1", "60", "0", "454000", "1.1", "131", "1", "1", "10", "0"]],
        );

        let out = SchemaNormalizer::new(&schema).normalize(&raw).unwrap();
        let age = out.column_index(AGE).unwrap();
        assert_eq!(out.rows[0][age], Value::Number(60.667));
    }

    #[test]
    fn test_non_numeric_clinical_age_is_schema_error() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::ClinicalRecords,
            &[
                "age", "anaemia", "creatinine_phosphokinase", "diabetes", "ejection_fraction",
                "high_blood_pressure", "platelets", "serum_creatinine", "serum_sodium",
                "sex", "smoking", "time", "DEATH_EVENT",
            ],
            &[&["55-59", "1", "315", "1", "60", "0", "454000", "1.1", "131", "1", "1", "10", "0"]],
        );

        let err = SchemaNormalizer::new(&schema).normalize(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn test_unrecognised_age_formats() {
        assert_eq!(normalize_age("old"), None);
        assert_eq!(normalize_age(""), None);
        assert_eq!(normalize_age("55-"), None);
        assert_eq!(normalize_age("+"), None);
        assert_eq!(normalize_age("-5"), None);
    }

    #[test]
    fn test_canonical_header() {
        assert_eq!(canonical_header(" Heart Disease "), "heart_disease");
        assert_eq!(canonical_header("ST_Slope"), "st_slope");
    }

    #[test]
    fn test_personal_indicators_rename_and_age() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::PersonalIndicators,
            &[
                "HeartDisease", "BMI", "Smoking", "PhysicalHealth", "MentalHealth",
                "DiffWalking", "Sex", "AgeCategory", "Race", "PhysicalActivity",
                "GenHealth", "SleepTime",
            ],
            &[&["Yes", "28.1", "No", "3", "0", "No", "Male", "55-59", "White", "Yes", "Good", "7"]],
        );

        let out = SchemaNormalizer::new(&schema).normalize(&raw).unwrap();

        assert_eq!(out.columns.len(), 11);
        assert!(out.column_index("race").is_none());
        let age = out.column_index(AGE).unwrap();
        assert_eq!(out.rows[0][age], Value::Number(55.0));
        let target = out.column_index(TARGET).unwrap();
        assert_eq!(out.rows[0][target], Value::Number(1.0));
    }

    #[test]
    fn test_yes_no_mapping_can_be_disabled() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::PersonalIndicators,
            &[
                "HeartDisease", "BMI", "Smoking", "PhysicalHealth", "MentalHealth",
                "DiffWalking", "Sex", "AgeCategory", "PhysicalActivity", "GenHealth", "SleepTime",
            ],
            &[&["No", "22", "No", "0", "0", "No", "Female", "80 or older", "Yes", "Good", "8"]],
        );

        let out = SchemaNormalizer::new(&schema)
            .with_yes_no_targets(false)
            .normalize(&raw)
            .unwrap();
        let target = out.column_index(TARGET).unwrap();
        assert_eq!(out.rows[0][target], Value::Text("No".into()));
    }

    #[test]
    fn test_heart_failure_smoking_backfilled() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::HeartFailure,
            &[
                "Age", "Sex", "ChestPainType", "RestingBP", "Cholesterol", "FastingBS",
                "RestingECG", "MaxHR", "ExerciseAngina", "Oldpeak", "ST_Slope", "HeartDisease",
            ],
            &[&["40", "M", "ATA", "140", "289", "0", "Normal", "172", "N", "0", "Up", "0"]],
        );

        let out = SchemaNormalizer::new(&schema).normalize(&raw).unwrap();
        let smoking = out.column_index("smoking").unwrap();
        assert_eq!(out.rows[0][smoking], Value::Text("Unknown".into()));
        // heart failure labels are already numeric text
        let target = out.column_index(TARGET).unwrap();
        assert_eq!(out.rows[0][target], Value::Text("0".into()));
    }

    #[test]
    fn test_bad_age_is_schema_error() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(
            SourceKind::HeartFailure,
            &[
                "Age", "Sex", "ChestPainType", "RestingBP", "Cholesterol", "FastingBS",
                "RestingECG", "MaxHR", "ExerciseAngina", "Oldpeak", "ST_Slope", "HeartDisease",
            ],
            &[&["forty", "M", "ATA", "140", "289", "0", "Normal", "172", "N", "0", "Up", "0"]],
        );

        let err = SchemaNormalizer::new(&schema).normalize(&raw).unwrap_err();
        match err {
            PipelineError::Schema { detail, .. } => {
                assert!(detail.contains("row 1"));
                assert!(detail.contains("forty"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_profile_rejected() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(SourceKind::ClinicalRecords, &["age", "DEATH_EVENT"], &[&["60", "1"]]);
        let profile = SourceProfile::for_source(SourceKind::HeartFailure);
        let err = SchemaNormalizer::new(&schema).normalize_with(&raw, &profile).unwrap_err();
        assert!(err.to_string().contains("heart failure profile"));
    }

    #[test]
    fn test_missing_required_column_is_schema_error() {
        let schema = LogicalSchema::cardiovascular();
        let raw = raw(SourceKind::ClinicalRecords, &["age", "DEATH_EVENT"], &[&["60", "1"]]);
        let err = SchemaNormalizer::new(&schema).normalize(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    proptest! {
        #[test]
        fn prop_bucket_returns_lower_bound(a in 0i64..120, width in 0i64..10) {
            let token = format!("{}-{}", a, a + width);
            prop_assert_eq!(normalize_age(&token), Some(a));
        }

        #[test]
        fn prop_open_bucket_adds_offset(a in 0i64..120) {
            prop_assert_eq!(normalize_age(&format!("{a}+")), Some(a + OPEN_BRACKET_OFFSET));
        }

        #[test]
        fn prop_numeric_age_unchanged(a in 0i64..120) {
            prop_assert_eq!(normalize_age(&a.to_string()), Some(a));
        }
    }
}
