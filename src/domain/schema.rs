// ============================================================
// Layer 3 - Logical Schema
// ============================================================
// The canonical vocabulary every source is mapped onto.
//
// A LogicalSchema is an ORDERED list of typed fields. The order
// is the column order of the combined record set and of the
// final feature matrix, so it is defined exactly once, here,
// instead of being repeated as list literals at each call site.
//
//   target | age sex smoking | personal-indicator features
//          | clinical-record features | heart-failure features
//
// Each field knows:
//   - its kind   (target / numeric / categorical)
//   - its origin (shared by all sources, or exclusive to one)
//
// Reference: Rust Book §6 (Enums), §8 (Collections)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the label column in every normalized record set
pub const TARGET: &str = "target";

/// Name of the age column, mandatory in every normalized record set
pub const AGE: &str = "age";

/// Placeholder for missing categorical values and backfilled features
pub const UNKNOWN_TOKEN: &str = "Unknown";

// ─── SourceKind ───────────────────────────────────────────────────────────────
/// The three independently-formatted input tables.
/// Declaration order is the concatenation order of the unifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    /// Survey-style personal key indicators (bucketed age, Yes/No label)
    PersonalIndicators,
    /// Heart failure clinical records (death event label)
    ClinicalRecords,
    /// Heart failure prediction dataset (ECG / exercise features)
    HeartFailure,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::PersonalIndicators,
        SourceKind::ClinicalRecords,
        SourceKind::HeartFailure,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::PersonalIndicators => "personal indicators",
            SourceKind::ClinicalRecords    => "clinical records",
            SourceKind::HeartFailure       => "heart failure",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Field ────────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Target,
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOrigin {
    Shared,
    Exclusive(SourceKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name:   String,
    pub kind:   FieldKind,
    pub origin: FieldOrigin,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind, origin: FieldOrigin) -> Self {
        Self { name: name.into(), kind, origin }
    }
}

// ─── LogicalSchema ────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalSchema {
    fields: Vec<Field>,
}

impl LogicalSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// The union schema of the three cardiovascular sources.
    pub fn cardiovascular() -> Self {
        use FieldKind::{Categorical, Numeric, Target};
        use FieldOrigin::{Exclusive, Shared};
        use SourceKind::{ClinicalRecords, HeartFailure, PersonalIndicators};

        let layout: [(&str, FieldKind, FieldOrigin); 28] = [
            (TARGET,                     Target,      Shared),
            (AGE,                        Numeric,     Shared),
            ("sex",                      Categorical, Shared),
            ("smoking",                  Categorical, Shared),
            // personal indicators
            ("bmi",                      Numeric,     Exclusive(PersonalIndicators)),
            ("physical_health",          Numeric,     Exclusive(PersonalIndicators)),
            ("mental_health",            Numeric,     Exclusive(PersonalIndicators)),
            ("diff_walking",             Categorical, Exclusive(PersonalIndicators)),
            ("physical_activity",        Categorical, Exclusive(PersonalIndicators)),
            ("gen_health",               Categorical, Exclusive(PersonalIndicators)),
            ("sleep_time",               Numeric,     Exclusive(PersonalIndicators)),
            // clinical records
            ("anaemia",                  Numeric,     Exclusive(ClinicalRecords)),
            ("creatinine_phosphokinase", Numeric,     Exclusive(ClinicalRecords)),
            ("diabetes",                 Numeric,     Exclusive(ClinicalRecords)),
            ("ejection_fraction",        Numeric,     Exclusive(ClinicalRecords)),
            ("high_blood_pressure",      Numeric,     Exclusive(ClinicalRecords)),
            ("platelets",                Numeric,     Exclusive(ClinicalRecords)),
            ("serum_creatinine",         Numeric,     Exclusive(ClinicalRecords)),
            ("serum_sodium",             Numeric,     Exclusive(ClinicalRecords)),
            // heart failure prediction
            ("chest_pain_type",          Categorical, Exclusive(HeartFailure)),
            ("resting_bp",               Numeric,     Exclusive(HeartFailure)),
            ("cholesterol",              Numeric,     Exclusive(HeartFailure)),
            ("fasting_bs",               Numeric,     Exclusive(HeartFailure)),
            ("resting_ecg",              Categorical, Exclusive(HeartFailure)),
            ("maxhr",                    Numeric,     Exclusive(HeartFailure)),
            ("exercise_angina",          Categorical, Exclusive(HeartFailure)),
            ("oldpeak",                  Numeric,     Exclusive(HeartFailure)),
            ("st_slope",                 Categorical, Exclusive(HeartFailure)),
        ];

        Self::new(
            layout.into_iter()
                .map(|(name, kind, origin)| Field::new(name, kind, origin))
                .collect(),
        )
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.field(name).map(|f| f.kind)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Fields only one source collects (the source's unique signal)
    pub fn exclusive_to(&self, source: SourceKind) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(move |f| f.origin == FieldOrigin::Exclusive(source))
    }
}
