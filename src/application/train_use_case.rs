// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full comparison in order:
//
//   Step 1: Load the three CSV sources       (Layer 4 - data)
//   Step 2: Normalize each source            (Layer 4 - data)
//   Step 3: Unify onto the union schema      (Layer 4 - data)
//   Step 4: Encode → feature matrix + labels (Layer 4 - data)
//   Step 5: Random forest, full features     (Layer 5 - ml)
//   Step 6: PCA to 6 components              (Layer 5 - ml)
//   Step 7: Random forest, reduced features  (Layer 5 - ml)
//
// Each step takes the previous step's output and returns a new
// owned value; nothing is mutated in place across steps.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    encoder::{EncodingSummary, FeatureEncoder},
    loader::CsvLoader,
    normalizer::SchemaNormalizer,
    unifier::unify,
};
use crate::domain::{
    record_set::CombinedRecordSet,
    schema::{LogicalSchema, SourceKind},
    traits::RecordSource,
};
use crate::ml::{
    forest::ForestConfig,
    pca::{reduce, DEFAULT_COMPONENTS},
    trainer::{train_and_evaluate, RunReport, TrainerConfig},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run needs. Serialisable so it can come from a JSON
// file (see infra::config_store); every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub personal_indicators_path: String,
    pub clinical_records_path:    String,
    pub heart_failure_path:       String,
    pub test_fraction:            f64,
    pub seed:                     u64,
    pub n_trees:                  usize,
    pub n_components:             usize,
    pub yes_no_targets:           bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            personal_indicators_path: "./Data/heart_2020_cleaned.csv".to_string(),
            clinical_records_path:    "./Data/heart_failure_clinical_records_dataset.csv".to_string(),
            heart_failure_path:       "./Data/heart.csv".to_string(),
            test_fraction:            0.2,
            seed:                     42,
            n_trees:                  100,
            n_components:             DEFAULT_COMPONENTS,
            yes_no_targets:           true,
        }
    }
}

impl TrainConfig {
    /// Source paths in concatenation order
    pub fn sources(&self) -> [(SourceKind, &str); 3] {
        [
            (SourceKind::PersonalIndicators, self.personal_indicators_path.as_str()),
            (SourceKind::ClinicalRecords,    self.clinical_records_path.as_str()),
            (SourceKind::HeartFailure,       self.heart_failure_path.as_str()),
        ]
    }

    pub fn trainer(&self) -> TrainerConfig {
        TrainerConfig {
            test_fraction: self.test_fraction,
            seed:          self.seed,
            forest:        ForestConfig {
                n_trees: self.n_trees,
                seed:    self.seed,
                ..ForestConfig::default()
            },
        }
    }
}

/// Both runs plus what the encoder did to get there.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub encoding:           EncodingSummary,
    pub full:               RunReport,
    pub reduced:            RunReport,
    pub explained_variance: Vec<f64>,
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enc = &self.encoding;
        writeln!(
            f,
            "Rows: {} combined, {} dropped for unparseable targets, {} kept",
            enc.rows_in,
            enc.rows_dropped,
            enc.rows_kept(),
        )?;
        if !enc.dropped_columns.is_empty() {
            writeln!(f, "Dropped all-missing columns: {}", enc.dropped_columns.join(", "))?;
        }
        for (column, n) in &enc.coerced {
            writeln!(f, "Coerced to missing: {column} ({n} non-numeric)")?;
        }
        let imputed: usize = enc.imputed.values().sum();
        writeln!(f, "Imputed cells: {} across {} columns", imputed, enc.imputed.len())?;
        let vocab: Vec<String> = enc
            .vocabularies
            .iter()
            .map(|(column, labels)| format!("{column}={}", labels.len()))
            .collect();
        writeln!(f, "Categories: {}", vocab.join(", "))?;

        let ratios: Vec<String> = self
            .explained_variance
            .iter()
            .map(|r| format!("{r:.3}"))
            .collect();
        let total: f64 = self.explained_variance.iter().sum();
        writeln!(f, "PCA explained variance: [{}] (total {:.3})", ratios.join(", "), total)?;

        writeln!(f)?;
        writeln!(f, "{}", self.full)?;
        write!(f, "{}", self.reduced)
    }
}

// ─── Harmonization ───────────────────────────────────────────────────────────
/// Steps 1-3: load, normalize and unify the three sources.
/// Shared with the inspect command.
pub fn harmonize(cfg: &TrainConfig, schema: &LogicalSchema) -> Result<CombinedRecordSet> {
    let normalizer = SchemaNormalizer::new(schema).with_yes_no_targets(cfg.yes_no_targets);

    let mut normalized = Vec::with_capacity(3);
    for (source, path) in cfg.sources() {
        let raw = CsvLoader::new(path, source)
            .load()
            .with_context(|| format!("Failed to load the {source} source"))?;
        let set = normalizer
            .normalize(&raw)
            .with_context(|| format!("Failed to normalize the {source} source"))?;
        normalized.push(set);
    }

    unify(schema, normalized).context("Failed to unify the normalized sources")
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline end to end
    pub fn execute(&self) -> Result<ComparisonReport> {
        let cfg    = &self.config;
        let schema = LogicalSchema::cardiovascular();

        // ── Steps 1-3: harmonize ──────────────────────────────────────────────
        let combined = harmonize(cfg, &schema)?;

        // ── Step 4: encode ────────────────────────────────────────────────────
        let encoded = FeatureEncoder::new(&schema)
            .encode(combined)
            .context("Failed to build the feature matrix")?;

        // ── Step 5: full-dimensional run ──────────────────────────────────────
        let trainer = cfg.trainer();
        let full = train_and_evaluate(
            "Random Forest without PCA",
            &encoded.matrix,
            &encoded.labels,
            &trainer,
        )?;

        // ── Step 6: PCA ───────────────────────────────────────────────────────
        let (reduced_matrix, pca) = reduce(&encoded.matrix, cfg.n_components)
            .context("Failed to reduce the feature matrix")?;

        // ── Step 7: reduced run ───────────────────────────────────────────────
        let reduced = train_and_evaluate(
            "Random Forest with PCA",
            &reduced_matrix,
            &encoded.labels,
            &trainer,
        )?;

        Ok(ComparisonReport {
            encoding: encoded.summary,
            full,
            reduced,
            explained_variance: pca.explained_variance_ratio().to_vec(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    // Three small sources with no overlapping optional features.
    // Two target labels are unparseable: one clinical, one heart failure.

    const PERSONAL: &str = "\
HeartDisease,BMI,Smoking,AlcoholDrinking,PhysicalHealth,MentalHealth,DiffWalking,Sex,AgeCategory,Race,PhysicalActivity,GenHealth,SleepTime
No,16.6,Yes,No,3,30,No,Female,55-59,White,Yes,Very good,5
No,20.34,No,No,0,0,No,Female,80 or older,White,Yes,Very good,7
Yes,26.58,Yes,No,20,30,No,Male,65-69,White,Yes,Fair,8
No,24.21,No,No,0,0,No,Female,75-79,White,No,Good,6
No,23.71,No,No,28,0,Yes,Female,40-44,White,Yes,Very good,8
Yes,28.87,Yes,No,6,0,Yes,Female,75-79,Black,No,Fair,12
No,21.63,No,No,15,0,No,Female,70-74,White,Yes,Fair,4
Yes,31.64,Yes,No,5,0,Yes,Female,80 or older,White,No,Good,9
No,26.45,No,No,0,0,No,Female,80 or older,White,No,Fair,5
No,40.69,No,No,0,0,Yes,Male,65-69,White,Yes,Good,10
";

    const CLINICAL: &str = "\
age,anaemia,creatinine_phosphokinase,diabetes,ejection_fraction,high_blood_pressure,platelets,serum_creatinine,serum_sodium,sex,smoking,time,DEATH_EVENT
75,0,582,0,20,1,265000,1.9,130,1,0,4,1
55,0,7861,0,38,0,263358.03,1.1,136,1,0,6,1
65,0,146,0,20,0,162000,1.3,129,1,1,7,1
50,1,111,0,20,0,210000,1.9,137,1,0,7,n/a
65,1,160,1,20,0,327000,2.7,116,0,0,8,1
90,1,47,0,40,1,204000,2.1,132,1,1,8,0
60.667,1,315,1,60,0,454000,1.1,131,1,1,10,0
45,0,2413,0,38,0,140000,1.4,140,1,1,280,0
";

    const HEART: &str = "\
Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease
40,M,ATA,140,289,0,Normal,172,N,0,Up,0
49,F,NAP,160,180,0,Normal,156,N,1,Flat,1
37,M,ATA,130,283,0,ST,98,N,0,Up,?
48,F,ASY,138,214,0,Normal,108,Y,1.5,Flat,1
54,M,NAP,150,195,0,Normal,122,N,0,Up,0
39,M,NAP,120,339,0,Normal,170,N,0,Up,0
";

    fn write_sources(dir: &Path) -> TrainConfig {
        let personal = dir.join("heart_2020_cleaned.csv");
        let clinical = dir.join("heart_failure_clinical_records_dataset.csv");
        let heart    = dir.join("heart.csv");
        fs::write(&personal, PERSONAL).unwrap();
        fs::write(&clinical, CLINICAL).unwrap();
        fs::write(&heart, HEART).unwrap();

        TrainConfig {
            personal_indicators_path: personal.to_string_lossy().into_owned(),
            clinical_records_path:    clinical.to_string_lossy().into_owned(),
            heart_failure_path:       heart.to_string_lossy().into_owned(),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_harmonized_row_count_is_sum_of_sources() {
        let dir = TempDir::new().unwrap();
        let cfg = write_sources(dir.path());
        let combined = harmonize(&cfg, &LogicalSchema::cardiovascular()).unwrap();

        assert_eq!(combined.n_rows(), 24);
        assert_eq!(combined.rows_from(SourceKind::PersonalIndicators), 10);
        assert_eq!(combined.rows_from(SourceKind::ClinicalRecords), 8);
        assert_eq!(combined.rows_from(SourceKind::HeartFailure), 6);
        // every source contributes its exclusive columns
        assert_eq!(combined.columns.len(), 28);
    }

    #[test]
    fn test_end_to_end_comparison() {
        let dir = TempDir::new().unwrap();
        let cfg = write_sources(dir.path());
        let report = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(report.encoding.rows_in, 24);
        assert_eq!(report.encoding.rows_kept(), 22);

        let held_out = (22.0_f64 * 0.2).round() as usize;
        for run in [&report.full, &report.reduced] {
            assert_eq!(run.n_test, held_out);
            assert_eq!(run.n_train, 22 - held_out);
            assert!(!run.report.per_class.is_empty());
        }
        assert_eq!(report.reduced.n_features, 6);
        assert_eq!(report.explained_variance.len(), 6);

        let text = report.to_string();
        assert!(text.contains("Random Forest without PCA"));
        assert!(text.contains("Random Forest with PCA"));
        assert!(text.contains("Accuracy: "));
    }

    #[test]
    fn test_two_runs_are_identical() {
        let dir = TempDir::new().unwrap();
        let cfg = write_sources(dir.path());
        let a = TrainUseCase::new(cfg.clone()).execute().unwrap();
        let b = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(a.full, b.full);
        assert_eq!(a.reduced, b.reduced);
        assert_eq!(a.full.to_string(), b.full.to_string());
    }

    #[test]
    fn test_missing_source_fails_before_training() {
        let dir = TempDir::new().unwrap();
        let mut cfg = write_sources(dir.path());
        cfg.heart_failure_path = dir.path().join("nope.csv").to_string_lossy().into_owned();

        let err = TrainUseCase::new(cfg).execute().unwrap_err();
        assert!(format!("{err:#}").contains("heart failure"));
    }

    #[test]
    fn test_trainer_config_carries_seed_and_trees() {
        let cfg = TrainConfig { seed: 9, n_trees: 12, ..TrainConfig::default() };
        let trainer = cfg.trainer();
        assert_eq!(trainer.seed, 9);
        assert_eq!(trainer.forest.seed, 9);
        assert_eq!(trainer.forest.n_trees, 12);
    }
}
