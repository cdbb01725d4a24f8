// ============================================================
// Layer 5 - Trainer / Evaluator
// ============================================================
// One evaluation run:
//
//   rows ─► split_train_test(seed) ─► fit RandomForest on train
//                                    └► predict held-out rows
//                                       └► ClassificationReport
//
// The same function serves both comparison runs; only the
// feature matrix differs (full vs PCA-reduced). Both runs use the
// same seed, so they see the same row partition.

use std::fmt;

use ndarray::{Array1, Axis};

use crate::data::encoder::FeatureMatrix;
use crate::data::splitter::split_train_test;
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::Classifier;
use crate::infra::metrics::ClassificationReport;
use crate::ml::forest::{ForestConfig, RandomForest};

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub test_fraction: f64,
    pub seed:          u64,
    pub forest:        ForestConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed:          42,
            forest:        ForestConfig::default(),
        }
    }
}

/// Outcome of one train + evaluate run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub name:       String,
    pub n_features: usize,
    pub n_train:    usize,
    pub n_test:     usize,
    pub report:     ClassificationReport,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(
            f,
            "Features: {} | training rows: {} | held-out rows: {}",
            self.n_features, self.n_train, self.n_test,
        )?;
        writeln!(f, "Accuracy: {}", self.report.accuracy)?;
        write!(f, "{}", self.report)
    }
}

pub fn train_and_evaluate(
    name:   &str,
    matrix: &FeatureMatrix,
    labels: &Array1<f64>,
    cfg:    &TrainerConfig,
) -> Result<RunReport> {
    let n_rows = matrix.n_rows();
    if n_rows != labels.len() {
        return Err(PipelineError::schema(
            "feature matrix",
            format!("{} rows but {} labels", n_rows, labels.len()),
        ));
    }

    let (train_idx, test_idx) = split_train_test((0..n_rows).collect(), cfg.test_fraction, cfg.seed);
    if train_idx.is_empty() {
        return Err(PipelineError::empty("training partition is empty"));
    }
    if test_idx.is_empty() {
        return Err(PipelineError::empty("held-out partition is empty"));
    }

    let x_train = matrix.values().select(Axis(0), &train_idx);
    let y_train = labels.select(Axis(0), &train_idx);
    let x_test  = matrix.values().select(Axis(0), &test_idx);
    let y_test  = labels.select(Axis(0), &test_idx).to_vec();

    tracing::info!(
        "[{}] training on {} rows x {} features, evaluating on {} rows",
        name,
        x_train.nrows(),
        x_train.ncols(),
        x_test.nrows(),
    );

    let forest = RandomForest::fit(x_train.view(), y_train.view(), &cfg.forest)?;
    tracing::debug!("[{}] training labels: {:?}", name, forest.classes());

    let test_rows: Vec<Vec<f64>> = x_test.outer_iter().map(|r| r.to_vec()).collect();
    let y_pred = forest.predict_rows(test_rows.iter().map(Vec::as_slice));

    let report = ClassificationReport::from_predictions(&y_test, &y_pred)?
        .check_partitions(&y_train.to_vec(), &y_test);

    tracing::info!("[{}] accuracy {:.4}", name, report.accuracy);

    Ok(RunReport {
        name:       name.to_string(),
        n_features: matrix.n_cols(),
        n_train:    train_idx.len(),
        n_test:     test_idx.len(),
        report,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn toy() -> (FeatureMatrix, Array1<f64>) {
        let n = 30;
        let values = Array2::from_shape_fn((n, 3), |(r, c)| {
            let base = if r % 2 == 0 { -1.0 } else { 1.0 };
            base + (c as f64) * 0.01 * (r as f64)
        });
        let labels = Array1::from_shape_fn(n, |r| (r % 2) as f64);
        (FeatureMatrix::new(vec!["a".into(), "b".into(), "c".into()], values), labels)
    }

    #[test]
    fn test_partition_sizes() {
        let (m, y) = toy();
        let run = train_and_evaluate("toy", &m, &y, &TrainerConfig::default()).unwrap();
        assert_eq!(run.n_test, 6);
        assert_eq!(run.n_train, 24);
        assert_eq!(run.report.total, 6);
        assert_eq!(run.n_features, 3);
    }

    #[test]
    fn test_learns_separable_signal() {
        let (m, y) = toy();
        let run = train_and_evaluate("toy", &m, &y, &TrainerConfig::default()).unwrap();
        assert_eq!(run.report.accuracy, 1.0);
    }

    #[test]
    fn test_runs_are_bit_identical() {
        let (m, y) = toy();
        let cfg = TrainerConfig::default();
        let a = train_and_evaluate("toy", &m, &y, &cfg).unwrap();
        let b = train_and_evaluate("toy", &m, &y, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.report.accuracy.to_bits(), b.report.accuracy.to_bits());
    }

    #[test]
    fn test_label_count_mismatch_rejected() {
        let (m, _) = toy();
        let y = Array1::zeros(3);
        assert!(train_and_evaluate("toy", &m, &y, &TrainerConfig::default()).is_err());
    }

    #[test]
    fn test_too_few_rows_for_held_out() {
        let m = FeatureMatrix::new(vec!["a".into()], Array2::zeros((2, 1)));
        let y = Array1::from(vec![0.0, 1.0]);
        let err = train_and_evaluate("tiny", &m, &y, &TrainerConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset(_)));
    }
}
