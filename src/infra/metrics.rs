// ============================================================
// Layer 6 - Classification Metrics
// ============================================================
// Accuracy plus a per-class precision / recall / F1 / support
// breakdown of held-out predictions, printed as a table:
//
//                 precision    recall  f1-score   support
//
//              0       0.83      0.71      0.77         7
//              1       0.75      0.86      0.80         7
//
//       accuracy                           0.79        14
//      macro avg       0.79      0.79      0.78        14
//   weighted avg       0.79      0.79      0.78        14
//
// Classes are the union of true and predicted labels. Any ratio
// whose denominator is zero is reported as 0.0 instead of NaN.
//
// A class that shows up in only one of the train / held-out
// partitions produces a LabelImbalanceWarning. It is recorded in
// the report (and logged), never raised as an error.
//
// Reference: Rust Book §10 (Traits - Display)

use std::fmt;

use crate::domain::error::{PipelineError, Result};

// ─── Label Imbalance ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Train,
    HeldOut,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Train   => f.write_str("training"),
            Partition::HeldOut => f.write_str("held-out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelImbalanceWarning {
    pub label:        f64,
    pub missing_from: Partition,
}

impl fmt::Display for LabelImbalanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LabelImbalanceWarning: class {} is absent from the {} partition",
            self.label, self.missing_from,
        )
    }
}

// ─── Metrics ──────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label:     f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub accuracy:     f64,
    pub per_class:    Vec<ClassMetrics>,
    pub macro_avg:    AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// number of held-out rows
    pub total:        usize,
    pub warnings:     Vec<LabelImbalanceWarning>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

fn sorted_labels<'a>(sets: impl IntoIterator<Item = &'a [f64]>) -> Vec<f64> {
    let mut labels: Vec<f64> = sets.into_iter().flatten().copied().collect();
    labels.sort_by(f64::total_cmp);
    labels.dedup();
    labels
}

impl ClassificationReport {
    pub fn from_predictions(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PipelineError::schema(
                "held-out predictions",
                format!("{} labels but {} predictions", y_true.len(), y_pred.len()),
            ));
        }

        let total   = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

        let per_class: Vec<ClassMetrics> = sorted_labels([y_true, y_pred])
            .into_iter()
            .map(|label| {
                let mut tp = 0usize;
                let mut predicted = 0usize;
                let mut support = 0usize;
                for (&t, &p) in y_true.iter().zip(y_pred) {
                    if p == label {
                        predicted += 1;
                    }
                    if t == label {
                        support += 1;
                        if p == label {
                            tp += 1;
                        }
                    }
                }
                let precision = ratio(tp, predicted);
                let recall    = ratio(tp, support);
                ClassMetrics { label, precision, recall, f1: f1_score(precision, recall), support }
            })
            .collect();

        let n_classes = per_class.len().max(1) as f64;
        let macro_avg = AverageMetrics {
            precision: per_class.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall:    per_class.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1:        per_class.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        let weight = |c: &ClassMetrics| ratio(c.support, total);
        let weighted_avg = AverageMetrics {
            precision: per_class.iter().map(|c| c.precision * weight(c)).sum(),
            recall:    per_class.iter().map(|c| c.recall * weight(c)).sum(),
            f1:        per_class.iter().map(|c| c.f1 * weight(c)).sum(),
        };

        Ok(Self {
            accuracy: ratio(correct, total),
            per_class,
            macro_avg,
            weighted_avg,
            total,
            warnings: Vec::new(),
        })
    }

    /// Record a warning for every class that appears in one partition
    /// but not the other.
    pub fn check_partitions(mut self, train: &[f64], held_out: &[f64]) -> Self {
        for label in sorted_labels([train, held_out]) {
            let in_train    = train.contains(&label);
            let in_held_out = held_out.contains(&label);
            let missing_from = match (in_train, in_held_out) {
                (false, _) => Partition::Train,
                (_, false) => Partition::HeldOut,
                _          => continue,
            };
            let warning = LabelImbalanceWarning { label, missing_from };
            tracing::warn!("{}", warning);
            self.warnings.push(warning);
        }
        self
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.per_class {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support,
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total,
            )?;
        }
        for w in &self.warnings {
            writeln!(f, "{w}")?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_metrics() {
        let y_true = [1.0, 1.0, 1.0, 0.0, 0.0];
        let y_pred = [1.0, 1.0, 0.0, 0.0, 1.0];
        let r = ClassificationReport::from_predictions(&y_true, &y_pred).unwrap();

        assert!((r.accuracy - 0.6).abs() < 1e-12);
        let one = &r.per_class[1];
        assert_eq!(one.label, 1.0);
        assert!((one.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((one.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(one.support, 3);
        assert_eq!(r.per_class[0].support, 2);
    }

    #[test]
    fn test_predicted_only_class_gets_zero_recall_row() {
        // class 2 is never true, only predicted
        let r = ClassificationReport::from_predictions(&[0.0, 0.0], &[0.0, 2.0]).unwrap();
        assert_eq!(r.per_class.len(), 2);
        let two = &r.per_class[1];
        assert_eq!(two.support, 0);
        assert_eq!(two.recall, 0.0);
        assert_eq!(two.precision, 0.0);
    }

    #[test]
    fn test_partition_warnings() {
        let r = ClassificationReport::from_predictions(&[0.0, 1.0], &[0.0, 0.0])
            .unwrap()
            .check_partitions(&[0.0, 0.0, 0.0], &[0.0, 1.0]);
        assert_eq!(
            r.warnings,
            vec![LabelImbalanceWarning { label: 1.0, missing_from: Partition::Train }]
        );
        assert!(r.to_string().contains("absent from the training partition"));
    }

    #[test]
    fn test_balanced_partitions_have_no_warnings() {
        let r = ClassificationReport::from_predictions(&[0.0, 1.0], &[0.0, 1.0])
            .unwrap()
            .check_partitions(&[0.0, 1.0], &[1.0, 0.0]);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_length_mismatch_is_error() {
        let err = ClassificationReport::from_predictions(&[0.0, 1.0, 1.0], &[0.0]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
        assert!(err.to_string().contains("3 labels but 1 predictions"));
    }

    #[test]
    fn test_report_layout() {
        let r = ClassificationReport::from_predictions(&[0.0, 1.0, 1.0], &[0.0, 1.0, 0.0]).unwrap();
        let text = r.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("    accuracy"));
        assert!(text.contains("weighted avg"));
        // one row per class
        assert!(text.lines().any(|l| l.trim_start().starts_with("0 ")));
        assert!(text.lines().any(|l| l.trim_start().starts_with("1 ")));
    }
}
