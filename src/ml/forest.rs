// ============================================================
// Layer 5 - Random Forest
// ============================================================
// Bagged ensemble of CART trees with the usual defaults:
//
//   - n_trees           100
//   - bootstrap         n draws with replacement per tree
//   - max_features      floor(sqrt(n_features)), at least 1
//   - min_samples_split 2 (trees grow until leaves are pure)
//   - prediction        average of leaf distributions (soft
//                       voting), ties go to the lower class
//
// Determinism: a master ChaCha8Rng seeded with `seed` hands each
// tree its own u64 seed. Same data + same seed → same forest,
// bit for bit, regardless of platform.

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::Classifier;
use crate::ml::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees:           usize,
    pub seed:              u64,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees:           100,
            seed:              42,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees:   Vec<DecisionTree>,
    /// sorted distinct training labels; tree outputs index into this
    classes: Vec<f64>,
}

impl RandomForest {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, cfg: &ForestConfig) -> Result<Self> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(PipelineError::empty("cannot fit a forest on zero training rows"));
        }
        if n_rows != y.len() {
            return Err(PipelineError::schema(
                "training matrix",
                format!("{} feature rows but {} labels", n_rows, y.len()),
            ));
        }
        if cfg.n_trees == 0 {
            return Err(PipelineError::empty("a forest needs at least one tree"));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(f64::total_cmp);
        classes.dedup();

        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| classes.binary_search_by(|c| c.total_cmp(v)).unwrap_or_default())
            .collect();

        let params = TreeParams {
            max_features:      ((n_features as f64).sqrt().floor() as usize).max(1),
            min_samples_split: cfg.min_samples_split.max(2),
        };

        let mut master = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut trees  = Vec::with_capacity(cfg.n_trees);
        for _ in 0..cfg.n_trees {
            let mut rng = ChaCha8Rng::seed_from_u64(master.gen::<u64>());
            let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            trees.push(DecisionTree::fit(x, &y_idx, bootstrap, classes.len(), params, &mut rng));
        }

        let mean_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>() / trees.len();
        tracing::debug!(
            "Fitted random forest: {} trees (~{} nodes each), {} classes, max_features={}",
            trees.len(),
            mean_nodes,
            classes.len(),
            params.max_features,
        );

        Ok(Self { trees, classes })
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Mean class distribution over all trees, indexed like `classes()`
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }
}

impl Classifier for RandomForest {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let proba = self.predict_proba(row);
        // first maximum wins
        let mut best = 0;
        for (i, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    fn blobs() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.1], [0.2, 0.0], [0.1, 0.3], [0.3, 0.2], [0.2, 0.2],
            [5.0, 5.1], [5.2, 4.9], [4.8, 5.0], [5.1, 5.3], [4.9, 4.8],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separates_two_blobs() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(x.view(), y.view(), &ForestConfig::default()).unwrap();
        assert_eq!(forest.classes(), &[0.0, 1.0]);
        assert_eq!(forest.predict_row(&[0.1, 0.1]), 0.0);
        assert_eq!(forest.predict_row(&[5.0, 5.0]), 1.0);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(x.view(), y.view(), &ForestConfig::default()).unwrap();
        let p = forest.predict_proba(&[2.5, 2.5]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (x, y) = blobs();
        let cfg = ForestConfig { n_trees: 25, ..Default::default() };
        let a = RandomForest::fit(x.view(), y.view(), &cfg).unwrap();
        let b = RandomForest::fit(x.view(), y.view(), &cfg).unwrap();
        for probe in [[2.4, 2.6], [1.0, 4.0], [4.0, 1.0]] {
            let pa = a.predict_proba(&probe);
            let pb = b.predict_proba(&probe);
            assert_eq!(pa, pb);
        }
    }

    #[test]
    fn test_single_class_training() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        let forest = RandomForest::fit(x.view(), y.view(), &ForestConfig::default()).unwrap();
        assert_eq!(forest.predict_row(&[100.0]), 1.0);
    }

    #[test]
    fn test_zero_rows_is_empty_dataset() {
        let x = Array2::<f64>::zeros((0, 3));
        let y = Array1::<f64>::zeros(0);
        let err = RandomForest::fit(x.view(), y.view(), &ForestConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyDataset(_)));
    }
}
