// ============================================================
// Layer 5 - Dimensionality Reducer (PCA)
// ============================================================
// Orthogonal projection of the standardized feature matrix onto
// its top principal components.
//
//   1. centre:      X_c = X - mean(X)
//   2. covariance:  C   = X_cᵀ X_c / (n - 1)
//   3. eigen:       C   = V Λ Vᵀ   (nalgebra SymmetricEigen)
//   4. keep the k eigenvectors with the largest eigenvalues
//   5. project:     Z   = X_c V_k
//
// Eigenvectors are only defined up to sign, so each component
// is flipped until its largest-magnitude loading is positive.
// No randomness anywhere: same input, same projection.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2, Axis};

use crate::data::encoder::FeatureMatrix;
use crate::domain::error::{PipelineError, Result};

/// Component count of the reduced comparison run
pub const DEFAULT_COMPONENTS: usize = 6;

#[derive(Debug, Clone)]
pub struct Pca {
    mean:       Array1<f64>,
    /// k x p, one component per row
    components: Array2<f64>,
    explained_variance_ratio: Vec<f64>,
}

impl Pca {
    pub fn fit(x: &Array2<f64>, n_components: usize) -> Result<Self> {
        let (n_rows, n_cols) = x.dim();
        if n_rows == 0 {
            return Err(PipelineError::empty("cannot fit PCA on zero rows"));
        }
        if n_components == 0 || n_components > n_cols {
            return Err(PipelineError::Dimensionality {
                requested: n_components,
                available: n_cols,
            });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::empty("cannot fit PCA on zero rows"))?;
        let centered = x - &mean;
        let dof = (n_rows.max(2) - 1) as f64;
        let cov = centered.t().dot(&centered) / dof;

        let eigen = DMatrix::from_fn(n_cols, n_cols, |i, j| cov[[i, j]]).symmetric_eigen();

        // stable sort keeps index order among equal eigenvalues
        let mut order: Vec<usize> = (0..n_cols).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let total_variance: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();

        let mut components = Array2::zeros((n_components, n_cols));
        let mut explained_variance_ratio = Vec::with_capacity(n_components);
        for (k, &idx) in order.iter().take(n_components).enumerate() {
            let vector = eigen.eigenvectors.column(idx);

            let pivot = (0..n_cols)
                .max_by(|&a, &b| vector[a].abs().total_cmp(&vector[b].abs()))
                .unwrap_or(0);
            let sign = if vector[pivot] < 0.0 { -1.0 } else { 1.0 };
            for j in 0..n_cols {
                components[[k, j]] = sign * vector[j];
            }

            explained_variance_ratio.push(if total_variance > 0.0 {
                eigen.eigenvalues[idx].max(0.0) / total_variance
            } else {
                0.0
            });
        }

        Ok(Self { mean, components, explained_variance_ratio })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.mean).dot(&self.components.t())
    }

    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }
}

/// Fit PCA on `matrix` and return the projected matrix (columns
/// `pc1..pcK`) alongside the fitted model.
pub fn reduce(matrix: &FeatureMatrix, n_components: usize) -> Result<(FeatureMatrix, Pca)> {
    let pca = Pca::fit(matrix.values(), n_components)?;
    let projected = pca.transform(matrix.values());
    let columns = (1..=pca.n_components()).map(|k| format!("pc{k}")).collect();

    tracing::info!(
        "PCA: {} → {} columns, explained variance {:.3}",
        matrix.n_cols(),
        pca.n_components(),
        pca.explained_variance_ratio().iter().sum::<f64>(),
    );

    Ok((FeatureMatrix::new(columns, projected), pca))
}
