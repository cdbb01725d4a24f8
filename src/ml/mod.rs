// ============================================================
// Layer 5 - ML Layer
// ============================================================
// Model code only: no CSV, no schema knowledge. Everything here
// works on ndarray matrices handed over by the data layer.
//
//   tree.rs     - CART classification tree (Gini, random
//                 feature subsets per split)
//
//   forest.rs   - Random forest: bootstrap + soft voting,
//                 seeded with ChaCha8Rng
//
//   pca.rs      - Orthogonal projection onto the top principal
//                 components (nalgebra eigendecomposition)
//
//   trainer.rs  - Split, fit, predict, report
//
// Reference: Breiman (2001) Random Forests
//            ndarray / nalgebra crate documentation

/// Single decision tree
pub mod tree;

/// Bagged ensemble of trees
pub mod forest;

/// Principal component analysis
pub mod pca;

/// One train + evaluate run
pub mod trainer;
