// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting pieces that no single business layer owns:
//
//   config_store.rs - Reads a TrainConfig from JSON so runs can
//                     be reproduced from a file instead of a
//                     long list of CLI flags.
//
//   metrics.rs      - Accuracy and the per-class precision /
//                     recall / F1 table printed for each run,
//                     plus label-imbalance warnings.
//
// Reference: Rust Book §7 (Modules)

/// JSON config loading
pub mod config_store;

/// Classification report and label-imbalance warnings
pub mod metrics;
