// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer strings the data and ml layers together into the
// two things a user can ask for:
//
//   - train:   harmonize, encode, and compare a random forest on
//              full features against one on PCA features
//   - inspect: harmonize only, then report row counts and
//              per-column missingness
//
// No printing here (that's Layer 1) and no model math (Layer 5).
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The full comparison workflow
pub mod train_use_case;

// The harmonization report
pub mod inspect_use_case;
