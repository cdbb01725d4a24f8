// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types that describe the harmonization problem:
// which sources exist, which logical features they map onto,
// and the record sets that flow between pipeline stages.
//
// Rules for this layer:
//   - NO file I/O
//   - NO numeric/ML crates (ndarray, nalgebra live in Layer 4/5)
//   - Only plain structs, enums, traits and the error type
//
// Every pipeline stage consumes one of these types and returns
// a new owned one, so no stage ever mutates a table another
// stage still holds.
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

// Domain error taxonomy (thiserror)
pub mod error;

// The canonical feature vocabulary and source identities
pub mod schema;

// Raw, normalized and combined record sets
pub mod record_set;

// Core abstractions (traits) that other layers implement
pub mod traits;
