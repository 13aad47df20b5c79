// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs and traits describing the data that flows
// through the pipeline. No Burn types, no file or network I/O.

// Feature matrix X: [samples, vars, steps]
pub mod ts_array;

// Train / validation index sets
pub mod splits;

// X, y and splits as returned by the dataset loader
pub mod regression_data;

// (raw_preds, target, preds)
pub mod predictions;

// Abstractions implemented by the data and ml layers
pub mod traits;
