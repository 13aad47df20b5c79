// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits, not the
// concrete loader or model types:
//
//   DatasetSource - anything that can resolve a dataset name
//                   into X, y and a split
//   Predictor     - anything that can turn X (and optionally y)
//                   into a prediction triple
//
// The trained regressor and the regressor reloaded from an
// artifact both implement Predictor, which is how the export /
// reload round trip is compared.

use crate::domain::{
    predictions::Predictions,
    regression_data::RegressionData,
    ts_array::TsArray,
};
use crate::error::Result;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Implementations:
///   - MonashArchive → local cache of .ts files, downloaded on demand
pub trait DatasetSource {
    /// Load the named dataset with its fixed train/valid split.
    fn load(&self, name: &str) -> Result<RegressionData>;
}

// ─── Predictor ────────────────────────────────────────────────────────────────
/// Implementations:
///   - TsRegressor  → the in-memory model right after training
///   - TsInferencer → the model rebuilt from an exported artifact
pub trait Predictor {
    fn get_x_preds(&self, x: &TsArray, y: Option<&[f32]>) -> Result<Predictions>;
}
