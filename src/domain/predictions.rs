// ============================================================
// Layer 3 - Prediction Triple
// ============================================================
// (raw_preds, target, preds), all aligned to the query samples.
//
//   raw_preds - model outputs in the transformed target space
//   target    - ground truth for the query, if it was supplied
//   preds     - raw_preds decoded through the inverse target transform

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub raw_preds: Vec<f32>,
    pub target:    Option<Vec<f32>>,
    pub preds:     Vec<f32>,
}

impl Predictions {
    pub fn len(&self) -> usize { self.preds.len() }

    pub fn is_empty(&self) -> bool { self.preds.is_empty() }

    /// Destructure like the `(raw_preds, target, preds)` tuple.
    pub fn into_parts(self) -> (Vec<f32>, Option<Vec<f32>>, Vec<f32>) {
        (self.raw_preds, self.target, self.preds)
    }
}
