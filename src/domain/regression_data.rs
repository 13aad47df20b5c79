// ============================================================
// Layer 3 - Regression Dataset Types
// ============================================================
// What the dataset loader hands back to the application layer.
//
//   split_data = false → RegressionData      (X, y, splits)
//   split_data = true  → SplitRegressionData (X_train, y_train, X_valid, y_valid)

use serde::{Deserialize, Serialize};

use crate::domain::{splits::Splits, ts_array::TsArray};
use crate::error::{Result, TsError};

/// X, y and the train/valid split, index-aligned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionData {
    pub name:   String,
    pub x:      TsArray,
    pub y:      Vec<f32>,
    pub splits: Splits,
}

impl RegressionData {
    /// Build and check `len(x) == len(y)` and the split invariants.
    pub fn new(name: impl Into<String>, x: TsArray, y: Vec<f32>, splits: Splits) -> Result<Self> {
        if x.len() != y.len() {
            return Err(TsError::ShapeMismatch(format!(
                "X has {} samples but y has {}", x.len(), y.len()
            )));
        }
        splits.validate(x.len())?;
        Ok(Self { name: name.into(), x, y, splits })
    }

    pub fn len(&self) -> usize { self.x.len() }

    pub fn is_empty(&self) -> bool { self.x.is_empty() }

    /// Features and targets of the validation split.
    pub fn valid_set(&self) -> Result<(TsArray, Vec<f32>)> {
        let x = self.x.select(&self.splits.valid)?;
        let y = self.splits.valid.iter().map(|&i| self.y[i]).collect();
        Ok((x, y))
    }

    /// Materialise both splits as separate arrays.
    pub fn into_split(self) -> Result<SplitRegressionData> {
        let x_train = self.x.select(&self.splits.train)?;
        let y_train = self.splits.train.iter().map(|&i| self.y[i]).collect();
        let (x_valid, y_valid) = self.valid_set()?;
        Ok(SplitRegressionData { name: self.name, x_train, y_train, x_valid, y_valid })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitRegressionData {
    pub name:    String,
    pub x_train: TsArray,
    pub y_train: Vec<f32>,
    pub x_valid: TsArray,
    pub y_valid: Vec<f32>,
}
