// ============================================================
// Layer 3 - Splits Domain Type
// ============================================================
// A pair of index sets into X / y:
//   - train: positions the optimiser sees
//   - valid: positions used to measure generalisation
//
// The two sets must be disjoint and in range. They do not have
// to cover every sample.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Splits {
    pub train: Vec<usize>,
    pub valid: Vec<usize>,
}

impl Splits {
    pub fn new(train: Vec<usize>, valid: Vec<usize>) -> Self {
        Self { train, valid }
    }

    /// The fixed split of a dataset shipped as TRAIN + TEST files:
    /// the first `n_train` samples train, the following `n_valid` validate.
    pub fn contiguous(n_train: usize, n_valid: usize) -> Self {
        Self {
            train: (0..n_train).collect(),
            valid: (n_train..n_train + n_valid).collect(),
        }
    }

    /// Check the split against a dataset of `n` samples.
    pub fn validate(&self, n: usize) -> Result<()> {
        if self.train.is_empty() {
            return Err(TsError::ShapeMismatch("training split is empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.train.len());
        for &i in &self.train {
            if i >= n {
                return Err(TsError::ShapeMismatch(format!(
                    "train index {i} out of range for {n} samples"
                )));
            }
            if !seen.insert(i) {
                return Err(TsError::ShapeMismatch(format!("train index {i} repeated")));
            }
        }

        let mut seen_valid = HashSet::with_capacity(self.valid.len());
        for &i in &self.valid {
            if i >= n {
                return Err(TsError::ShapeMismatch(format!(
                    "valid index {i} out of range for {n} samples"
                )));
            }
            if seen.contains(&i) {
                return Err(TsError::ShapeMismatch(format!(
                    "index {i} is in both train and valid splits"
                )));
            }
            if !seen_valid.insert(i) {
                return Err(TsError::ShapeMismatch(format!("valid index {i} repeated")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_is_disjoint() {
        let s = Splits::contiguous(3, 2);
        assert_eq!(s.train, vec![0, 1, 2]);
        assert_eq!(s.valid, vec![3, 4]);
        assert!(s.validate(5).is_ok());
    }

    #[test]
    fn test_overlap_rejected() {
        let s = Splits::new(vec![0, 1], vec![1, 2]);
        assert!(matches!(s.validate(3), Err(TsError::ShapeMismatch(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let s = Splits::new(vec![0, 1], vec![9]);
        assert!(s.validate(3).is_err());
    }

    #[test]
    fn test_empty_train_rejected() {
        let s = Splits::new(vec![], vec![0]);
        assert!(s.validate(1).is_err());
    }

    #[test]
    fn test_empty_valid_allowed() {
        assert!(Splits::new(vec![0, 1], vec![]).validate(2).is_ok());
    }
}
