// ============================================================
// Layer 3 - TsArray Domain Type
// ============================================================
// A dense batch of multivariate time series.
//
// Memory layout is sample-major, then channel, then time step:
//   data[(s * n_vars + v) * seq_len + t]
//
// This is the same layout as a [samples, vars, steps] tensor,
// so a selection of samples can be handed to the batcher as a
// contiguous slice per sample.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

/// Feature matrix X: `n_samples` series of `n_vars` channels by `seq_len` steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsArray {
    data:      Vec<f32>,
    n_samples: usize,
    n_vars:    usize,
    seq_len:   usize,
}

impl TsArray {
    /// Wrap a flat buffer, checking that it matches the declared shape.
    pub fn new(data: Vec<f32>, n_samples: usize, n_vars: usize, seq_len: usize) -> Result<Self> {
        let expected = n_samples * n_vars * seq_len;
        if data.len() != expected {
            return Err(TsError::ShapeMismatch(format!(
                "buffer holds {} values but shape [{n_samples}, {n_vars}, {seq_len}] needs {expected}",
                data.len()
            )));
        }
        Ok(Self { data, n_samples, n_vars, seq_len })
    }

    /// An array with no samples but a fixed per-sample shape.
    pub fn empty(n_vars: usize, seq_len: usize) -> Self {
        Self { data: Vec::new(), n_samples: 0, n_vars, seq_len }
    }

    pub fn len(&self) -> usize { self.n_samples }

    pub fn is_empty(&self) -> bool { self.n_samples == 0 }

    pub fn n_vars(&self) -> usize { self.n_vars }

    pub fn seq_len(&self) -> usize { self.seq_len }

    /// `[n_samples, n_vars, seq_len]`
    pub fn shape(&self) -> [usize; 3] { [self.n_samples, self.n_vars, self.seq_len] }

    /// Number of values in one sample.
    pub fn sample_size(&self) -> usize { self.n_vars * self.seq_len }

    pub fn as_slice(&self) -> &[f32] { &self.data }

    /// All channels of one sample, or None when out of range.
    pub fn sample(&self, index: usize) -> Option<&[f32]> {
        if index >= self.n_samples {
            return None;
        }
        let size = self.sample_size();
        Some(&self.data[index * size..(index + 1) * size])
    }

    /// Copy the given samples, in order, into a new array.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        let size     = self.sample_size();
        let mut data = Vec::with_capacity(indices.len() * size);
        for &i in indices {
            let sample = self.sample(i).ok_or_else(|| {
                TsError::ShapeMismatch(format!(
                    "index {i} out of range for {} samples", self.n_samples
                ))
            })?;
            data.extend_from_slice(sample);
        }
        Ok(Self { data, n_samples: indices.len(), n_vars: self.n_vars, seq_len: self.seq_len })
    }

    /// Stack `other` below `self`. Both must share the per-sample shape.
    pub fn concat(mut self, other: &TsArray) -> Result<Self> {
        if self.n_vars != other.n_vars || self.seq_len != other.seq_len {
            return Err(TsError::ShapeMismatch(format!(
                "cannot concatenate [_, {}, {}] with [_, {}, {}]",
                self.n_vars, self.seq_len, other.n_vars, other.seq_len
            )));
        }
        self.data.extend_from_slice(&other.data);
        self.n_samples += other.n_samples;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, v: usize, l: usize) -> TsArray {
        let data = (0..n * v * l).map(|i| i as f32).collect();
        TsArray::new(data, n, v, l).unwrap()
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        let err = TsArray::new(vec![0.0; 5], 2, 1, 3).unwrap_err();
        assert!(matches!(err, TsError::ShapeMismatch(_)));
    }

    #[test]
    fn test_sample_slices_are_contiguous() {
        let x = ramp(3, 2, 2);
        assert_eq!(x.sample(1).unwrap(), &[4.0, 5.0, 6.0, 7.0]);
        assert!(x.sample(3).is_none());
    }

    #[test]
    fn test_select_keeps_order() {
        let x   = ramp(3, 1, 2);
        let sel = x.select(&[2, 0]).unwrap();
        assert_eq!(sel.shape(), [2, 1, 2]);
        assert_eq!(sel.as_slice(), &[4.0, 5.0, 0.0, 1.0]);
    }

    #[test]
    fn test_select_out_of_range() {
        let x = ramp(2, 1, 2);
        assert!(matches!(x.select(&[5]), Err(TsError::ShapeMismatch(_))));
    }

    #[test]
    fn test_concat_checks_shape() {
        let a = ramp(2, 2, 3);
        let b = ramp(1, 3, 3);
        assert!(a.clone().concat(&b).is_err());
        let c = a.concat(&ramp(1, 2, 3)).unwrap();
        assert_eq!(c.len(), 3);
    }
}
