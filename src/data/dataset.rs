use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::transforms::TfmSpec;
use crate::domain::ts_array::TsArray;
use crate::error::{Result, TsError};

/// One series with its encoded target.
/// `x` is laid out as [n_vars, seq_len]; the input transform is already applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TsSample {
    pub x: Vec<f32>,
    pub y: f32,
}

pub struct TsDataset {
    samples: Vec<TsSample>,
}

impl TsDataset {
    pub fn new(samples: Vec<TsSample>) -> Self { Self { samples } }

    /// Pick `indices` out of X / y, applying the per-sample transforms.
    /// Without targets every sample gets y = 0 (inference only).
    pub fn from_indices(
        x:       &TsArray,
        y:       Option<&[f32]>,
        indices: &[usize],
        tfms:    &TfmSpec,
    ) -> Result<Self> {
        let mut samples = Vec::with_capacity(indices.len());
        for &i in indices {
            let series = x.sample(i).ok_or_else(|| {
                TsError::ShapeMismatch(format!("index {i} out of range for {} samples", x.len()))
            })?;
            let mut series = series.to_vec();
            tfms.input.apply(&mut series);

            let target = match y {
                Some(y) => tfms.target.encode(*y.get(i).ok_or_else(|| {
                    TsError::ShapeMismatch(format!("no target for sample {i}"))
                })?),
                None => 0.0,
            };
            samples.push(TsSample { x: series, y: target });
        }
        Ok(Self { samples })
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<TsSample> for TsDataset {
    fn get(&self, index: usize) -> Option<TsSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::transforms::{InputTransform, TargetTransform};

    #[test]
    fn test_from_indices_applies_tfms() {
        let x = TsArray::new(vec![1.0, f32::NAN, 3.0, 4.0], 2, 1, 2).unwrap();
        let y = [10.0, 20.0];
        let tfms = TfmSpec {
            input:  InputTransform::Nan2Value(-1.0),
            target: TargetTransform::Standardize { mean: 10.0, std: 10.0 },
        };
        let ds = TsDataset::from_indices(&x, Some(y.as_slice()), &[1, 0], &tfms).unwrap();

        assert_eq!(ds.len(), 2);
        let first = ds.get(0).unwrap();
        assert_eq!(first.x, vec![3.0, 4.0]);
        assert_eq!(first.y, 1.0);
        assert_eq!(ds.get(1).unwrap().x, vec![1.0, -1.0]);
    }

    #[test]
    fn test_without_targets() {
        let x  = TsArray::new(vec![1.0, 2.0], 1, 1, 2).unwrap();
        let ds = TsDataset::from_indices(&x, None, &[0], &TfmSpec::default()).unwrap();
        assert_eq!(ds.get(0).unwrap().y, 0.0);
    }
}
