// ============================================================
// Layer 5 - Backend Selection
// ============================================================
// CPU (ndarray) by default; build with `--features wgpu` to train
// and predict on the GPU. Training always wraps the inference
// backend in Autodiff.

use burn::prelude::*;

use crate::error::{Result, TsError};

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

/// Copy a float tensor back to host memory as f32.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| TsError::Tensor(format!("{e:?}")))
}
