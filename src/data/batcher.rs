// ============================================================
// Layer 4 - Time Series Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<TsSample>
// into tensors, applying the batch transform on the way.
//
//   Input:  N samples, each [n_vars * seq_len] values + 1 target
//   Output: x [N, n_vars, seq_len], y [N, 1]
//
// The batch transform (TsStandardize) runs here, once per
// mini-batch, both during training and at inference time, so the
// model always sees inputs on the same scale.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::{dataset::TsSample, transforms::TsStandardize};

#[derive(Debug, Clone)]
pub struct TsBatch<B: Backend> {
    /// [batch_size, n_vars, seq_len]
    pub x: Tensor<B, 3>,
    /// [batch_size, 1]
    pub y: Tensor<B, 2>,
}

#[derive(Clone, Debug)]
pub struct TsBatcher<B: Backend> {
    pub device: B::Device,
    n_vars:     usize,
    seq_len:    usize,
    batch_tfm:  Option<TsStandardize>,
}

impl<B: Backend> TsBatcher<B> {
    pub fn new(
        device:    B::Device,
        n_vars:    usize,
        seq_len:   usize,
        batch_tfm: Option<TsStandardize>,
    ) -> Self {
        Self { device, n_vars, seq_len, batch_tfm }
    }
}

impl<B: Backend> Batcher<TsSample, TsBatch<B>> for TsBatcher<B> {
    fn batch(&self, items: Vec<TsSample>) -> TsBatch<B> {
        let batch_size = items.len();

        let mut x_flat = Vec::with_capacity(batch_size * self.n_vars * self.seq_len);
        let mut y_flat = Vec::with_capacity(batch_size);

        for item in items {
            let mut series = item.x;
            if let Some(tfm) = &self.batch_tfm {
                tfm.apply(&mut series, self.n_vars, self.seq_len);
            }
            x_flat.extend_from_slice(&series);
            y_flat.push(item.y);
        }

        let x = Tensor::<B, 3>::from_data(
            TensorData::new(x_flat, [batch_size, self.n_vars, self.seq_len]),
            &self.device,
        );
        let y = Tensor::<B, 2>::from_data(
            TensorData::new(y_flat, [batch_size, 1]),
            &self.device,
        );

        TsBatch { x, y }
    }
}
