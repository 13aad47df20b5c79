// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Rebuilds a regressor from an exported artifact and predicts.
//
//   load_learner(path)
//     1. read + check the artifact framing and version
//     2. resolve the architecture id
//     3. init the model from the stored config
//     4. load the stored weights into it
//
//   get_x_preds(x, y)
//     input transform → batch transform → forward → decode
//
// Prediction always runs on the plain (non-autodiff) backend, so
// dropout is inactive and results are deterministic.

use std::path::Path;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
};

use crate::data::{
    batcher::TsBatcher,
    dataset::TsSample,
    transforms::{TfmSpec, TsStandardize},
};
use crate::domain::{predictions::Predictions, traits::Predictor, ts_array::TsArray};
use crate::error::{Result, TsError};
use crate::infra::artifact::{read_artifact, ArtifactHeader};
use crate::ml::{
    arch::Architecture,
    backend::{tensor_to_vec, InferBackend},
    model::TstPlus,
};

/// What a query must look like and how to preprocess it.
pub(crate) struct InputContract<'a> {
    pub n_vars:     usize,
    pub seq_len:    usize,
    pub tfms:       &'a TfmSpec,
    pub batch_tfms: Option<&'a TsStandardize>,
    pub batch_size: usize,
}

/// Batched forward pass shared by the trained regressor and the inferencer.
pub(crate) fn predict_batched<B: Backend>(
    model:    &TstPlus<B>,
    device:   &B::Device,
    x:        &TsArray,
    y:        Option<&[f32]>,
    contract: &InputContract<'_>,
) -> Result<Predictions> {
    if x.n_vars() != contract.n_vars || x.seq_len() != contract.seq_len {
        return Err(TsError::ShapeMismatch(format!(
            "model expects samples of [{} vars, {} steps], query has [{} vars, {} steps]",
            contract.n_vars, contract.seq_len, x.n_vars(), x.seq_len()
        )));
    }
    if let Some(y) = y {
        if y.len() != x.len() {
            return Err(TsError::ShapeMismatch(format!(
                "query has {} samples but {} targets", x.len(), y.len()
            )));
        }
    }

    let batcher = TsBatcher::<B>::new(
        device.clone(),
        contract.n_vars,
        contract.seq_len,
        contract.batch_tfms.cloned(),
    );

    let indices: Vec<usize> = (0..x.len()).collect();
    let mut raw_preds = Vec::with_capacity(x.len());

    for chunk in indices.chunks(contract.batch_size.max(1)) {
        let mut items = Vec::with_capacity(chunk.len());
        for &i in chunk {
            let mut series = x.sample(i).map(<[f32]>::to_vec).unwrap_or_default();
            contract.tfms.input.apply(&mut series);
            items.push(TsSample { x: series, y: 0.0 });
        }
        let batch = batcher.batch(items);
        raw_preds.extend(tensor_to_vec(model.forward(batch.x))?);
    }

    let preds = raw_preds.iter().map(|&v| contract.tfms.target.decode(v)).collect();
    Ok(Predictions { raw_preds, target: y.map(<[f32]>::to_vec), preds })
}

/// A regressor reloaded from disk, ready for inference.
pub struct TsInferencer<B: Backend> {
    model:  TstPlus<B>,
    header: ArtifactHeader,
    arch:   Architecture,
    device: B::Device,
}

impl<B: Backend> TsInferencer<B> {
    pub fn load(path: &Path, device: B::Device) -> Result<Self> {
        let (header, record_bytes) = read_artifact(path)?;
        let arch: Architecture = header.arch.parse()?;

        if header.model.c_in != header.n_vars || header.model.seq_len != header.seq_len {
            return Err(TsError::ArtifactCorrupt(format!(
                "header input shape [{}, {}] disagrees with model config [{}, {}]",
                header.n_vars, header.seq_len, header.model.c_in, header.model.seq_len
            )));
        }
        header.model.validate().map_err(|e| TsError::ArtifactCorrupt(e.to_string()))?;

        let model: TstPlus<B> = header.model.init(&device);
        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .load(record_bytes, &device)
            .map_err(|e| TsError::ArtifactCorrupt(format!("model weights: {e:?}")))?;
        let model = model.load_record(record);

        tracing::info!(
            "Loaded {} from '{}' (trained {} epochs, {} steps)",
            arch, path.display(), header.epochs, header.train_iter
        );
        Ok(Self { model, header, arch, device })
    }

    pub fn header(&self) -> &ArtifactHeader { &self.header }

    pub fn arch(&self) -> Architecture { self.arch }

    /// Optimiser steps the exported model had taken.
    pub fn train_iter(&self) -> usize { self.header.train_iter }
}

impl<B: Backend> Predictor for TsInferencer<B> {
    fn get_x_preds(&self, x: &TsArray, y: Option<&[f32]>) -> Result<Predictions> {
        let contract = InputContract {
            n_vars:     self.header.n_vars,
            seq_len:    self.header.seq_len,
            tfms:       &self.header.tfms,
            batch_tfms: self.header.batch_tfms.as_ref(),
            batch_size: self.header.batch_size * 2,
        };
        predict_batched(&self.model, &self.device, x, y, &contract)
    }
}

/// Load an exported artifact on the default inference backend.
pub fn load_learner(path: impl AsRef<Path>) -> Result<TsInferencer<InferBackend>> {
    TsInferencer::load(path.as_ref(), Default::default())
}
