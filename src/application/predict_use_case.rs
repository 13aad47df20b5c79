// ============================================================
// Layer 2 - Predict Use Case
// ============================================================
// Reload an exported regressor and predict a validation split:
//
//   1. load_learner(artifact)         (Layer 5 - ml)
//   2. X[valid], y[valid]             (Layer 4 - data)
//   3. get_x_preds(X[valid], y[valid]) → (raw_preds, target, preds)
//   4. score preds against target     (Layer 5 - ml)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::{
    predictions::Predictions, regression_data::RegressionData, traits::Predictor,
};
use crate::ml::{
    backend::InferBackend,
    inferencer::{load_learner, TsInferencer},
    scoring::Metric,
};

/// Predictions plus one score per metric stored in the artifact.
#[derive(Debug, Clone)]
pub struct PredictReport {
    pub predictions: Predictions,
    pub scores:      Vec<(Metric, f64)>,
}

pub struct PredictUseCase {
    artifact: PathBuf,
    learner:  TsInferencer<InferBackend>,
}

impl PredictUseCase {
    pub fn new(artifact: impl AsRef<Path>) -> Result<Self> {
        let artifact = artifact.as_ref().to_path_buf();
        let learner  = load_learner(&artifact)
            .with_context(|| format!("loading model from '{}'", artifact.display()))?;
        Ok(Self { artifact, learner })
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn learner(&self) -> &TsInferencer<InferBackend> {
        &self.learner
    }

    /// Predict the validation split of `data`.
    pub fn predict_valid(&self, data: &RegressionData) -> Result<PredictReport> {
        let (x_valid, y_valid) = data.valid_set()?;
        tracing::info!("Predicting {} validation samples of '{}'", x_valid.len(), data.name);

        let predictions = self
            .learner
            .get_x_preds(&x_valid, Some(y_valid.as_slice()))
            .context("running inference")?;

        let scores = self
            .learner
            .header()
            .metrics
            .iter()
            .map(|m| (*m, m.compute(&predictions.preds, &y_valid)))
            .collect();

        Ok(PredictReport { predictions, scores })
    }
}
