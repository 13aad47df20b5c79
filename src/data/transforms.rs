// ============================================================
// Layer 4 - Transforms
// ============================================================
// Declarative preprocessing for inputs and targets.
//
//   TfmSpec.input   - per-sample input transform (None = identity)
//   TfmSpec.target  - target transform, encoded before training
//                     and decoded after inference
//   TsStandardize   - batch transform applied to every mini-batch
//                     at train and inference time
//
// Constructing any of these has no side effects. Statistics that
// depend on data (target mean/std, dataset-wide input mean/std)
// are filled in by `fit` on the training split only, and travel
// with the exported artifact so inference applies exactly the
// same mapping.

use serde::{Deserialize, Serialize};

use crate::domain::ts_array::TsArray;

pub const DEFAULT_EPS: f32 = 1e-8;

// ─── Input transform ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum InputTransform {
    #[default]
    None,
    /// Replace missing values (NaN) with a constant.
    Nan2Value(f32),
}

impl InputTransform {
    pub fn apply(&self, sample: &mut [f32]) {
        match *self {
            InputTransform::None => {}
            InputTransform::Nan2Value(fill) => {
                for v in sample.iter_mut().filter(|v| v.is_nan()) {
                    *v = fill;
                }
            }
        }
    }
}

// ─── Target transform ─────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum TargetTransform {
    /// Targets are used as floats as-is; decoding is the identity.
    #[default]
    Regression,
    /// z-score targets with training-split statistics.
    Standardize { mean: f32, std: f32 },
}

impl TargetTransform {
    /// An unfitted standardizer; `fit` replaces the statistics.
    pub fn standardize() -> Self {
        TargetTransform::Standardize { mean: 0.0, std: 1.0 }
    }

    pub fn fit(self, y_train: &[f32]) -> Self {
        match self {
            TargetTransform::Regression => self,
            TargetTransform::Standardize { .. } => {
                let (mean, std) = nan_mean_std(y_train.iter().copied());
                TargetTransform::Standardize { mean, std: std.max(DEFAULT_EPS) }
            }
        }
    }

    pub fn encode(&self, y: f32) -> f32 {
        match *self {
            TargetTransform::Regression => y,
            TargetTransform::Standardize { mean, std } => (y - mean) / std,
        }
    }

    pub fn decode(&self, y: f32) -> f32 {
        match *self {
            TargetTransform::Regression => y,
            TargetTransform::Standardize { mean, std } => y * std + mean,
        }
    }
}

/// The (input, target) transform pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TfmSpec {
    pub input:  InputTransform,
    pub target: TargetTransform,
}

// ─── Batch transform: TsStandardize ───────────────────────────────────────────
/// Dataset-wide statistics, one entry per channel (by_var) or a single one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizeStats {
    pub mean: Vec<f32>,
    pub std:  Vec<f32>,
}

/// Standardise inputs to zero mean and unit variance.
///
/// by_sample = true  → statistics of each sample itself
/// by_sample = false → statistics of the training split (fitted)
/// by_var    = true  → separate statistics per channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsStandardize {
    pub by_sample: bool,
    pub by_var:    bool,
    pub eps:       f32,
    pub stats:     Option<StandardizeStats>,
}

impl TsStandardize {
    pub fn new(by_sample: bool, by_var: bool) -> Self {
        Self { by_sample, by_var, eps: DEFAULT_EPS, stats: None }
    }

    /// Compute dataset-wide statistics. No-op when standardising by sample.
    pub fn fit(&mut self, x_train: &TsArray) {
        if self.by_sample {
            return;
        }
        let n_vars  = x_train.n_vars();
        let seq_len = x_train.seq_len();
        let values  = x_train.as_slice();

        let stats = if self.by_var {
            let mut mean = Vec::with_capacity(n_vars);
            let mut std  = Vec::with_capacity(n_vars);
            for v in 0..n_vars {
                let channel = values
                    .chunks(seq_len)
                    .enumerate()
                    .filter(|(row, _)| row % n_vars == v)
                    .flat_map(|(_, c)| c.iter().copied());
                let (m, s) = nan_mean_std(channel);
                mean.push(m);
                std.push(s.max(self.eps));
            }
            StandardizeStats { mean, std }
        } else {
            let (m, s) = nan_mean_std(values.iter().copied());
            StandardizeStats { mean: vec![m], std: vec![s.max(self.eps)] }
        };

        tracing::debug!("TsStandardize fitted: mean={:?} std={:?}", stats.mean, stats.std);
        self.stats = Some(stats);
    }

    /// Standardise one sample laid out as [n_vars, seq_len] in place.
    pub fn apply(&self, sample: &mut [f32], n_vars: usize, seq_len: usize) {
        if self.by_sample {
            if self.by_var {
                for channel in sample.chunks_mut(seq_len) {
                    let (m, s) = nan_mean_std(channel.iter().copied());
                    scale(channel, m, s.max(self.eps));
                }
            } else {
                let (m, s) = nan_mean_std(sample.iter().copied());
                scale(sample, m, s.max(self.eps));
            }
            return;
        }

        let Some(stats) = &self.stats else {
            tracing::warn!("TsStandardize applied before fit; leaving inputs unchanged");
            return;
        };
        if stats.mean.len() == 1 {
            scale(sample, stats.mean[0], stats.std[0]);
        } else {
            for (v, channel) in sample.chunks_mut(seq_len).take(n_vars).enumerate() {
                scale(channel, stats.mean[v], stats.std[v]);
            }
        }
    }
}

impl Default for TsStandardize {
    fn default() -> Self {
        Self::new(false, false)
    }
}

fn scale(values: &mut [f32], mean: f32, std: f32) {
    for v in values {
        *v = (*v - mean) / std;
    }
}

/// Mean and unbiased standard deviation, skipping NaN.
/// A single finite value has std 0; no finite values give (0, 0).
fn nan_mean_std(values: impl Iterator<Item = f32> + Clone) -> (f32, f32) {
    let (mut n, mut sum) = (0usize, 0f64);
    for v in values.clone().filter(|v| !v.is_nan()) {
        n += 1;
        sum += v as f64;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    if n == 1 {
        return (mean as f32, 0.0);
    }
    let ss: f64 = values
        .filter(|v| !v.is_nan())
        .map(|v| (v as f64 - mean).powi(2))
        .sum();
    (mean as f32, (ss / (n - 1) as f64).sqrt() as f32)
}
