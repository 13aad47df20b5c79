// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the training pipeline in order:
//
//   Step 1: Load the dataset           (Layer 4 - data)
//   Step 2: Pick the train/valid split (Layer 4 - data)
//   Step 3: Declare transforms         (Layer 4 - data)
//   Step 4: Build the regressor        (Layer 5 - ml)
//   Step 5: fit_one_cycle              (Layer 5 - ml)
//   Step 6: Export the artifact        (Layer 6 - infra)
//   Step 7: Save config                (Layer 6 - infra)
//
// Reference: Burn Book §5 (Training)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    loader::{MonashArchive, DEFAULT_DATA_DIR},
    splitter::random_splits,
    transforms::{InputTransform, TargetTransform, TfmSpec, TsStandardize},
};
use crate::domain::{regression_data::RegressionData, traits::DatasetSource};
use crate::infra::metrics::EpochMetrics;
use crate::ml::{
    arch::ModelHyperParams,
    backend::TrainBackend,
    scoring::Metric,
    trainer::{RegressorConfig, TsRegressor},
};

/// Saved next to the exported model.
pub const CONFIG_FILE: &str = "train_config.json";

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a run. Saved as train_config.json next to the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:          String,
    pub data_dir:         String,
    pub force_download:   bool,
    /// Output directory for the artifact, history and checkpoints
    pub path:             String,
    /// Artifact file name inside `path`
    pub fname:            String,
    pub arch:             String,
    pub epochs:           usize,
    pub lr:               f64,
    pub batch_size:       usize,
    pub weight_decay:     f64,
    pub n_layers:         usize,
    pub d_model:          usize,
    pub n_heads:          usize,
    pub d_ff:             usize,
    pub dropout:          f64,
    pub fc_dropout:       f64,
    pub max_seq_len:      usize,
    /// TsStandardize by_sample / by_var; no batch transform when `no_standardize`
    pub by_sample:        bool,
    pub by_var:           bool,
    pub no_standardize:   bool,
    /// Standardise targets with training statistics
    pub scale_targets:    bool,
    /// Replace missing input values with this constant
    pub nan_value:        Option<f32>,
    /// Hold out a random fraction instead of the shipped TEST split
    pub valid_size:       Option<f64>,
    pub metrics:          Vec<Metric>,
    pub seed:             u64,
    pub verbose:          bool,
    pub save_checkpoints: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let hp = ModelHyperParams::default();
        Self {
            dataset:          "AppliancesEnergy".to_string(),
            data_dir:         DEFAULT_DATA_DIR.to_string(),
            force_download:   false,
            path:             "models".to_string(),
            fname:            "reg.pkl".to_string(),
            arch:             "TSTPlus".to_string(),
            epochs:           100,
            lr:               3e-4,
            batch_size:       64,
            weight_decay:     0.01,
            n_layers:         hp.n_layers,
            d_model:          hp.d_model,
            n_heads:          hp.n_heads,
            d_ff:             hp.d_ff,
            dropout:          hp.dropout,
            fc_dropout:       hp.fc_dropout,
            max_seq_len:      hp.max_seq_len,
            by_sample:        true,
            by_var:           false,
            no_standardize:   false,
            scale_targets:    false,
            nan_value:        None,
            valid_size:       None,
            metrics:          vec![Metric::Rmse],
            seed:             42,
            verbose:          true,
            save_checkpoints: false,
        }
    }
}

impl TrainConfig {
    /// Read a config saved by an earlier training run.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading '{}'", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing '{}'", path.display()))
    }

    /// The config saved next to `artifact`, if there is a readable one.
    pub fn saved_with(artifact: &Path) -> Option<Self> {
        let path = artifact.parent()?.join(CONFIG_FILE);
        match Self::load(&path) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::debug!("No saved training config: {e:#}");
                None
            }
        }
    }

    pub fn tfms(&self) -> TfmSpec {
        TfmSpec {
            input:  self.nan_value.map_or(InputTransform::None, InputTransform::Nan2Value),
            target: if self.scale_targets { TargetTransform::standardize() } else { TargetTransform::Regression },
        }
    }

    pub fn batch_tfms(&self) -> Option<TsStandardize> {
        (!self.no_standardize).then(|| TsStandardize::new(self.by_sample, self.by_var))
    }

    pub fn regressor_config(&self) -> RegressorConfig {
        RegressorConfig {
            path:             PathBuf::from(&self.path),
            arch:             self.arch.clone(),
            model:            ModelHyperParams {
                n_layers:    self.n_layers,
                d_model:     self.d_model,
                n_heads:     self.n_heads,
                d_ff:        self.d_ff,
                dropout:     self.dropout,
                fc_dropout:  self.fc_dropout,
                max_seq_len: self.max_seq_len,
            },
            tfms:             self.tfms(),
            batch_tfms:       self.batch_tfms(),
            metrics:          self.metrics.clone(),
            batch_size:       self.batch_size,
            weight_decay:     self.weight_decay,
            seed:             self.seed,
            verbose:          self.verbose,
            save_checkpoints: self.save_checkpoints,
        }
    }

    /// The dataset with the split this run trains and validates on.
    pub fn load_data(&self) -> Result<RegressionData> {
        let archive = MonashArchive::new(&self.data_dir).with_force_download(self.force_download);
        let mut data = archive
            .load(&self.dataset)
            .with_context(|| format!("loading dataset '{}'", self.dataset))?;

        if let Some(valid_size) = self.valid_size {
            data.splits = random_splits(data.len(), valid_size, self.seed);
            data.splits.validate(data.len())?;
        }
        Ok(data)
    }
}

/// What a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub artifact:   PathBuf,
    pub train_iter: usize,
    pub last_epoch: Option<EpochMetrics>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train and export; hands the trained regressor back for in-memory checks.
    pub fn execute(&self) -> Result<(TrainReport, TsRegressor<TrainBackend>)> {
        let cfg = &self.config;

        // ── Steps 1-2: data + split ───────────────────────────────────────────
        let data = cfg.load_data()?;
        tracing::info!(
            "Split: {} train, {} validation",
            data.splits.train.len(), data.splits.valid.len()
        );

        // ── Steps 3-4: transforms + regressor ─────────────────────────────────
        let mut reg = TsRegressor::<TrainBackend>::new(
            data.x, data.y, data.splits, cfg.regressor_config(), Default::default(),
        )
        .context("building the regressor")?;

        // ── Step 5: train ─────────────────────────────────────────────────────
        reg.fit_one_cycle(cfg.epochs, cfg.lr).context("training")?;

        // ── Step 6: export ────────────────────────────────────────────────────
        let artifact = reg.export(&cfg.fname).context("exporting the model")?;

        // ── Step 7: save config ───────────────────────────────────────────────
        let config_path = PathBuf::from(&cfg.path).join(CONFIG_FILE);
        fs::write(&config_path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("writing '{}'", config_path.display()))?;
        tracing::info!("Config saved to '{}'", config_path.display());

        let report = TrainReport {
            artifact,
            train_iter: reg.train_iter(),
            last_epoch: reg.history().last().cloned(),
        };
        Ok((report, reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_the_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.dataset, "AppliancesEnergy");
        assert_eq!(cfg.arch, "TSTPlus");
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.lr, 3e-4);
        assert_eq!(cfg.batch_tfms(), Some(TsStandardize::new(true, false)));
        assert_eq!(cfg.tfms(), TfmSpec::default());
    }

    #[test]
    fn test_optional_transforms() {
        let cfg = TrainConfig {
            nan_value:      Some(0.0),
            scale_targets:  true,
            no_standardize: true,
            ..Default::default()
        };
        assert_eq!(cfg.tfms().input, InputTransform::Nan2Value(0.0));
        assert!(matches!(cfg.tfms().target, TargetTransform::Standardize { .. }));
        assert!(cfg.batch_tfms().is_none());
    }

    #[test]
    fn test_saved_with_reads_the_sibling_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { valid_size: Some(0.3), seed: 7, ..Default::default() };
        fs::write(dir.path().join(CONFIG_FILE), serde_json::to_string(&cfg).unwrap()).unwrap();

        let saved = TrainConfig::saved_with(&dir.path().join("reg.pkl")).unwrap();
        assert_eq!(saved.valid_size, Some(0.3));
        assert_eq!(saved.seed, 7);

        let empty = tempfile::tempdir().unwrap();
        assert!(TrainConfig::saved_with(&empty.path().join("reg.pkl")).is_none());
    }

    #[test]
    fn test_config_json_round_trip() {
        let cfg  = TrainConfig { valid_size: Some(0.2), ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.valid_size, Some(0.2));
        assert_eq!(back.metrics, vec![Metric::Rmse]);
    }
}
