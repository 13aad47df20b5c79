// ============================================================
// Layer 5 - Regressor + Training Loop
// ============================================================
// TsRegressor bundles data, transforms, model and optimiser state.
//
//   new(x, y, splits, cfg)
//     - resolve the architecture
//     - fit the target transform and the batch transform on the
//       training split only
//     - init the model for [n_vars, seq_len] → 1 output
//
//   fit_one_cycle(epochs, lr_max)
//     for each epoch:
//       train:  shuffle → batch → forward → MSE → backward → AdamW
//               (lr from the one-cycle schedule, one step per batch)
//       valid:  model.valid() on the inner backend, no dropout
//       report: epoch row (stdout if verbose), tracing, history.csv
//
//   export(fname)
//     writes {path}/{fname}: header + weights, see infra::artifact
//
// Key Burn insight:
//   - Training runs on TrainBackend (Autodiff<..>) for gradients
//   - model.valid() returns the model on the inner backend, so the
//     validation batcher and prediction use that backend too
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{TsBatch, TsBatcher},
    dataset::TsDataset,
    transforms::{TfmSpec, TsStandardize},
};
use crate::domain::{
    predictions::Predictions, splits::Splits, traits::Predictor, ts_array::TsArray,
};
use crate::error::{Result, TsError};
use crate::infra::{
    artifact::{write_artifact, ArtifactHeader},
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
};
use crate::ml::{
    arch::{Architecture, ModelHyperParams},
    backend::tensor_to_vec,
    inferencer::{predict_batched, InputContract},
    model::{TstPlus, TstPlusConfig},
    schedule::OneCycleSchedule,
    scoring::Metric,
};

#[derive(Debug, Clone)]
pub struct RegressorConfig {
    /// Directory for exports, history.csv and checkpoints
    pub path:             PathBuf,
    /// Architecture identifier, e.g. "TSTPlus"
    pub arch:             String,
    pub model:            ModelHyperParams,
    pub tfms:             TfmSpec,
    pub batch_tfms:       Option<TsStandardize>,
    pub metrics:          Vec<Metric>,
    pub batch_size:       usize,
    pub weight_decay:     f64,
    pub seed:             u64,
    /// Print one row per epoch to stdout
    pub verbose:          bool,
    /// Snapshot weights to {path}/checkpoints after every epoch
    pub save_checkpoints: bool,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            path:             PathBuf::from("models"),
            arch:             Architecture::TstPlus.name().to_string(),
            model:            ModelHyperParams::default(),
            tfms:             TfmSpec::default(),
            batch_tfms:       Some(TsStandardize::new(true, false)),
            metrics:          vec![Metric::Rmse],
            batch_size:       64,
            weight_decay:     0.01,
            seed:             42,
            verbose:          false,
            save_checkpoints: false,
        }
    }
}

pub struct TsRegressor<B: AutodiffBackend> {
    x:            TsArray,
    y:            Vec<f32>,
    splits:       Splits,
    arch:         Architecture,
    model_config: TstPlusConfig,
    model:        TstPlus<B>,
    tfms:         TfmSpec,
    batch_tfms:   Option<TsStandardize>,
    cfg:          RegressorConfig,
    device:       B::Device,
    train_iter:   usize,
    epochs_done:  usize,
    history:      Vec<EpochMetrics>,
}

impl<B: AutodiffBackend> TsRegressor<B> {
    pub fn new(
        x:      TsArray,
        y:      Vec<f32>,
        splits: Splits,
        cfg:    RegressorConfig,
        device: B::Device,
    ) -> Result<Self> {
        let arch: Architecture = cfg.arch.parse()?;

        if x.len() != y.len() {
            return Err(TsError::ShapeMismatch(format!(
                "X has {} samples but y has {}", x.len(), y.len()
            )));
        }
        splits.validate(x.len())?;
        if cfg.batch_size == 0 {
            return Err(TsError::InvalidArgument("batch_size must be positive".into()));
        }

        let model_config = arch.config(x.n_vars(), 1, x.seq_len(), &cfg.model);
        model_config.validate()?;

        // Data-dependent statistics come from the training split only
        let y_train: Vec<f32> = splits.train.iter().map(|&i| y[i]).collect();
        let tfms = TfmSpec { input: cfg.tfms.input, target: cfg.tfms.target.fit(&y_train) };

        let batch_tfms = match &cfg.batch_tfms {
            Some(tfm) => {
                let mut tfm = tfm.clone();
                tfm.fit(&x.select(&splits.train)?);
                Some(tfm)
            }
            None => None,
        };

        B::seed(cfg.seed);
        let model: TstPlus<B> = model_config.init(&device);

        tracing::info!(
            "{} ready: c_in={} seq_len={} q_len={} | train={} valid={} | bs={}",
            arch, x.n_vars(), x.seq_len(), model_config.q_len(),
            splits.train.len(), splits.valid.len(), cfg.batch_size
        );

        Ok(Self {
            x, y, splits, arch, model_config, model, tfms, batch_tfms, cfg, device,
            train_iter:  0,
            epochs_done: 0,
            history:     Vec::new(),
        })
    }

    /// Train for `epochs` epochs with a one-cycle learning rate peaking at `lr_max`.
    ///
    /// Calling it again continues from the current weights with a fresh
    /// schedule and optimiser; the step counter keeps counting.
    pub fn fit_one_cycle(&mut self, epochs: usize, lr_max: f64) -> Result<()> {
        if !(lr_max.is_finite() && lr_max > 0.0) {
            return Err(TsError::InvalidArgument(format!(
                "lr_max must be a positive finite number, got {lr_max}"
            )));
        }
        if epochs == 0 {
            tracing::info!("fit_one_cycle with 0 epochs, nothing to do");
            return Ok(());
        }

        let n_vars  = self.x.n_vars();
        let seq_len = self.x.seq_len();
        let bs      = self.cfg.batch_size;

        // ── Data loaders ──────────────────────────────────────────────────────
        let train_ds = TsDataset::from_indices(&self.x, Some(self.y.as_slice()), &self.splits.train, &self.tfms)?;
        let valid_ds = TsDataset::from_indices(&self.x, Some(self.y.as_slice()), &self.splits.valid, &self.tfms)?;
        tracing::debug!("Datasets: {} train, {} valid samples", train_ds.sample_count(), valid_ds.sample_count());

        let train_batcher = TsBatcher::<B>::new(self.device.clone(), n_vars, seq_len, self.batch_tfms.clone());
        let train_loader  = DataLoaderBuilder::new(train_batcher)
            .batch_size(bs)
            .shuffle(self.cfg.seed.wrapping_add(self.epochs_done as u64))
            .build(train_ds);

        let valid_batcher = TsBatcher::<B::InnerBackend>::new(
            self.device.clone(), n_vars, seq_len, self.batch_tfms.clone(),
        );
        let valid_loader = DataLoaderBuilder::new(valid_batcher)
            .batch_size(bs * 2)
            .build(valid_ds);

        // ── Optimiser + schedule ──────────────────────────────────────────────
        let schedule  = OneCycleSchedule::new(lr_max, epochs * self.n_train_batches());
        let mut optim = AdamWConfig::new()
            .with_weight_decay(self.cfg.weight_decay as f32)
            .init::<B, TstPlus<B>>();
        let mse = MseLoss::new();

        let metric_names: Vec<&str> = self.cfg.metrics.iter().map(Metric::name).collect();
        // First fit of this regressor starts a new history.csv
        let logger = if self.epochs_done == 0 {
            MetricsLogger::create(&self.cfg.path, &metric_names)?
        } else {
            MetricsLogger::append(&self.cfg.path, &metric_names)?
        };
        let ckpt   = self.cfg.save_checkpoints
            .then(|| CheckpointManager::new(self.cfg.path.join("checkpoints")));

        tracing::info!(
            "fit_one_cycle: {} epochs x {} batches, lr_max={:e}",
            epochs, self.n_train_batches(), lr_max
        );
        if self.cfg.verbose {
            println!("{}", table_header(&metric_names));
        }

        let mut model = self.model.clone();
        let mut step  = 0usize;

        // ── Epoch loop ────────────────────────────────────────────────────────
        for _ in 0..epochs {
            let started = Instant::now();

            let mut loss_sum = 0.0f64;
            let mut n_seen   = 0usize;
            let mut lr       = schedule.lr_at(step);

            for batch in train_loader.iter() {
                let n    = batch.y.dims()[0];
                let pred = model.forward(batch.x);
                let loss = mse.forward(pred, batch.y, Reduction::Mean);

                let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
                loss_sum += loss_val * n as f64;
                n_seen   += n;

                let grads = GradientsParams::from_grads(loss.backward(), &model);
                lr    = schedule.lr_at(step);
                model = optim.step(lr, model, grads);

                step            += 1;
                self.train_iter += 1;
            }

            let train_loss = if n_seen > 0 { loss_sum / n_seen as f64 } else { f64::NAN };

            // model.valid() → TstPlus<InnerBackend>, dropout disabled
            let (valid_loss, metrics) = self.evaluate(&model.valid(), valid_loader.as_ref())?;

            self.epochs_done += 1;
            let row = EpochMetrics {
                epoch: self.epochs_done,
                train_loss,
                valid_loss,
                metrics,
                lr,
                seconds: started.elapsed().as_secs_f64(),
            };

            tracing::info!(
                "Epoch {} | train_loss={:.4} | valid_loss={:.4} | lr={:.2e}",
                row.epoch, row.train_loss, row.valid_loss, row.lr
            );
            if self.cfg.verbose {
                println!("{}", table_row(&row));
            }
            logger.log(&row)?;

            let best = self.history.iter().map(|m| m.valid_loss).fold(f64::INFINITY, f64::min);
            if row.is_improvement(best) {
                tracing::debug!("valid_loss improved to {:.6}", row.valid_loss);
            }

            if let Some(ckpt) = &ckpt {
                ckpt.save_model(&model, row.epoch)?;
            }

            self.history.push(row);
            self.model = model.clone();
        }

        tracing::info!("Training complete: {} steps so far", self.train_iter);
        Ok(())
    }

    /// Validation loss in the transformed target space, metrics on decoded values.
    fn evaluate(
        &self,
        model:  &TstPlus<B::InnerBackend>,
        loader: &dyn DataLoader<TsBatch<B::InnerBackend>>,
    ) -> Result<(f64, Vec<f64>)> {
        let mut raw     = Vec::with_capacity(self.splits.valid.len());
        let mut encoded = Vec::with_capacity(self.splits.valid.len());

        for batch in loader.iter() {
            raw.extend(tensor_to_vec(model.forward(batch.x))?);
            encoded.extend(tensor_to_vec(batch.y)?);
        }

        let valid_loss = Metric::Mse.compute(&raw, &encoded);

        let decode  = |v: &f32| self.tfms.target.decode(*v);
        let preds   = raw.iter().map(decode).collect::<Vec<_>>();
        let targets = encoded.iter().map(decode).collect::<Vec<_>>();
        let metrics = self.cfg.metrics.iter().map(|m| m.compute(&preds, &targets)).collect();

        Ok((valid_loss, metrics))
    }

    /// Write the exported artifact to {path}/{fname}. Returns the full path.
    pub fn export(&self, fname: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.cfg.path.join(fname);

        let record = NamedMpkBytesRecorder::<FullPrecisionSettings>::new()
            .record(self.model.valid().into_record(), ())
            .map_err(|e| TsError::Io(std::io::Error::other(format!("cannot encode weights: {e:?}"))))?;

        let header = ArtifactHeader {
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            arch:          self.arch.name().to_string(),
            model:         self.model_config.clone(),
            n_vars:        self.x.n_vars(),
            seq_len:       self.x.seq_len(),
            tfms:          self.tfms,
            batch_tfms:    self.batch_tfms.clone(),
            metrics:       self.cfg.metrics.clone(),
            batch_size:    self.cfg.batch_size,
            train_iter:    self.train_iter,
            epochs:        self.epochs_done,
        };

        write_artifact(&path, &header, &record)?;
        Ok(path)
    }

    /// Replace the weights with the newest checkpoint under {path}/checkpoints.
    pub fn restore_latest_checkpoint(&mut self) -> Result<usize> {
        let ckpt = CheckpointManager::new(self.cfg.path.join("checkpoints"));
        let (model, epoch) = ckpt.load_latest(self.model.clone(), &self.device)?;
        self.model = model;
        Ok(epoch)
    }

    /// Optimiser steps taken across all fit calls.
    pub fn train_iter(&self) -> usize { self.train_iter }

    pub fn epochs_done(&self) -> usize { self.epochs_done }

    /// Batches per training epoch, the last one may be partial.
    pub fn n_train_batches(&self) -> usize { self.splits.train.len().div_ceil(self.cfg.batch_size) }

    pub fn history(&self) -> &[EpochMetrics] { &self.history }

    pub fn model(&self) -> &TstPlus<B> { &self.model }

    pub fn arch(&self) -> Architecture { self.arch }

    pub fn tfms(&self) -> &TfmSpec { &self.tfms }

    pub fn splits(&self) -> &Splits { &self.splits }

    pub fn path(&self) -> &Path { &self.cfg.path }
}

impl<B: AutodiffBackend> Predictor for TsRegressor<B> {
    fn get_x_preds(&self, x: &TsArray, y: Option<&[f32]>) -> Result<Predictions> {
        let contract = InputContract {
            n_vars:     self.x.n_vars(),
            seq_len:    self.x.seq_len(),
            tfms:       &self.tfms,
            batch_tfms: self.batch_tfms.as_ref(),
            batch_size: self.cfg.batch_size * 2,
        };
        predict_batched(&self.model.valid(), &self.device, x, y, &contract)
    }
}

fn table_header(metric_names: &[&str]) -> String {
    let mut line = format!("{:<7}{:<12}{:<12}", "epoch", "train_loss", "valid_loss");
    for name in metric_names {
        line.push_str(&format!("{name:<12}"));
    }
    line.push_str("time");
    line
}

fn table_row(m: &EpochMetrics) -> String {
    let mut line = format!("{:<7}{:<12.6}{:<12.6}", m.epoch - 1, m.train_loss, m.valid_loss);
    for v in &m.metrics {
        line.push_str(&format!("{v:<12.6}"));
    }
    let secs = m.seconds.round() as u64;
    line.push_str(&format!("{:02}:{:02}", secs / 60, secs % 60));
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::backend::TrainBackend;

    fn tiny_cfg(dir: &Path) -> RegressorConfig {
        RegressorConfig {
            path:       dir.to_path_buf(),
            model:      ModelHyperParams {
                n_layers: 1, d_model: 8, n_heads: 2, d_ff: 16,
                dropout: 0.0, fc_dropout: 0.0, max_seq_len: 512,
            },
            batch_size: 4,
            ..Default::default()
        }
    }

    fn toy_data(n: usize) -> (TsArray, Vec<f32>) {
        let (n_vars, seq_len) = (2, 6);
        let mut data = Vec::with_capacity(n * n_vars * seq_len);
        let mut y    = Vec::with_capacity(n);
        for i in 0..n {
            for v in 0..n_vars {
                for t in 0..seq_len {
                    data.push((i as f32 * 0.3 + v as f32) * (t as f32 * 0.5).sin());
                }
            }
            y.push(10.0 + i as f32);
        }
        (TsArray::new(data, n, n_vars, seq_len).unwrap(), y)
    }

    fn regressor(dir: &Path, n_train: usize, n_valid: usize) -> TsRegressor<TrainBackend> {
        let (x, y) = toy_data(n_train + n_valid);
        TsRegressor::new(x, y, Splits::contiguous(n_train, n_valid), tiny_cfg(dir), Default::default())
            .unwrap()
    }

    #[test]
    fn test_step_counter_counts_batches() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = regressor(dir.path(), 10, 3);
        assert_eq!(reg.n_train_batches(), 3);

        reg.fit_one_cycle(2, 1e-3).unwrap();
        assert_eq!(reg.train_iter(), 6);
        assert_eq!(reg.history().len(), 2);

        reg.fit_one_cycle(1, 1e-3).unwrap();
        assert_eq!(reg.train_iter(), 9);
        assert_eq!(reg.history()[2].epoch, 3);
    }

    #[test]
    fn test_zero_epochs_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = regressor(dir.path(), 6, 2);
        let (x, _) = toy_data(8);

        let before = reg.get_x_preds(&x, None).unwrap();
        reg.fit_one_cycle(0, 1e-3).unwrap();
        let after = reg.get_x_preds(&x, None).unwrap();

        assert_eq!(reg.train_iter(), 0);
        assert_eq!(before.raw_preds, after.raw_preds);
        assert!(!dir.path().join("history.csv").exists());
    }

    #[test]
    fn test_rejects_bad_lr() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = regressor(dir.path(), 6, 2);
        assert!(matches!(reg.fit_one_cycle(1, 0.0), Err(TsError::InvalidArgument(_))));
        assert!(matches!(reg.fit_one_cycle(1, f64::NAN), Err(TsError::InvalidArgument(_))));
    }

    #[test]
    fn test_unknown_arch() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = toy_data(4);
        let cfg = RegressorConfig { arch: "NoSuchNet".into(), ..tiny_cfg(dir.path()) };
        let err = TsRegressor::<TrainBackend>::new(x, y, Splits::contiguous(3, 1), cfg, Default::default());
        assert!(matches!(err, Err(TsError::InvalidArchitecture(name)) if name == "NoSuchNet"));
    }

    #[test]
    fn test_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (x, mut y) = toy_data(4);
        y.pop();
        let err = TsRegressor::<TrainBackend>::new(
            x, y, Splits::contiguous(3, 1), tiny_cfg(dir.path()), Default::default(),
        );
        assert!(matches!(err, Err(TsError::ShapeMismatch(_))));
    }

    #[test]
    fn test_empty_valid_split_reports_nan() {
        let dir = tempfile::tempdir().unwrap();
        let mut reg = regressor(dir.path(), 5, 0);
        reg.fit_one_cycle(1, 1e-3).unwrap();
        assert!(reg.history()[0].valid_loss.is_nan());
        assert!(reg.history()[0].train_loss.is_finite());
    }

    #[test]
    fn test_history_csv_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let (x, y) = toy_data(8);
        let cfg = RegressorConfig { save_checkpoints: true, ..tiny_cfg(dir.path()) };
        let mut reg = TsRegressor::<TrainBackend>::new(
            x, y, Splits::contiguous(6, 2), cfg, Default::default(),
        ).unwrap();

        reg.fit_one_cycle(2, 1e-3).unwrap();

        let csv = std::fs::read_to_string(dir.path().join("history.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert_eq!(reg.restore_latest_checkpoint().unwrap(), 2);
    }

    #[test]
    fn test_new_regressor_restarts_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = regressor(dir.path(), 6, 2);
        first.fit_one_cycle(2, 1e-3).unwrap();

        let (x, y) = toy_data(8);
        let cfg = RegressorConfig { metrics: vec![Metric::Rmse, Metric::Mae], ..tiny_cfg(dir.path()) };
        let mut second = TsRegressor::<TrainBackend>::new(
            x, y, Splits::contiguous(6, 2), cfg, Default::default(),
        ).unwrap();
        second.fit_one_cycle(1, 1e-3).unwrap();
        second.fit_one_cycle(1, 1e-3).unwrap();

        let csv   = std::fs::read_to_string(dir.path().join("history.csv")).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,valid_loss,rmse,mae,lr,time");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,") && lines[2].starts_with("2,"));
        assert!(lines.iter().all(|l| l.split(',').count() == 7));
    }

    #[test]
    fn test_table_row_format() {
        let m = EpochMetrics {
            epoch: 1, train_loss: 2.0, valid_loss: 3.0, metrics: vec![1.5], lr: 1e-4, seconds: 65.0,
        };
        let row = table_row(&m);
        assert!(row.starts_with("0      2.000000"));
        assert!(row.ends_with("01:05"));
    }
}
