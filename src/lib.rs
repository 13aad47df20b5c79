// ============================================================
// tsreg - time-series regression with a TSTPlus transformer
// ============================================================
// Layers, outermost first:
//
//   cli          (1) argument parsing, printing
//   application  (2) train / predict workflows
//   domain       (3) TsArray, Splits, Predictions, core traits
//   data         (4) dataset registry + fetch + .ts parsing,
//                    transforms, Dataset / Batcher
//   ml           (5) backend, TSTPlus, schedule, trainer, inferencer
//   infra        (6) artifact file, checkpoints, history CSV
//
// Typical use:
//
//   let data = get_regression_data("AppliancesEnergy", false)?
//   let mut reg = TsRegressor::<TrainBackend>::new(x, y, splits, cfg, device)?
//   reg.fit_one_cycle(100, 3e-4)?
//   reg.export("reg.pkl")?
//   let learner = load_learner("models/reg.pkl")?
//   let (raw_preds, target, preds) = learner.get_x_preds(&x_valid, Some(&y_valid))?.into_parts()

#![recursion_limit = "256"]

pub mod error;

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;

pub use error::{Result, TsError};
