// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// Everything that touches Burn's module, optimiser and record
// APIs lives here. The data layer only sees Burn through the
// Dataset and Batcher traits.
//
//   backend.rs    - NdArray (default) or Wgpu, Autodiff for training
//   arch.rs       - architecture identifiers → model configs
//   model.rs      - TSTPlus transformer encoder for regression
//   schedule.rs   - one-cycle learning rate policy
//   scoring.rs    - rmse / mae / mse / r2
//   trainer.rs    - TsRegressor: fit_one_cycle, export
//   inferencer.rs - load_learner, get_x_preds on a reloaded model
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

pub mod backend;

pub mod arch;

/// TSTPlus transformer encoder
pub mod model;

pub mod schedule;

pub mod scoring;

/// Regressor with the one-cycle training loop and export
pub mod trainer;

/// Reloads exported artifacts for prediction
pub mod inferencer;
