// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and delegates to Layer 2.
//
//   tsreg [run]   train → export → load_learner → predict valid split
//   tsreg train   train → export
//   tsreg predict load_learner → predict valid split
//
// Without a subcommand the full `run` pipeline executes with its
// defaults: AppliancesEnergy, TSTPlus, 100 epochs at lr 3e-4,
// exported to models/reg.pkl.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::{
    predict_use_case::{PredictReport, PredictUseCase},
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::domain::traits::Predictor;

#[derive(Parser, Debug)]
#[command(
    name = "tsreg",
    version,
    about = "Train a TSTPlus regressor on a time-series regression dataset, export it, reload it and predict."
)]
pub struct Cli {
    /// The subcommand to run (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Match on the subcommand and dispatch to the use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            None => run_pipeline(TrainConfig::default(), 10),
            Some(Commands::Run(args)) => {
                let show = args.show;
                run_pipeline(args.into(), show)
            }
            Some(Commands::Train(args))   => run_train(args),
            Some(Commands::Predict(args)) => run_predict(args),
        }
    }
}

fn run_pipeline(cfg: TrainConfig, show: usize) -> Result<()> {
    tracing::info!("Running the full pipeline on '{}'", cfg.dataset);

    let (report, reg) = TrainUseCase::new(cfg.clone()).execute()?;
    println!("Model exported to '{}' after {} steps.", report.artifact.display(), report.train_iter);

    let predictor = PredictUseCase::new(&report.artifact)?;
    let data      = cfg.load_data()?;
    let reloaded  = predictor.predict_valid(&data)?;

    // The reloaded model must reproduce the in-memory one
    let (x_valid, y_valid) = data.valid_set()?;
    let in_memory = reg.get_x_preds(&x_valid, Some(y_valid.as_slice()))?;
    let max_diff  = in_memory
        .preds
        .iter()
        .zip(&reloaded.predictions.preds)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0f32, f32::max);
    tracing::info!("Max |in-memory - reloaded| prediction difference: {:e}", max_diff);

    print_report(&reloaded, show);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let (report, _) = TrainUseCase::new(args.into()).execute()?;
    println!("Training complete. Model exported to '{}'.", report.artifact.display());
    if let Some(last) = report.last_epoch {
        println!("Final epoch: train_loss={:.4} valid_loss={:.4}", last.train_loss, last.valid_loss);
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let predictor = PredictUseCase::new(&args.model)?;
    let saved     = TrainConfig::saved_with(predictor.artifact());
    let data      = args.data_config(saved.as_ref()).load_data()?;
    let report    = predictor.predict_valid(&data)?;
    print_report(&report, args.show);
    Ok(())
}

fn print_report(report: &PredictReport, show: usize) {
    let p = &report.predictions;
    println!("\n{} predictions", p.len());
    println!("{:>6}  {:>12}  {:>12}  {:>12}", "#", "raw_pred", "target", "pred");
    for i in 0..p.len().min(show) {
        let target = p.target.as_ref().and_then(|t| t.get(i)).copied().unwrap_or(f32::NAN);
        println!("{:>6}  {:>12.4}  {:>12.4}  {:>12.4}", i, p.raw_preds[i], target, p.preds[i]);
    }
    for (metric, score) in &report.scores {
        println!("{metric}: {score:.4}");
    }
}
