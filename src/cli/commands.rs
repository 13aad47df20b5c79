// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Subcommands `run`, `train` and `predict` and their flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::data::loader::DEFAULT_DATA_DIR;
use crate::ml::scoring::Metric;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train, export, reload and predict the validation split (default)
    Run(TrainArgs),

    /// Train and export only
    Train(TrainArgs),

    /// Predict a dataset's validation split with an exported model
    Predict(PredictArgs),
}

/// Arguments shared by `run` and `train`.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Registered regression dataset name
    #[arg(long, default_value = "AppliancesEnergy")]
    pub dataset: String,

    /// Where downloaded datasets are cached
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Download the dataset again even if it is cached
    #[arg(long)]
    pub force_download: bool,

    /// Output directory for the exported model, history.csv and checkpoints
    #[arg(long, default_value = "models")]
    pub path: String,

    /// File name of the exported model inside --path
    #[arg(long, default_value = "reg.pkl")]
    pub fname: String,

    /// Model architecture
    #[arg(long, default_value = "TSTPlus")]
    pub arch: String,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Peak learning rate of the one-cycle schedule
    #[arg(long, default_value_t = 3e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// AdamW decoupled weight decay
    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Number of stacked encoder layers
    #[arg(long, default_value_t = 3)]
    pub n_layers: usize,

    /// Hidden dimension; must be divisible by --n-heads
    #[arg(long, default_value_t = 128)]
    pub d_model: usize,

    #[arg(long, default_value_t = 16)]
    pub n_heads: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 256)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Dropout before the regression head
    #[arg(long, default_value_t = 0.0)]
    pub fc_dropout: f64,

    /// Longer series are shortened by a strided convolution
    #[arg(long, default_value_t = 512)]
    pub max_seq_len: usize,

    /// Standardise inputs with dataset statistics instead of per sample
    #[arg(long)]
    pub by_dataset: bool,

    /// Separate standardisation statistics per channel
    #[arg(long)]
    pub by_var: bool,

    /// Feed raw inputs to the model
    #[arg(long)]
    pub no_standardize: bool,

    /// Standardise targets with training statistics
    #[arg(long)]
    pub scale_targets: bool,

    /// Replace missing input values with this constant
    #[arg(long)]
    pub nan_value: Option<f32>,

    /// Hold out a random fraction of all samples instead of the TEST file
    #[arg(long)]
    pub valid_size: Option<f64>,

    /// Validation metrics, comma separated (rmse, mae, mse, r2)
    #[arg(long, value_delimiter = ',', default_value = "rmse")]
    pub metrics: Vec<Metric>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Do not print the per-epoch table
    #[arg(long)]
    pub quiet: bool,

    /// Save model weights after every epoch
    #[arg(long)]
    pub save_checkpoints: bool,

    /// Number of predictions to print
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:          a.dataset,
            data_dir:         a.data_dir,
            force_download:   a.force_download,
            path:             a.path,
            fname:            a.fname,
            arch:             a.arch,
            epochs:           a.epochs,
            lr:               a.lr,
            batch_size:       a.batch_size,
            weight_decay:     a.weight_decay,
            n_layers:         a.n_layers,
            d_model:          a.d_model,
            n_heads:          a.n_heads,
            d_ff:             a.d_ff,
            dropout:          a.dropout,
            fc_dropout:       a.fc_dropout,
            max_seq_len:      a.max_seq_len,
            by_sample:        !a.by_dataset,
            by_var:           a.by_var,
            no_standardize:   a.no_standardize,
            scale_targets:    a.scale_targets,
            nan_value:        a.nan_value,
            valid_size:       a.valid_size,
            metrics:          a.metrics,
            seed:             a.seed,
            verbose:          !a.quiet,
            save_checkpoints: a.save_checkpoints,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PredictArgs {
    /// Exported model file
    #[arg(long, default_value = "models/reg.pkl")]
    pub model: String,

    #[arg(long, default_value = "AppliancesEnergy")]
    pub dataset: String,

    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    #[arg(long)]
    pub force_download: bool,

    /// Defaults to the value saved in train_config.json next to --model
    #[arg(long)]
    pub valid_size: Option<f64>,

    /// Defaults to the seed saved in train_config.json, else 42
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of predictions to print
    #[arg(long, default_value_t = 10)]
    pub show: usize,
}

impl PredictArgs {
    /// Data settings for prediction. Flags win; otherwise the split of the
    /// training run saved in `saved` is reproduced.
    pub fn data_config(&self, saved: Option<&TrainConfig>) -> TrainConfig {
        let defaults = TrainConfig::default();
        TrainConfig {
            dataset:        self.dataset.clone(),
            data_dir:       self.data_dir.clone(),
            force_download: self.force_download,
            valid_size:     self.valid_size.or(saved.and_then(|c| c.valid_size)),
            seed:           self.seed.or(saved.map(|c| c.seed)).unwrap_or(defaults.seed),
            ..defaults
        }
    }
}
