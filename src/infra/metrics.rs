// ============================================================
// Layer 6 - Training History Logger
// ============================================================
// Records one CSV row per epoch to {path}/history.csv.
//
// Columns:
//   epoch, train_loss, valid_loss, <one column per metric>, lr, time
//
// Example:
//   epoch,train_loss,valid_loss,rmse,lr,time
//   1,412.337219,398.120117,19.952947,0.000012,3.21
//   2,301.004211,287.651520,16.960291,0.000040,3.18
//
// A new regressor starts the file afresh; later fit_one_cycle calls
// on the same regressor append to it, so one run keeps one
// continuous history with one header.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One epoch's results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1 and keeps counting across fit calls
    pub epoch:      usize,
    /// Mean MSE over training batches (transformed target space)
    pub train_loss: f64,
    /// MSE over the validation split, NaN if it is empty
    pub valid_loss: f64,
    /// Metric values in the order the regressor was configured with
    pub metrics:    Vec<f64>,
    /// Learning rate of the last step of the epoch
    pub lr:         f64,
    /// Wall-clock seconds
    pub seconds:    f64,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best valid_loss
    pub fn is_improvement(&self, best_valid_loss: f64) -> bool {
        self.valid_loss < best_valid_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Start a new history, replacing any file left by an earlier run.
    pub fn create(dir: &Path, metric_names: &[&str]) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let csv_path = dir.join("history.csv");

        let mut f = fs::File::create(&csv_path)?;
        writeln!(f, "{}", header_row(metric_names))?;
        tracing::debug!("Created history CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Continue an existing history. Falls back to `create` when the file
    /// is missing or its columns differ from `metric_names`.
    pub fn append(dir: &Path, metric_names: &[&str]) -> Result<Self> {
        let csv_path = dir.join("history.csv");
        let existing = match fs::read_to_string(&csv_path) {
            Ok(text) => text.lines().next().map(str::to_string),
            Err(_)   => None,
        };

        match existing {
            Some(header) if header == header_row(metric_names) => Ok(Self { csv_path }),
            Some(_) => {
                tracing::warn!(
                    "'{}' has different columns, starting a new history", csv_path.display()
                );
                Self::create(dir, metric_names)
            }
            None => Self::create(dir, metric_names),
        }
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        let mut row = format!("{},{:.6},{:.6}", m.epoch, m.train_loss, m.valid_loss);
        for v in &m.metrics {
            row.push_str(&format!(",{v:.6}"));
        }
        row.push_str(&format!(",{:.8},{:.2}", m.lr, m.seconds));
        writeln!(f, "{row}")?;

        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn header_row(metric_names: &[&str]) -> String {
    let mut cols = vec!["epoch", "train_loss", "valid_loss"];
    cols.extend_from_slice(metric_names);
    cols.extend_from_slice(&["lr", "time"]);
    cols.join(",")
}
