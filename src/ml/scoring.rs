// ============================================================
// Layer 5 - Evaluation Metrics
// ============================================================
// Regression metrics reported on the validation split after
// every epoch. All of them are computed on decoded values, i.e.
// in the units of the original target.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Rmse,
    Mae,
    Mse,
    R2,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Rmse => "rmse",
            Metric::Mae  => "mae",
            Metric::Mse  => "mse",
            Metric::R2   => "r2",
        }
    }

    /// NaN when there is nothing to score.
    pub fn compute(&self, preds: &[f32], targets: &[f32]) -> f64 {
        let n = preds.len().min(targets.len());
        if n == 0 {
            return f64::NAN;
        }
        let pairs = preds.iter().zip(targets).map(|(&p, &t)| (p as f64, t as f64));

        match self {
            Metric::Mse  => pairs.map(|(p, t)| (p - t).powi(2)).sum::<f64>() / n as f64,
            Metric::Rmse => Metric::Mse.compute(preds, targets).sqrt(),
            Metric::Mae  => pairs.map(|(p, t)| (p - t).abs()).sum::<f64>() / n as f64,
            Metric::R2 => {
                let mean   = targets[..n].iter().map(|&t| t as f64).sum::<f64>() / n as f64;
                let ss_tot = targets[..n].iter().map(|&t| (t as f64 - mean).powi(2)).sum::<f64>();
                let ss_res = pairs.map(|(p, t)| (t - p).powi(2)).sum::<f64>();
                if ss_tot == 0.0 { f64::NAN } else { 1.0 - ss_res / ss_tot }
            }
        }
    }
}

impl FromStr for Metric {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rmse" => Ok(Metric::Rmse),
            "mae"  => Ok(Metric::Mae),
            "mse"  => Ok(Metric::Mse),
            "r2"   => Ok(Metric::R2),
            other  => Err(TsError::InvalidArgument(format!("unknown metric '{other}'"))),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
