// ============================================================
// Layer 5 - Architecture Registry
// ============================================================
// Maps an architecture identifier to a model configuration.
// Only "TSTPlus" is registered; any other identifier fails fast
// with InvalidArchitecture instead of silently picking a default.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::TsError;
use crate::ml::model::TstPlusConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    TstPlus,
}

impl Architecture {
    pub fn name(&self) -> &'static str {
        match self {
            Architecture::TstPlus => "TSTPlus",
        }
    }

    /// Build the model configuration for inputs of shape [c_in, seq_len].
    pub fn config(
        &self,
        c_in:    usize,
        c_out:   usize,
        seq_len: usize,
        hp:      &ModelHyperParams,
    ) -> TstPlusConfig {
        match self {
            Architecture::TstPlus => TstPlusConfig::new(c_in, c_out, seq_len)
                .with_n_layers(hp.n_layers)
                .with_d_model(hp.d_model)
                .with_n_heads(hp.n_heads)
                .with_d_ff(hp.d_ff)
                .with_dropout(hp.dropout)
                .with_fc_dropout(hp.fc_dropout)
                .with_max_seq_len(hp.max_seq_len),
        }
    }
}

impl FromStr for Architecture {
    type Err = TsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TSTPlus" => Ok(Architecture::TstPlus),
            other => Err(TsError::InvalidArchitecture(other.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size and regularisation knobs shared by the registered architectures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHyperParams {
    pub n_layers:    usize,
    pub d_model:     usize,
    pub n_heads:     usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    pub fc_dropout:  f64,
    pub max_seq_len: usize,
}

impl Default for ModelHyperParams {
    fn default() -> Self {
        Self {
            n_layers:    3,
            d_model:     128,
            n_heads:     16,
            d_ff:        256,
            dropout:     0.1,
            fc_dropout:  0.0,
            max_seq_len: 512,
        }
    }
}
