// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Per-epoch snapshots of the model weights, written with Burn's
// CompactRecorder (MessagePack + gzip, half precision).
//
// File naming convention:
//   {path}/checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json      ← number of the newest snapshot
//
// Checkpoints are for resuming or inspecting a run. The artifact
// written by `export` is what inference loads.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::error::{Result, TsError};
use crate::ml::model::TstPlus;

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save model weights for `epoch` and point latest_epoch.json at them.
    pub fn save_model<B: Backend>(&self, model: &TstPlus<B>, epoch: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Without extension; the recorder adds .mpk.gz
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .map_err(|e| {
                TsError::Io(std::io::Error::other(format!(
                    "cannot save checkpoint '{}': {e:?}", path.display()
                )))
            })?;

        let latest = serde_json::to_string(&epoch)
            .map_err(|e| TsError::Io(std::io::Error::other(e)))?;
        fs::write(self.dir.join("latest_epoch.json"), latest)?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the newest snapshot into `model`. Returns the epoch it came from.
    ///
    /// `model` must have the architecture the snapshot was taken from.
    pub fn load_latest<B: Backend>(
        &self,
        model:  TstPlus<B>,
        device: &B::Device,
    ) -> Result<(TstPlus<B>, usize)> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .map_err(|e| {
                TsError::ArtifactCorrupt(format!("checkpoint '{}': {e:?}", path.display()))
            })?;

        Ok((model.load_record(record), epoch))
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join("latest_epoch.json");
        let s = fs::read_to_string(&path)?;
        serde_json::from_str::<usize>(s.trim())
            .map_err(|e| TsError::ArtifactCorrupt(format!("'{}': {e}", path.display())))
    }
}
