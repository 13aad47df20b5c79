// ============================================================
// Layer 6 - Model Artifact
// ============================================================
// A single self-describing file holding everything inference
// needs to rebuild the regressor:
//
//   offset  size  content
//   0       4     magic "TSRA"
//   4       4     format version (u32, little endian)
//   8       8     header length N (u64, little endian)
//   16      N     JSON header: architecture, model config, input
//                 shape, fitted transforms, training counters
//   16 + N  ...   model weights (Burn NamedMpk record, full precision)
//
// Loading checks the framing before touching the weights, so a
// file from another tool or a newer format fails with a clear
// error instead of a panic deep inside the model.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::data::transforms::{TfmSpec, TsStandardize};
use crate::error::{Result, TsError};
use crate::ml::{model::TstPlusConfig, scoring::Metric};

pub const MAGIC: &[u8; 4] = b"TSRA";
pub const FORMAT_VERSION: u32 = 1;

const PREAMBLE_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Version of the crate that wrote the file
    pub crate_version: String,
    /// Architecture identifier, e.g. "TSTPlus"
    pub arch:          String,
    pub model:         TstPlusConfig,
    /// Input shape the model was trained on
    pub n_vars:        usize,
    pub seq_len:       usize,
    pub tfms:          TfmSpec,
    pub batch_tfms:    Option<TsStandardize>,
    pub metrics:       Vec<Metric>,
    pub batch_size:    usize,
    /// Optimiser steps taken before export
    pub train_iter:    usize,
    pub epochs:        usize,
}

pub fn write_artifact(path: &Path, header: &ArtifactHeader, record: &[u8]) -> Result<()> {
    let json = serde_json::to_vec(header)
        .map_err(|e| TsError::Io(std::io::Error::other(e)))?;

    let mut bytes = Vec::with_capacity(PREAMBLE_LEN + json.len() + record.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(json.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&json);
    bytes.extend_from_slice(record);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &bytes)?;

    tracing::info!("Exported model to '{}' ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read and check an artifact. Returns the header and the raw weight record.
pub fn read_artifact(path: &Path) -> Result<(ArtifactHeader, Vec<u8>)> {
    let bytes = fs::read(path)?;
    parse_artifact(bytes)
}

fn parse_artifact(mut bytes: Vec<u8>) -> Result<(ArtifactHeader, Vec<u8>)> {
    if bytes.len() < PREAMBLE_LEN {
        return Err(TsError::ArtifactCorrupt(format!(
            "file is {} bytes, shorter than the {PREAMBLE_LEN}-byte preamble", bytes.len()
        )));
    }
    if &bytes[0..4] != MAGIC {
        return Err(TsError::ArtifactCorrupt("not a tsreg model artifact (bad magic)".into()));
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(TsError::IncompatibleVersion { found: version, expected: FORMAT_VERSION });
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[8..16]);
    let header_len = u64::from_le_bytes(len_bytes) as usize;

    let header_end = PREAMBLE_LEN
        .checked_add(header_len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| TsError::ArtifactCorrupt("header length exceeds file size".into()))?;

    let header: ArtifactHeader = serde_json::from_slice(&bytes[PREAMBLE_LEN..header_end])
        .map_err(|e| TsError::ArtifactCorrupt(format!("unreadable header: {e}")))?;

    let record = bytes.split_off(header_end);
    if record.is_empty() {
        return Err(TsError::ArtifactCorrupt("artifact holds no model weights".into()));
    }
    Ok((header, record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> ArtifactHeader {
        ArtifactHeader {
            crate_version: "0.1.0".into(),
            arch:          "TSTPlus".into(),
            model:         TstPlusConfig::new(3, 1, 10),
            n_vars:        3,
            seq_len:       10,
            tfms:          TfmSpec::default(),
            batch_tfms:    Some(TsStandardize::new(true, false)),
            metrics:       vec![Metric::Rmse],
            batch_size:    64,
            train_iter:    12,
            epochs:        3,
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("reg.pkl");
        write_artifact(&path, &header(), &[1, 2, 3]).unwrap();

        let (h, record) = read_artifact(&path).unwrap();
        assert_eq!(h.arch, "TSTPlus");
        assert_eq!(h.train_iter, 12);
        assert_eq!(h.model.c_in, 3);
        assert_eq!(record, vec![1, 2, 3]);
    }

    #[test]
    fn test_bad_magic() {
        let err = parse_artifact(b"PK\x03\x04garbage garbage garbage".to_vec()).unwrap_err();
        assert!(matches!(err, TsError::ArtifactCorrupt(_)));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(parse_artifact(b"TSRA".to_vec()), Err(TsError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_future_version() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        let err = parse_artifact(bytes).unwrap_err();
        assert!(matches!(err, TsError::IncompatibleVersion { found: 99, expected: 1 }));
    }

    #[test]
    fn test_header_longer_than_file() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&1000u64.to_le_bytes());
        bytes.extend_from_slice(b"{}");
        assert!(matches!(parse_artifact(bytes), Err(TsError::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_unreadable_header_json() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&5u64.to_le_bytes());
        bytes.extend_from_slice(b"{nope");
        bytes.extend_from_slice(&[1, 2, 3]);
        let err = parse_artifact(bytes).unwrap_err();
        assert!(matches!(err, TsError::ArtifactCorrupt(msg) if msg.contains("header")));
    }

    #[test]
    fn test_write_under_a_file_is_io() {
        let dir     = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("models");
        fs::write(&blocker, b"not a directory").unwrap();
        let err = write_artifact(&blocker.join("reg.pkl"), &header(), &[1]).unwrap_err();
        assert!(matches!(err, TsError::Io(_)));
    }

    #[test]
    fn test_missing_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(read_artifact(&dir.path().join("nope.pkl")), Err(TsError::Io(_))));
    }
}
