// ============================================================
// Layer 4 - Regression Dataset Loader
// ============================================================
// Resolves a dataset name into (X, y, splits).
//
// Steps:
//   1. Reject names the registry does not know (DatasetNotFound)
//   2. Use the local cache if both .ts files are present,
//      otherwise download and unpack them (DataFetch on failure)
//   3. Parse TRAIN and TEST files
//   4. Stack them into one X / y, with
//        splits = (0..n_train, n_train..n_train + n_test)
//
// With split_data = true the caller gets the two halves back
// as separate arrays instead.

use std::path::{Path, PathBuf};

use crate::data::{fetch::ArchiveFetcher, registry, ts_format::read_ts_file};
use crate::domain::{
    regression_data::{RegressionData, SplitRegressionData},
    splits::Splits,
    traits::DatasetSource,
};
use crate::error::{Result, TsError};

/// Default cache directory for downloaded datasets.
pub const DEFAULT_DATA_DIR: &str = "data/Monash";

/// What `get_regression_data` returns, depending on `split_data`.
#[derive(Debug, Clone)]
pub enum LoadedData {
    Combined(RegressionData),
    Split(SplitRegressionData),
}

impl LoadedData {
    /// The combined form, if that is what was requested.
    pub fn combined(self) -> Option<RegressionData> {
        match self {
            LoadedData::Combined(d) => Some(d),
            LoadedData::Split(_)    => None,
        }
    }
}

/// The Monash regression archive backed by a local directory cache.
/// Implements DatasetSource so the application layer never sees
/// paths, zips or the .ts format.
pub struct MonashArchive {
    data_dir:       PathBuf,
    force_download: bool,
    fetcher:        ArchiveFetcher,
}

impl MonashArchive {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir:       data_dir.into(),
            force_download: false,
            fetcher:        ArchiveFetcher::default(),
        }
    }

    /// Download again even when the cache is populated.
    pub fn with_force_download(mut self, force: bool) -> Self {
        self.force_download = force;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn dataset_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    fn split_paths(&self, name: &str) -> (PathBuf, PathBuf) {
        let dir = self.dataset_dir(name);
        (dir.join(format!("{name}_TRAIN.ts")), dir.join(format!("{name}_TEST.ts")))
    }

    fn ensure_local(&self, name: &str) -> Result<(PathBuf, PathBuf)> {
        let (train, test) = self.split_paths(name);
        if !self.force_download && train.exists() && test.exists() {
            tracing::debug!("Using cached dataset in '{}'", self.dataset_dir(name).display());
            return Ok((train, test));
        }
        let url = registry::archive_url(name)?;
        self.fetcher.fetch(&url, name, &self.dataset_dir(name))?;
        Ok((train, test))
    }

    /// Load `name` as combined or split data.
    pub fn get_regression_data(&self, name: &str, split_data: bool) -> Result<LoadedData> {
        let data = self.load(name)?;
        if split_data {
            Ok(LoadedData::Split(data.into_split()?))
        } else {
            Ok(LoadedData::Combined(data))
        }
    }
}

impl DatasetSource for MonashArchive {
    fn load(&self, name: &str) -> Result<RegressionData> {
        if !registry::is_registered(name) {
            return Err(TsError::DatasetNotFound(name.to_string()));
        }

        let (train_path, test_path) = self.ensure_local(name)?;
        let train = read_ts_file(&train_path)?;
        let test  = read_ts_file(&test_path)?;

        let n_train = train.x.len();
        let n_test  = test.x.len();

        let x = train.x.concat(&test.x)?;
        let mut y = train.y;
        y.extend(test.y);

        tracing::info!(
            "Loaded '{}': {} samples ({} train, {} valid), {} vars x {} steps",
            name, x.len(), n_train, n_test, x.n_vars(), x.seq_len()
        );

        RegressionData::new(name, x, y, Splits::contiguous(n_train, n_test))
    }
}

/// Load a registered dataset from the default cache directory.
pub fn get_regression_data(name: &str, split_data: bool) -> Result<LoadedData> {
    MonashArchive::new(DEFAULT_DATA_DIR).get_regression_data(name, split_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &Path, name: &str) {
        let ds = dir.join(name);
        fs::create_dir_all(&ds).unwrap();
        let header = "@problemName X\n@dimensions 2\n@equalLength true\n@targetLabel true\n@data\n";
        fs::write(
            ds.join(format!("{name}_TRAIN.ts")),
            format!("{header}1,2,3:4,5,6:1.0\n2,3,4:5,6,7:2.0\n3,4,5:6,7,8:3.0\n"),
        ).unwrap();
        fs::write(
            ds.join(format!("{name}_TEST.ts")),
            format!("{header}9,9,9:8,8,8:4.0\n"),
        ).unwrap();
    }

    #[test]
    fn test_unknown_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let err = MonashArchive::new(dir.path()).load("NotARealDataset").unwrap_err();
        assert!(matches!(err, TsError::DatasetNotFound(_)));
    }

    #[test]
    fn test_combined_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "AppliancesEnergy");

        let data = MonashArchive::new(dir.path())
            .get_regression_data("AppliancesEnergy", false)
            .unwrap()
            .combined()
            .unwrap();

        assert_eq!(data.x.shape(), [4, 2, 3]);
        assert_eq!(data.x.len(), data.y.len());
        assert_eq!(data.splits, Splits::contiguous(3, 1));
        assert!(data.splits.train.iter().all(|i| !data.splits.valid.contains(i)));
    }

    #[test]
    fn test_split_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path(), "BIDMCHR");

        let loaded = MonashArchive::new(dir.path())
            .get_regression_data("BIDMCHR", true)
            .unwrap();
        match loaded {
            LoadedData::Split(s) => {
                assert_eq!(s.x_train.len(), 3);
                assert_eq!(s.y_valid, vec![4.0]);
            }
            LoadedData::Combined(_) => panic!("expected split data"),
        }
    }
}
