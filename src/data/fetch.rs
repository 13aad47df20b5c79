// ============================================================
// Layer 4 - Dataset Downloader
// ============================================================
// Fetches {name}.zip from the archive and unpacks the two .ts
// files into the local cache:
//
//   {data_dir}/{name}/{name}_TRAIN.ts
//   {data_dir}/{name}/{name}_TEST.ts
//
// Every failure on this path (network, HTTP status, bad zip,
// disk write) is reported as DataFetch so the caller sees one
// kind of error for "could not get the data".

use std::{
    fs,
    io::{self, Cursor},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{Result, TsError};

const USER_AGENT: &str = concat!("tsreg/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP fetcher for dataset archives.
pub struct ArchiveFetcher {
    timeout: Duration,
}

impl Default for ArchiveFetcher {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(300) }
    }
}

impl ArchiveFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Download `url` and extract the TRAIN/TEST files of `name` into `dest`.
    /// Returns the paths of the extracted files.
    pub fn fetch(&self, url: &str, name: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        tracing::info!("Downloading '{}' from {}", name, url);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| TsError::DataFetch(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| TsError::DataFetch(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TsError::DataFetch(format!("{url} returned HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TsError::DataFetch(format!("reading body of {url}: {e}")))?;
        tracing::debug!("Downloaded {} bytes", bytes.len());

        extract_ts_members(&bytes, name, dest)
    }
}

/// Unpack `{name}_TRAIN.ts` and `{name}_TEST.ts` from a zip held in memory.
/// Directory prefixes inside the archive are ignored.
pub fn extract_ts_members(zip_bytes: &[u8], name: &str, dest: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(zip_bytes))
        .map_err(|e| TsError::DataFetch(format!("invalid zip archive: {e}")))?;

    fs::create_dir_all(dest)
        .map_err(|e| TsError::DataFetch(format!("cannot create '{}': {e}", dest.display())))?;

    let wanted = [format!("{name}_TRAIN.ts"), format!("{name}_TEST.ts")];
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| TsError::DataFetch(format!("zip entry {i}: {e}")))?;
        if entry.is_dir() {
            continue;
        }

        // Only the file name is trusted; never join archive paths onto dest.
        let file_name = match Path::new(entry.name()).file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        // Stored under the expected casing so the loader finds it
        let Some(target) = wanted.iter().find(|w| w.eq_ignore_ascii_case(&file_name)) else {
            continue;
        };

        let out_path = dest.join(target);
        let mut out = fs::File::create(&out_path)
            .map_err(|e| TsError::DataFetch(format!("cannot write '{}': {e}", out_path.display())))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| TsError::DataFetch(format!("cannot write '{}': {e}", out_path.display())))?;

        tracing::debug!("Extracted {}", out_path.display());
        if !written.contains(&out_path) {
            written.push(out_path);
        }
    }

    if written.len() < wanted.len() {
        return Err(TsError::DataFetch(format!(
            "archive for '{name}' is missing {} or {}", wanted[0], wanted[1]
        )));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zw = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::SimpleFileOptions::default();
            for (name, body) in files {
                zw.start_file(*name, opts).unwrap();
                zw.write_all(body.as_bytes()).unwrap();
            }
            zw.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_extracts_nested_members() {
        let dir   = tempfile::tempdir().unwrap();
        let bytes = make_zip(&[
            ("Toy/Toy_TRAIN.ts", "train"),
            ("Toy/Toy_TEST.ts",  "test"),
            ("Toy/readme.txt",   "ignored"),
        ]);
        let files = extract_ts_members(&bytes, "Toy", dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(fs::read_to_string(dir.path().join("Toy_TEST.ts")).unwrap(), "test");
        assert!(!dir.path().join("readme.txt").exists());
    }

    #[test]
    fn test_missing_member_is_fetch_error() {
        let dir   = tempfile::tempdir().unwrap();
        let bytes = make_zip(&[("Toy_TRAIN.ts", "train")]);
        let err   = extract_ts_members(&bytes, "Toy", dir.path()).unwrap_err();
        assert!(matches!(err, TsError::DataFetch(_)));
    }

    #[test]
    fn test_member_casing_is_normalised() {
        let dir   = tempfile::tempdir().unwrap();
        let bytes = make_zip(&[("toy_train.TS", "train"), ("TOY_TEST.ts", "test")]);
        extract_ts_members(&bytes, "Toy", dir.path()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("Toy_TRAIN.ts")).unwrap(), "train");
        assert_eq!(fs::read_to_string(dir.path().join("Toy_TEST.ts")).unwrap(), "test");
    }

    #[test]
    fn test_unreachable_host_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArchiveFetcher::new(Duration::from_secs(5))
            .fetch("http://127.0.0.1:1/Toy.zip", "Toy", dir.path())
            .unwrap_err();
        assert!(matches!(err, TsError::DataFetch(_)));
    }

    #[test]
    fn test_garbage_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_ts_members(b"not a zip", "Toy", dir.path()).unwrap_err();
        assert!(matches!(err, TsError::DataFetch(_)));
    }
}
