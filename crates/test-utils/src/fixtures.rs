//! Common test fixtures for ncep-wave tests.
//!
//! This module provides station identifiers, run times and a builder for
//! on-disk forecast cache layouts.

use std::fs;
use std::path::{Path, PathBuf};

/// Buoy stations used across the test suite.
pub mod stations {
    /// Monterey Bay
    pub const MONTEREY: &str = "46042";
    pub const MONTEREY_NAME: &str = "Monterey";
    /// San Francisco
    pub const SAN_FRANCISCO: &str = "46026";
    pub const SAN_FRANCISCO_NAME: &str = "San Francisco";
    /// Hanalei, Kauai
    pub const HANALEI: &str = "51208";
}

/// Normalized run time strings (`YYYY-MM-DD-HH`).
pub mod runs {
    pub const OLDER: &str = "2020-01-14-06";
    pub const OLD: &str = "2020-01-15-00";
    pub const NEW: &str = "2020-01-15-06";
}

/// Builds a forecast cache directory tree under a root.
///
/// The layout matches what the cache expects: `forecast/<station>/<run>/`
/// for rendered artifacts and `<batch>/<run>/` for fetched data.
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_root(&self) -> PathBuf {
        self.root.join("forecast")
    }

    /// Create a run directory holding the given artifact file names.
    pub fn add_forecast_run(&self, station: &str, run: &str, artifacts: &[&str]) -> PathBuf {
        let dir = self.image_root().join(station).join(run);
        fs::create_dir_all(&dir).expect("Failed to create forecast run directory");
        for name in artifacts {
            fs::write(dir.join(name), b"png").expect("Failed to write artifact");
        }
        dir
    }

    /// Create a fetched-data run directory holding the given files.
    pub fn add_data_run(&self, batch: &str, run: &str, files: &[(&str, &[u8])]) -> PathBuf {
        let dir = self.root.join(batch).join(run);
        fs::create_dir_all(&dir).expect("Failed to create data run directory");
        for (name, contents) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("Failed to create data subdirectory");
            }
            fs::write(path, contents).expect("Failed to write data file");
        }
        dir
    }

    /// Names of the subdirectories of `dir`, sorted.
    pub fn subdirs<P: AsRef<Path>>(dir: P) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .filter(|e| e.path().is_dir())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_layout() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());

        let run = layout.add_forecast_run(stations::MONTEREY, runs::NEW, &["2020011506.spec.png"]);
        assert!(run.join("2020011506.spec.png").exists());

        layout.add_data_run("gfs.20200115", "06", &[("wave/station/a.spec", b"x")]);
        assert!(dir.path().join("gfs.20200115/06/wave/station/a.spec").exists());

        assert_eq!(
            CacheLayout::subdirs(layout.image_root()),
            vec![stations::MONTEREY.to_string()]
        );
        assert!(CacheLayout::subdirs(dir.path().join("missing")).is_empty());
    }
}
