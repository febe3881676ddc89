//! Seams to the outside world: fetching spectral data and rendering records.
//!
//! Both are implemented elsewhere (network retrieval, plotting); this crate
//! only drives them. They report failures as `anyhow::Error`.

use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

use forecast_cache::ForecastCache;
use spectrum_parser::SpectrumRecord;

/// Supplies the latest run of station spectra as a local directory.
pub trait SpectrumSource {
    /// Make the latest run available and return the directory holding it.
    ///
    /// The directory may nest the station files at any depth.
    fn fetch_latest(&mut self, cache: &ForecastCache) -> anyhow::Result<PathBuf>;
}

/// Renders one record to one artifact file.
pub trait SpectrumRenderer {
    /// Write the artifact for `record` into `out_dir` and return its path.
    fn render(&mut self, record: &SpectrumRecord<'_>, out_dir: &Path) -> anyhow::Result<PathBuf>;
}

/// Uses whatever has already been fetched into the cache: the newest run
/// of the newest batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct CachedDataSource;

impl SpectrumSource for CachedDataSource {
    fn fetch_latest(&mut self, cache: &ForecastCache) -> anyhow::Result<PathBuf> {
        cache
            .latest_data_dir()
            .context("Failed to scan fetched data")?
            .ok_or_else(|| {
                anyhow!(
                    "no fetched spectral data under {}",
                    cache.config().root.display()
                )
            })
    }
}

/// A fixed directory of spectrum files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

impl SpectrumSource for DirectorySource {
    fn fetch_latest(&mut self, _cache: &ForecastCache) -> anyhow::Result<PathBuf> {
        if !self.dir.is_dir() {
            return Err(anyhow!("{} is not a directory", self.dir.display()));
        }
        Ok(self.dir.clone())
    }
}
