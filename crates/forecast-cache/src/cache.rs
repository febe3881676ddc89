//! On-disk forecast cache.
//!
//! Rendered forecasts live in `<root>/forecast/<station>/<run>/` and the
//! index records which run is the latest for each station. Fetched raw data
//! lives beside them in batch directories (`<root>/gfs.<date>/<run>/`).
//! Retention is explicit through [`ForecastCache::clean`].

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::artifact::is_artifact;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::index::ForecastIndex;
use crate::run_time::RunTime;

/// Which stations survive a [`ForecastCache::clean`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CleanPolicy {
    /// Keep the latest run of these stations; remove everything else
    KeepStations(BTreeSet<String>),
    /// Keep the latest run of every station currently in the index
    KeepAll,
    /// Do not clean
    #[default]
    Disabled,
}

impl CleanPolicy {
    pub fn keep_stations<I, S>(stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CleanPolicy::KeepStations(stations.into_iter().map(Into::into).collect())
    }
}

/// What a clean pass removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanStats {
    /// Whole fetched-data batch directories
    pub batches_removed: usize,
    /// Run subdirectories inside the newest batch
    pub data_runs_removed: usize,
    /// Station trees under the image cache
    pub stations_removed: usize,
    /// Older run directories of kept stations
    pub forecast_runs_removed: usize,
    pub index_entries_pruned: usize,
}

impl CleanStats {
    /// Directories removed, across all kinds.
    pub fn directories_removed(&self) -> usize {
        self.batches_removed
            + self.data_runs_removed
            + self.stations_removed
            + self.forecast_runs_removed
    }
}

/// Forecast cache rooted at [`CacheConfig::root`].
pub struct ForecastCache {
    config: CacheConfig,
    index: ForecastIndex,
}

impl ForecastCache {
    /// Open the cache, creating the root directory unless read-only.
    pub fn open(config: CacheConfig) -> CacheResult<Self> {
        if !config.read_only {
            fs::create_dir_all(&config.root).map_err(|e| CacheError::io(&config.root, e))?;
        }

        let index_path = config.index_path();
        let index = if config.read_only {
            ForecastIndex::open_read_only(&index_path)?
        } else {
            ForecastIndex::open(&index_path)?
        };

        info!(
            root = %config.root.display(),
            read_only = config.read_only,
            stations = index.len(),
            "Opened forecast cache"
        );

        Ok(Self { config, index })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn index(&self) -> &ForecastIndex {
        &self.index
    }

    /// Directory for a station's forecast run; `None` means the current
    /// local hour. The directory is not created.
    pub fn forecast_path(
        &self,
        station: &str,
        run_time: Option<&RunTime>,
    ) -> CacheResult<PathBuf> {
        validate_station(station)?;
        let run = run_time.copied().unwrap_or_else(RunTime::now);
        Ok(self.config.image_root().join(station).join(run.to_string()))
    }

    pub fn get_latest_run_time(&self, station: &str) -> Option<String> {
        self.index.latest(station).map(str::to_string)
    }

    /// Artifacts of the station's latest run, sorted by name.
    ///
    /// `None` when no run is recorded or its directory no longer exists. An
    /// existing run directory without artifacts gives an empty list. A
    /// recorded run that is not `YYYY-MM-DD-HH` is `InvalidRunTime`.
    pub fn get_latest_forecast(&self, station: &str) -> CacheResult<Option<Vec<PathBuf>>> {
        let Some(run) = self.index.latest(station) else {
            return Ok(None);
        };
        let dir = self.forecast_path(station, Some(&RunTime::parse(run)?))?;

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(station, run, "Latest forecast directory is missing");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(&dir, e)),
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CacheError::io(&dir, e))?.path();
            if path.is_file() && is_artifact(&path) {
                artifacts.push(path);
            }
        }
        artifacts.sort();
        Ok(Some(artifacts))
    }

    /// Record `run_time` as the station's latest forecast.
    pub fn update(
        &mut self,
        station: &str,
        run_time: &RunTime,
        name: Option<&str>,
        location: Option<(f64, f64)>,
    ) -> CacheResult<()> {
        validate_station(station)?;
        if self.index.update(station, run_time, name, location) {
            info!(station, run_time = %run_time, "Updated latest forecast");
        }
        Ok(())
    }

    /// The newest run directory of the newest fetched-data batch.
    pub fn latest_data_dir(&self) -> CacheResult<Option<PathBuf>> {
        let Some(batch) = self.batch_dirs()?.pop() else {
            return Ok(None);
        };
        Ok(sorted_subdirs(&batch)?.pop())
    }

    /// Apply a retention policy.
    ///
    /// Keeps only the newest run of the newest data batch, the newest run of
    /// each kept station, and the index entries of kept stations. The run the
    /// index names as a station's latest is never removed, even when a newer
    /// directory exists. Directories that have already disappeared are skipped.
    pub fn clean(&mut self, policy: &CleanPolicy) -> CacheResult<CleanStats> {
        let keep = match policy {
            CleanPolicy::Disabled => return Ok(CleanStats::default()),
            CleanPolicy::KeepAll => self.index.stations().into_iter().collect(),
            CleanPolicy::KeepStations(stations) => stations.clone(),
        };

        if self.config.read_only {
            warn!(root = %self.config.root.display(), "Read-only cache, skipping clean");
            return Ok(CleanStats::default());
        }

        info!(keep = ?keep, "Cleaning forecast cache");
        let mut stats = CleanStats::default();

        // Fetched data: newest batch, newest run within it.
        let mut batches = self.batch_dirs()?;
        if let Some(newest) = batches.pop() {
            for batch in &batches {
                if remove_dir(batch)? {
                    stats.batches_removed += 1;
                }
            }

            let mut runs = sorted_subdirs(&newest)?;
            runs.pop();
            for run in &runs {
                if remove_dir(run)? {
                    stats.data_runs_removed += 1;
                }
            }
        }

        // Rendered forecasts: newest and indexed runs of kept stations only.
        for station_dir in sorted_subdirs(&self.config.image_root())? {
            let station = dir_name(&station_dir);
            if !keep.contains(station.as_str()) {
                if remove_dir(&station_dir)? {
                    stats.stations_removed += 1;
                }
                continue;
            }

            let indexed = self.index.latest(&station);
            let mut runs = sorted_subdirs(&station_dir)?;
            runs.pop();
            for run in &runs {
                if indexed == Some(dir_name(run).as_str()) {
                    debug!(station = %station, run = ?indexed, "Keeping indexed run");
                    continue;
                }
                if remove_dir(run)? {
                    stats.forecast_runs_removed += 1;
                }
            }
        }

        stats.index_entries_pruned = self.index.prune(&keep);

        info!(
            batches = stats.batches_removed,
            data_runs = stats.data_runs_removed,
            stations = stats.stations_removed,
            forecast_runs = stats.forecast_runs_removed,
            index_entries = stats.index_entries_pruned,
            "Cleaned forecast cache"
        );
        Ok(stats)
    }

    /// Write pending index changes.
    pub fn flush(&mut self) -> CacheResult<()> {
        self.index.flush()
    }

    pub fn close(self) -> CacheResult<()> {
        self.index.close()
    }

    /// Fetched-data batch directories, oldest first.
    fn batch_dirs(&self) -> CacheResult<Vec<PathBuf>> {
        let mut dirs = sorted_subdirs(&self.config.root)?;
        dirs.retain(|dir| self.config.is_batch_dir(&dir_name(dir)));
        Ok(dirs)
    }
}

/// Check that `station` can name a directory under the image root.
///
/// Ids must be a single non-empty path component: no separators, no `.`
/// or `..`.
pub fn validate_station(station: &str) -> CacheResult<()> {
    let invalid = station.is_empty()
        || station == "."
        || station == ".."
        || station.contains(['/', '\\', '\0']);
    if invalid {
        return Err(CacheError::InvalidStation(station.to_string()));
    }
    Ok(())
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Subdirectories of `dir` sorted by name. A missing `dir` has none.
fn sorted_subdirs(dir: &Path) -> CacheResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(dir, e)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CacheError::io(dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            dirs.push(entry.path());
        }
    }
    dirs.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
    Ok(dirs)
}

/// Remove a directory tree. Returns `false` if it was already gone.
fn remove_dir(path: &Path) -> CacheResult<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            info!(path = %path.display(), "Removed cache directory");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::io(path, e)),
    }
}
