//! Persisted index of the latest forecast per station.
//!
//! The index is a JSON object keyed by station id:
//!
//! ```json
//! {
//!   "46042": { "latest": "2020-01-15-06", "name": "Monterey", "lat": 36.75, "lon": -122.42 }
//! }
//! ```
//!
//! It is read once when opened and written back on [`ForecastIndex::flush`]
//! or [`ForecastIndex::close`], only if something changed. Keys this crate
//! does not know about are carried through a rewrite untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{CacheError, CacheResult};
use crate::run_time::RunTime;

/// Index record for one station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Run time (`YYYY-MM-DD-HH`) of the newest rendered forecast
    pub latest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexEntry {
    fn new(latest: &RunTime) -> Self {
        Self {
            latest: latest.to_string(),
            name: None,
            lat: None,
            lon: None,
            extra: Map::new(),
        }
    }
}

/// Station id to latest forecast mapping, backed by a JSON file.
#[derive(Debug)]
pub struct ForecastIndex {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
    read_only: bool,
    dirty: bool,
}

impl ForecastIndex {
    /// Open an index for reading and writing. A missing file is an empty index.
    pub fn open<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        Self::load(path.as_ref(), false)
    }

    /// Open an index that is never written back.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> CacheResult<Self> {
        Self::load(path.as_ref(), true)
    }

    fn load(path: &Path, read_only: bool) -> CacheResult<Self> {
        let entries = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| CacheError::IndexFormat {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        debug!(
            path = %path.display(),
            stations = entries.len(),
            read_only,
            "Loaded forecast index"
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            read_only,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether there are changes not yet written back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, station: &str) -> Option<&IndexEntry> {
        self.entries.get(station)
    }

    /// Run time of the station's newest forecast.
    pub fn latest(&self, station: &str) -> Option<&str> {
        self.entries.get(station).map(|e| e.latest.as_str())
    }

    pub fn name(&self, station: &str) -> Option<&str> {
        self.entries.get(station).and_then(|e| e.name.as_deref())
    }

    /// `(lat, lon)` of the station, when both are known.
    pub fn location(&self, station: &str) -> Option<(f64, f64)> {
        let entry = self.entries.get(station)?;
        Some((entry.lat?, entry.lon?))
    }

    /// Record `run_time` as the station's latest run.
    ///
    /// `name` and `location` overwrite the stored values when given; when
    /// omitted, whatever the entry already holds is kept. Returns whether the
    /// entry changed.
    pub fn update(
        &mut self,
        station: &str,
        run_time: &RunTime,
        name: Option<&str>,
        location: Option<(f64, f64)>,
    ) -> bool {
        let is_new = !self.entries.contains_key(station);
        let entry = self
            .entries
            .entry(station.to_string())
            .or_insert_with(|| IndexEntry::new(run_time));
        let before = entry.clone();

        entry.latest = run_time.to_string();
        if let Some(name) = name {
            entry.name = Some(name.to_string());
        }
        if let Some((lat, lon)) = location {
            entry.lat = Some(lat);
            entry.lon = Some(lon);
        }

        let changed = is_new || *entry != before;
        if changed {
            self.dirty = true;
        }
        changed
    }

    /// Station ids in ascending order.
    pub fn stations(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Drop every station not in `keep`. Returns the number removed.
    pub fn prune(&mut self, keep: &BTreeSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|station, _| keep.contains(station));
        let removed = before - self.entries.len();

        if removed > 0 {
            self.dirty = true;
            info!(removed, kept = self.entries.len(), "Pruned forecast index");
        }
        removed
    }

    /// Write pending changes to disk.
    ///
    /// A no-op when nothing changed or the index is read-only. The document
    /// is written to a sibling temporary file and renamed into place.
    pub fn flush(&mut self) -> CacheResult<()> {
        if !self.dirty {
            return Ok(());
        }
        if self.read_only {
            debug!(path = %self.path.display(), "Read-only index, discarding changes");
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;

        let json = serde_json::to_vec_pretty(&self.entries).map_err(|source| {
            CacheError::IndexFormat {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| CacheError::io(&dir, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CacheError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| CacheError::io(&self.path, e.error))?;

        self.dirty = false;
        info!(
            path = %self.path.display(),
            stations = self.entries.len(),
            "Wrote forecast index"
        );
        Ok(())
    }

    /// Flush and release the index.
    pub fn close(mut self) -> CacheResult<()> {
        self.flush()
    }
}

impl Drop for ForecastIndex {
    fn drop(&mut self) {
        if self.dirty && !self.read_only {
            warn!(
                path = %self.path.display(),
                "Forecast index dropped with unsaved changes"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(text: &str) -> RunTime {
        text.parse().unwrap()
    }

    fn index_in(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("index.json")
    }

    #[test]
    fn test_missing_and_empty_files_are_empty_indexes() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);

        let index = ForecastIndex::open(&path).unwrap();
        assert!(index.is_empty());
        assert!(!index.is_dirty());

        fs::write(&path, "  \n").unwrap();
        let index = ForecastIndex::open(&path).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_malformed_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        fs::write(&path, "{ not json").unwrap();

        let err = ForecastIndex::open(&path).unwrap_err();
        assert!(matches!(err, CacheError::IndexFormat { .. }));
    }

    #[test]
    fn test_update_merges_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = ForecastIndex::open(index_in(&dir)).unwrap();

        assert!(index.update(
            "46042",
            &run("2020-01-15-00"),
            Some("Monterey"),
            Some((36.75, -122.42))
        ));
        assert!(index.update("46042", &run("2020-01-15-06"), None, None));

        assert_eq!(index.latest("46042"), Some("2020-01-15-06"));
        assert_eq!(index.name("46042"), Some("Monterey"));
        assert_eq!(index.location("46042"), Some((36.75, -122.42)));
    }

    #[test]
    fn test_repeated_update_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        let mut index = ForecastIndex::open(&path).unwrap();
        index.update("46042", &run("2020-01-15-06"), Some("Monterey"), None);
        index.close().unwrap();

        let mut index = ForecastIndex::open(&path).unwrap();
        assert!(!index.update("46042", &run("2020-01-15-06"), Some("Monterey"), None));
        assert!(!index.is_dirty());
    }

    #[test]
    fn test_new_station_without_extras_is_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = ForecastIndex::open(index_in(&dir)).unwrap();
        assert!(index.update("46026", &run("2020-01-15-06"), None, None));
        assert!(index.is_dirty());
        assert_eq!(index.name("46026"), None);
        assert_eq!(index.location("46026"), None);
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        fs::write(
            &path,
            json!({
                "46042": { "latest": "2020-01-15-00", "name": "Monterey", "region": "central" }
            })
            .to_string(),
        )
        .unwrap();

        let mut index = ForecastIndex::open(&path).unwrap();
        index.update("46042", &run("2020-01-15-06"), None, None);
        index.close().unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "46042": { "latest": "2020-01-15-06", "name": "Monterey", "region": "central" }
            })
        );
    }

    #[test]
    fn test_latest_is_written_in_canonical_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        let mut index = ForecastIndex::open(&path).unwrap();
        let noon = chrono::NaiveDate::from_ymd_opt(2020, 1, 15)
            .unwrap()
            .and_hms_opt(12, 34, 56)
            .unwrap();
        index.update("46042", &RunTime::from_naive(noon), None, None);
        index.close().unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, json!({ "46042": { "latest": "2020-01-15-12" } }));
    }

    #[test]
    fn test_stations_sorted_and_prune() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = ForecastIndex::open(index_in(&dir)).unwrap();
        index.update("51208", &run("2020-01-15-06"), None, None);
        index.update("46026", &run("2020-01-15-06"), None, None);
        index.update("46042", &run("2020-01-15-06"), None, None);
        assert_eq!(index.stations(), vec!["46026", "46042", "51208"]);

        let keep: BTreeSet<String> = ["46042".to_string()].into_iter().collect();
        assert_eq!(index.prune(&keep), 2);
        assert_eq!(index.stations(), vec!["46042"]);
        assert_eq!(index.prune(&keep), 0);
    }

    #[test]
    fn test_read_only_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        let mut index = ForecastIndex::open(&path).unwrap();
        index.update("46042", &run("2020-01-15-06"), None, None);
        index.close().unwrap();
        let original = fs::read_to_string(&path).unwrap();

        let mut index = ForecastIndex::open_read_only(&path).unwrap();
        assert_eq!(index.latest("46042"), Some("2020-01-15-06"));
        index.update("46042", &run("2020-01-16-00"), None, None);
        assert_eq!(index.latest("46042"), Some("2020-01-16-00"));
        index.close().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_unchanged_index_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = index_in(&dir);
        let index = ForecastIndex::open(&path).unwrap();
        index.close().unwrap();
        assert!(!path.exists());
    }
}
