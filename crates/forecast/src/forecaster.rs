//! Forecast generation.
//!
//! For each station: find its spectrum file in the fetched run, parse it,
//! render every record into the run's forecast directory, then record the
//! run as the station's latest in the cache.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use forecast_cache::{CleanPolicy, CleanStats, ForecastCache, RunTime};
use spectrum_parser::{SpectrumFile, SpectrumFormat};

use crate::collaborators::{SpectrumRenderer, SpectrumSource};
use crate::error::{ForecastError, Result};
use crate::stations::{StationConfig, StationsConfig};

/// Placeholder replaced by the station id in [`ForecastOptions::spec_file_template`].
pub const STATION_PLACEHOLDER: &str = "{station}";

/// Options for forecast generation.
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    /// Spectrum file name for a station, `{station}` is substituted
    pub spec_file_template: String,
    pub format: SpectrumFormat,
    /// Retention applied after [`Forecaster::run`]
    pub clean: CleanPolicy,
    /// Run time to file forecasts under, defaults to the current local hour
    pub run_time: Option<RunTime>,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            spec_file_template: format!("gfswave.{STATION_PLACEHOLDER}.spec"),
            format: SpectrumFormat::Text,
            clean: CleanPolicy::Disabled,
            run_time: None,
        }
    }
}

impl ForecastOptions {
    /// Spectrum file name for a station.
    pub fn spec_file_name(&self, station: &StationConfig) -> String {
        match &station.spec_file {
            Some(file) => file.clone(),
            None => self.spec_file_template.replace(STATION_PLACEHOLDER, &station.id),
        }
    }
}

/// Result of forecasting one station.
#[derive(Debug, Clone)]
pub struct ForecastSummary {
    pub station: String,
    /// Run the forecast was filed under (`YYYY-MM-DD-HH`)
    pub run_time: String,
    pub spectrum_file: PathBuf,
    /// Rendered artifacts, in record order
    pub artifacts: Vec<PathBuf>,
    pub first_record: Option<DateTime<Utc>>,
    pub last_record: Option<DateTime<Utc>>,
    hs_min: Option<f64>,
    hs_max: Option<f64>,
}

impl ForecastSummary {
    pub fn records(&self) -> usize {
        self.artifacts.len()
    }

    /// Smallest and largest significant wave height over the records, in metres.
    pub fn hs_range(&self) -> Option<(f64, f64)> {
        Some((self.hs_min?, self.hs_max?))
    }
}

/// A station whose forecast could not be produced.
#[derive(Debug)]
pub struct StationFailure {
    pub station: String,
    pub error: ForecastError,
}

/// Result of a [`Forecaster::run`] over a station list.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub forecasts: Vec<ForecastSummary>,
    pub failures: Vec<StationFailure>,
    pub clean: CleanStats,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a data source and a renderer over the forecast cache.
pub struct Forecaster<S, R> {
    cache: ForecastCache,
    source: S,
    renderer: R,
    options: ForecastOptions,
}

impl<S: SpectrumSource, R: SpectrumRenderer> Forecaster<S, R> {
    pub fn new(cache: ForecastCache, source: S, renderer: R, options: ForecastOptions) -> Self {
        Self {
            cache,
            source,
            renderer,
            options,
        }
    }

    pub fn cache(&self) -> &ForecastCache {
        &self.cache
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn options(&self) -> &ForecastOptions {
        &self.options
    }

    /// Fetch the latest data and forecast a single station.
    ///
    /// The index change is flushed before returning.
    pub fn make_forecast(&mut self, station: &str) -> Result<ForecastSummary> {
        self.ensure_writable()?;
        let data_dir = self.fetch()?;
        let run_time = self.run_time();
        let summary = self.forecast_station(&data_dir, &StationConfig::new(station), &run_time)?;
        self.cache.flush()?;
        Ok(summary)
    }

    /// Forecast every configured station from one fetch, then apply the
    /// configured retention policy and flush the index.
    ///
    /// A station that fails is reported in the summary and does not stop the
    /// others. Fetch, clean and flush failures abort the run.
    pub fn run(&mut self, stations: &StationsConfig) -> Result<RunSummary> {
        self.ensure_writable()?;
        let data_dir = self.fetch()?;
        let run_time = self.run_time();

        info!(
            stations = stations.len(),
            run_time = %run_time,
            data_dir = %data_dir.display(),
            "Generating forecasts"
        );

        let mut summary = RunSummary::default();
        for station in stations.stations() {
            match self.forecast_station(&data_dir, station, &run_time) {
                Ok(forecast) => summary.forecasts.push(forecast),
                Err(error) => {
                    warn!(station = %station.id, error = %error, "Forecast failed");
                    summary.failures.push(StationFailure {
                        station: station.id.clone(),
                        error,
                    });
                }
            }
        }

        summary.clean = self.cache.clean(&self.options.clean)?;
        self.cache.flush()?;

        info!(
            forecasts = summary.forecasts.len(),
            failures = summary.failures.len(),
            "Forecast run complete"
        );
        Ok(summary)
    }

    /// Flush and hand back the cache.
    pub fn into_cache(mut self) -> Result<ForecastCache> {
        self.cache.flush()?;
        Ok(self.cache)
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.cache.config().read_only {
            return Err(ForecastError::InvalidConfig(
                "cannot generate forecasts into a read-only cache".to_string(),
            ));
        }
        Ok(())
    }

    fn fetch(&mut self) -> Result<PathBuf> {
        let dir = self
            .source
            .fetch_latest(&self.cache)
            .map_err(ForecastError::Fetch)?;
        debug!(data_dir = %dir.display(), "Fetched spectral data");
        Ok(dir)
    }

    fn run_time(&self) -> RunTime {
        self.options.run_time.unwrap_or_else(RunTime::now)
    }

    /// Render one station into a fresh run directory and record it.
    ///
    /// A run directory created here is removed again if the station fails,
    /// so a later clean never mistakes it for the station's newest forecast.
    fn forecast_station(
        &mut self,
        data_dir: &Path,
        station: &StationConfig,
        run_time: &RunTime,
    ) -> Result<ForecastSummary> {
        let file_name = self.options.spec_file_name(station);
        let spec_path =
            find_spectrum_file(data_dir, &file_name).ok_or_else(|| ForecastError::MissingSpectrum {
                station: station.id.clone(),
                file: file_name.clone(),
                dir: data_dir.to_path_buf(),
            })?;

        let out_dir = self.cache.forecast_path(&station.id, Some(run_time))?;
        let created = !out_dir.exists();
        fs::create_dir_all(&out_dir).map_err(|source| ForecastError::Io {
            path: out_dir.clone(),
            source,
        })?;

        let rendered = self.render_records(&spec_path, &out_dir, station, run_time);
        let (summary, location) = match rendered {
            Ok(rendered) => rendered,
            Err(err) => {
                if created {
                    discard_run_dir(&out_dir);
                }
                return Err(err);
            }
        };

        self.cache
            .update(&station.id, run_time, station.name.as_deref(), location)?;

        info!(
            station = %station.id,
            run_time = %run_time,
            records = summary.records(),
            hs_max = ?summary.hs_max,
            "Generated forecast"
        );
        Ok(summary)
    }

    fn render_records(
        &mut self,
        spec_path: &Path,
        out_dir: &Path,
        station: &StationConfig,
        run_time: &RunTime,
    ) -> Result<(ForecastSummary, Option<(f64, f64)>)> {
        let mut file = SpectrumFile::open(spec_path, self.options.format)?;
        let mut summary = ForecastSummary {
            station: station.id.clone(),
            run_time: run_time.to_string(),
            spectrum_file: spec_path.to_path_buf(),
            artifacts: Vec::new(),
            first_record: None,
            last_record: None,
            hs_min: None,
            hs_max: None,
        };
        let mut location = None;

        for record in file.records() {
            let record = record?;
            let artifact = self
                .renderer
                .render(&record, out_dir)
                .map_err(|source| ForecastError::Render {
                    station: station.id.clone(),
                    source,
                })?;

            let hs = record.hs();
            summary.hs_min = Some(summary.hs_min.map_or(hs, |min| min.min(hs)));
            summary.hs_max = Some(summary.hs_max.map_or(hs, |max| max.max(hs)));
            if summary.first_record.is_none() {
                summary.first_record = record.datetime();
                location = Some((record.lat, record.lon));
            }
            summary.last_record = record.datetime();
            summary.artifacts.push(artifact);
        }
        Ok((summary, location))
    }
}

fn discard_run_dir(dir: &Path) {
    match fs::remove_dir_all(dir) {
        Ok(()) => debug!(dir = %dir.display(), "Removed incomplete forecast run"),
        Err(e) => warn!(
            dir = %dir.display(),
            error = %e,
            "Failed to remove incomplete forecast run"
        ),
    }
}

/// Search `dir` recursively for a file named `file_name`.
///
/// Entries are visited in name order so the result does not depend on
/// directory listing order.
pub fn find_spectrum_file(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_file_name() {
        let options = ForecastOptions::default();
        assert_eq!(
            options.spec_file_name(&StationConfig::new("46042")),
            "gfswave.46042.spec"
        );

        let mut station = StationConfig::new("46042");
        station.spec_file = Some("enp.46042.spec".to_string());
        assert_eq!(options.spec_file_name(&station), "enp.46042.spec");
    }

    #[test]
    fn test_find_spectrum_file_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("wave").join("station");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("gfswave.46042.spec"), b"").unwrap();
        // A directory with the same name is not a match.
        fs::create_dir_all(dir.path().join("gfswave.46026.spec")).unwrap();

        assert_eq!(
            find_spectrum_file(dir.path(), "gfswave.46042.spec"),
            Some(nested.join("gfswave.46042.spec"))
        );
        assert_eq!(find_spectrum_file(dir.path(), "gfswave.46026.spec"), None);
    }

    #[test]
    fn test_summary_hs_range() {
        let summary = ForecastSummary {
            station: "46042".to_string(),
            run_time: "2020-01-15-06".to_string(),
            spectrum_file: PathBuf::new(),
            artifacts: vec![],
            first_record: None,
            last_record: None,
            hs_min: None,
            hs_max: None,
        };
        assert_eq!(summary.hs_range(), None);
        assert_eq!(summary.records(), 0);
    }
}
