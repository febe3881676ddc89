//! End-to-end forecast generation against a temporary cache.

use anyhow::anyhow;
use forecast::{
    CachedDataSource, DirectorySource, ForecastError, ForecastOptions, Forecaster,
    SpectrumRenderer, StationsConfig,
};
use forecast_cache::{artifact_path, CacheConfig, CleanPolicy, ForecastCache, RunTime};
use spectrum_parser::{SpectrumFormat, SpectrumRecord};
use std::fs;
use std::path::{Path, PathBuf};
use test_utils::{runs, stations, temp_test_dir_with_prefix, CacheLayout, SyntheticSpectrum};

/// Writes a placeholder artifact per record and remembers what it saw.
#[derive(Default)]
struct RecordingRenderer {
    rendered: Vec<(String, i64, f64)>,
    fail_station: Option<String>,
    /// Fail once this many records have been rendered
    fail_after: Option<usize>,
}

impl SpectrumRenderer for RecordingRenderer {
    fn render(&mut self, record: &SpectrumRecord<'_>, out_dir: &Path) -> anyhow::Result<PathBuf> {
        if self.fail_station.as_deref() == Some(record.station_id.as_str()) {
            return Err(anyhow!("plotting failed"));
        }
        if self.fail_after == Some(self.rendered.len()) {
            return Err(anyhow!("plotting failed after {} records", self.rendered.len()));
        }
        let path = artifact_path(out_dir, record.record_time)
            .ok_or_else(|| anyhow!("record time out of range"))?;
        fs::write(&path, b"png")?;
        self.rendered
            .push((record.station_id.clone(), record.record_time, record.hs()));
        Ok(path)
    }
}

fn spectrum_files(ids: &[&str], nrecords: usize) -> Vec<(String, Vec<u8>)> {
    ids.iter()
        .map(|id| {
            let spec = SyntheticSpectrum::new(id, 6, 4, nrecords);
            (
                format!("wave/station/gfswave.{id}.spec"),
                spec.to_text().into_bytes(),
            )
        })
        .collect()
}

fn add_run(layout: &CacheLayout, batch: &str, run: &str, ids: &[&str]) -> PathBuf {
    let files = spectrum_files(ids, 3);
    let refs: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    layout.add_data_run(batch, run, &refs)
}

fn options_at(run: &str) -> ForecastOptions {
    ForecastOptions {
        run_time: Some(RunTime::parse(run).unwrap()),
        ..Default::default()
    }
}

fn open_cache(root: &Path) -> ForecastCache {
    ForecastCache::open(CacheConfig::new(root)).unwrap()
}

#[test]
fn test_make_forecast_renders_every_record() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let layout = CacheLayout::new(dir.path());
    add_run(&layout, "gfs.20200115", "06", &[stations::MONTEREY]);

    let mut forecaster = Forecaster::new(
        open_cache(dir.path()),
        CachedDataSource,
        RecordingRenderer::default(),
        options_at(runs::NEW),
    );
    let summary = forecaster.make_forecast(stations::MONTEREY).unwrap();

    assert_eq!(summary.station, stations::MONTEREY);
    assert_eq!(summary.run_time, runs::NEW);
    assert_eq!(summary.records(), 3);
    assert!(summary.spectrum_file.ends_with("wave/station/gfswave.46042.spec"));
    let (hs_min, hs_max) = summary.hs_range().unwrap();
    assert!(hs_min > 0.0 && hs_min < hs_max);
    assert_eq!(
        summary.last_record.unwrap() - summary.first_record.unwrap(),
        chrono::Duration::hours(2)
    );
    assert_eq!(forecaster.renderer().rendered.len(), 3);

    let cache = forecaster.into_cache().unwrap();
    assert_eq!(
        cache.get_latest_run_time(stations::MONTEREY).as_deref(),
        Some(runs::NEW)
    );
    assert_eq!(cache.index().location(stations::MONTEREY), Some((36.75, -122.5)));
    let artifacts = cache.get_latest_forecast(stations::MONTEREY).unwrap().unwrap();
    let mut expected = summary.artifacts.clone();
    expected.sort();
    assert_eq!(artifacts, expected);
}

#[test]
fn test_make_forecast_missing_station_file() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let layout = CacheLayout::new(dir.path());
    add_run(&layout, "gfs.20200115", "06", &[stations::MONTEREY]);

    let mut forecaster = Forecaster::new(
        open_cache(dir.path()),
        CachedDataSource,
        RecordingRenderer::default(),
        options_at(runs::NEW),
    );
    let err = forecaster.make_forecast(stations::HANALEI).unwrap_err();
    assert!(matches!(err, ForecastError::MissingSpectrum { .. }), "{err}");
    assert_eq!(forecaster.cache().get_latest_run_time(stations::HANALEI), None);
}

#[test]
fn test_make_forecast_without_data_is_fetch_error() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let mut forecaster = Forecaster::new(
        open_cache(dir.path()),
        CachedDataSource,
        RecordingRenderer::default(),
        ForecastOptions::default(),
    );
    let err = forecaster.make_forecast(stations::MONTEREY).unwrap_err();
    assert!(matches!(err, ForecastError::Fetch(_)));
}

#[test]
fn test_read_only_cache_is_rejected() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let cache =
        ForecastCache::open(CacheConfig::new(dir.path()).with_read_only(true)).unwrap();
    let mut forecaster = Forecaster::new(
        cache,
        CachedDataSource,
        RecordingRenderer::default(),
        ForecastOptions::default(),
    );
    let err = forecaster.make_forecast(stations::MONTEREY).unwrap_err();
    assert!(matches!(err, ForecastError::InvalidConfig(_)));
}

#[test]
fn test_run_names_stations_and_cleans() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let layout = CacheLayout::new(dir.path());
    add_run(&layout, "gfs.20200114", "18", &[stations::MONTEREY]);
    add_run(
        &layout,
        "gfs.20200115",
        "06",
        &[stations::MONTEREY, stations::SAN_FRANCISCO],
    );
    // Yesterday's forecasts, including a station no longer configured.
    layout.add_forecast_run(stations::MONTEREY, runs::OLD, &["2020011500.spec.png"]);
    layout.add_forecast_run(stations::HANALEI, runs::OLD, &["2020011500.spec.png"]);

    let stations_config = StationsConfig::from_yaml_str(
        "46042:\n  name: Monterey\n46026: San Francisco\n",
    )
    .unwrap();
    let options = ForecastOptions {
        clean: stations_config.keep_policy(),
        ..options_at(runs::NEW)
    };

    let mut forecaster = Forecaster::new(
        open_cache(dir.path()),
        CachedDataSource,
        RecordingRenderer::default(),
        options,
    );
    let summary = forecaster.run(&stations_config).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.forecasts.len(), 2);
    assert_eq!(summary.clean.batches_removed, 1);
    assert_eq!(summary.clean.stations_removed, 1);
    assert_eq!(summary.clean.forecast_runs_removed, 1);
    drop(forecaster);

    let cache = open_cache(dir.path());
    assert_eq!(
        cache.index().stations(),
        vec![stations::SAN_FRANCISCO, stations::MONTEREY]
    );
    assert_eq!(cache.index().name(stations::MONTEREY), Some(stations::MONTEREY_NAME));
    assert_eq!(
        cache.index().name(stations::SAN_FRANCISCO),
        Some(stations::SAN_FRANCISCO_NAME)
    );
    assert_eq!(
        CacheLayout::subdirs(layout.image_root().join(stations::MONTEREY)),
        vec![runs::NEW]
    );
    assert!(!layout.image_root().join(stations::HANALEI).exists());
    assert_eq!(
        cache.get_latest_forecast(stations::SAN_FRANCISCO).unwrap().map(|a| a.len()),
        Some(3)
    );
}

#[test]
fn test_run_continues_past_failed_station() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let layout = CacheLayout::new(dir.path());
    add_run(
        &layout,
        "gfs.20200115",
        "06",
        &[stations::MONTEREY, stations::SAN_FRANCISCO],
    );

    let renderer = RecordingRenderer {
        fail_station: Some(stations::MONTEREY.to_string()),
        ..Default::default()
    };
    let mut forecaster = Forecaster::new(
        open_cache(dir.path()),
        CachedDataSource,
        renderer,
        options_at(runs::NEW),
    );
    let config = StationsConfig::from_ids([stations::MONTEREY, stations::SAN_FRANCISCO]);
    let summary = forecaster.run(&config).unwrap();

    assert_eq!(summary.forecasts.len(), 1);
    assert_eq!(summary.forecasts[0].station, stations::SAN_FRANCISCO);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].station, stations::MONTEREY);
    assert!(matches!(summary.failures[0].error, ForecastError::Render { .. }));

    let cache = forecaster.into_cache().unwrap();
    assert_eq!(cache.get_latest_run_time(stations::MONTEREY), None);
    assert!(CacheLayout::subdirs(layout.image_root().join(stations::MONTEREY)).is_empty());
    assert_eq!(
        cache.get_latest_run_time(stations::SAN_FRANCISCO).as_deref(),
        Some(runs::NEW)
    );
}

#[test]
fn test_failed_run_keeps_previous_forecast_through_clean() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let layout = CacheLayout::new(dir.path());
    add_run(&layout, "gfs.20200115", "06", &[stations::MONTEREY]);
    layout.add_forecast_run(stations::MONTEREY, runs::OLD, &["2020011500.spec.png"]);

    let mut cache = open_cache(dir.path());
    cache
        .update(stations::MONTEREY, &RunTime::parse(runs::OLD).unwrap(), None, None)
        .unwrap();
    cache.close().unwrap();

    let config = StationsConfig::from_ids([stations::MONTEREY]);
    let renderer = RecordingRenderer {
        fail_after: Some(1),
        ..Default::default()
    };
    let options = ForecastOptions {
        clean: config.keep_policy(),
        ..options_at(runs::NEW)
    };
    let mut forecaster =
        Forecaster::new(open_cache(dir.path()), CachedDataSource, renderer, options);
    let summary = forecaster.run(&config).unwrap();

    assert_eq!(summary.failures.len(), 1);
    assert!(matches!(summary.failures[0].error, ForecastError::Render { .. }));
    assert_eq!(summary.clean.forecast_runs_removed, 0);

    let cache = forecaster.into_cache().unwrap();
    assert_eq!(
        cache.get_latest_run_time(stations::MONTEREY).as_deref(),
        Some(runs::OLD)
    );
    assert_eq!(
        CacheLayout::subdirs(layout.image_root().join(stations::MONTEREY)),
        vec![runs::OLD]
    );
    assert_eq!(
        cache.get_latest_forecast(stations::MONTEREY).unwrap().map(|a| a.len()),
        Some(1)
    );
}

#[test]
fn test_binary_spectra_from_directory_source() {
    let dir = temp_test_dir_with_prefix("wave_forecast_");
    let data = dir.path().join("incoming");
    fs::create_dir_all(&data).unwrap();
    let spec = SyntheticSpectrum::new(stations::HANALEI, 5, 3, 2);
    fs::write(data.join("51208.bin"), spec.to_binary()).unwrap();

    let options = ForecastOptions {
        spec_file_template: "{station}.bin".to_string(),
        format: SpectrumFormat::Binary,
        ..options_at(runs::NEW)
    };
    let mut forecaster = Forecaster::new(
        open_cache(&dir.path().join("cache")),
        DirectorySource::new(&data),
        RecordingRenderer::default(),
        options,
    );
    let summary = forecaster.make_forecast(stations::HANALEI).unwrap();
    assert_eq!(summary.records(), 2);
    assert_eq!(forecaster.renderer().rendered[0].0, stations::HANALEI);
}

#[test]
fn test_clean_policy_default_is_disabled() {
    assert_eq!(ForecastOptions::default().clean, CleanPolicy::Disabled);
}
