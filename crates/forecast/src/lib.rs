//! Wave spectrum forecast generation.
//!
//! Ties the pieces together for a list of stations:
//!
//! - A [`SpectrumSource`] makes the latest model run available locally
//! - Each station's spectrum file is located and parsed
//! - A [`SpectrumRenderer`] turns every record into an artifact in the run's
//!   forecast directory
//! - The [`ForecastCache`](forecast_cache::ForecastCache) records the run as
//!   the station's latest, and retention is applied
//!
//! # Example
//!
//! ```no_run
//! use forecast::{CachedDataSource, ForecastOptions, Forecaster, SpectrumRenderer, StationsConfig};
//! use forecast_cache::{CacheConfig, ForecastCache};
//! use spectrum_parser::SpectrumRecord;
//! use std::path::{Path, PathBuf};
//!
//! struct Plotter;
//!
//! impl SpectrumRenderer for Plotter {
//!     fn render(&mut self, record: &SpectrumRecord<'_>, out_dir: &Path) -> anyhow::Result<PathBuf> {
//!         let path = forecast_cache::artifact_path(out_dir, record.record_time)
//!             .ok_or_else(|| anyhow::anyhow!("bad record time"))?;
//!         // draw the polar plot into `path`
//!         Ok(path)
//!     }
//! }
//!
//! let stations = StationsConfig::load("stations.yaml")?;
//! let cache = ForecastCache::open(CacheConfig::from_env())?;
//! let options = ForecastOptions {
//!     clean: stations.keep_policy(),
//!     ..Default::default()
//! };
//! let mut forecaster = Forecaster::new(cache, CachedDataSource, Plotter, options);
//! let summary = forecaster.run(&stations)?;
//! println!("{} stations forecast", summary.forecasts.len());
//! # Ok::<(), forecast::ForecastError>(())
//! ```

mod collaborators;
pub mod error;
mod forecaster;
pub mod stations;

// Re-exports
pub use collaborators::{CachedDataSource, DirectorySource, SpectrumRenderer, SpectrumSource};
pub use error::{ForecastError, Result};
pub use forecaster::{
    find_spectrum_file, ForecastOptions, ForecastSummary, Forecaster, RunSummary, StationFailure,
    STATION_PLACEHOLDER,
};
pub use stations::{StationConfig, StationsConfig};
