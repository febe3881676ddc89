//! Error types for the forecast crate.

use std::path::PathBuf;
use thiserror::Error;

use forecast_cache::CacheError;
use spectrum_parser::SpectrumError;

/// Errors that can occur while generating forecasts.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Failed to parse spectrum: {0}")]
    Spectrum(#[from] SpectrumError),

    #[error("Forecast cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to parse stations config: {0}")]
    StationsFormat(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No spectrum file '{file}' for station {station} under {}", dir.display())]
    MissingSpectrum {
        station: String,
        file: String,
        dir: PathBuf,
    },

    #[error("Failed to fetch spectral data: {0}")]
    Fetch(#[source] anyhow::Error),

    #[error("Failed to render forecast for station {station}: {source}")]
    Render {
        station: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;
