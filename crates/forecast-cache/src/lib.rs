//! Forecast cache for rendered wave spectra.
//!
//! Provides:
//! - Cache configuration (root directory, layout names, read-only mode)
//! - Run time normalization (`YYYY-MM-DD-HH`) and artifact file naming
//! - A JSON index mapping station id to its latest forecast run
//! - The on-disk cache itself: latest lookups, updates and retention

pub mod artifact;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod run_time;

pub use artifact::{artifact_file_name, artifact_path, artifact_time, is_artifact, ARTIFACT_SUFFIX};
pub use cache::{validate_station, CleanPolicy, CleanStats, ForecastCache};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use index::{ForecastIndex, IndexEntry};
pub use run_time::RunTime;
