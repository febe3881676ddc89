//! WAVEWATCH III point spectrum parser.
//!
//! Reads the per-station spectral output published with the NCEP wave
//! forecasts, either in the model's native indentation-delimited text
//! format or in the compact little-endian binary format, and yields the
//! records one at a time.
//!
//! # Example
//!
//! ```no_run
//! use spectrum_parser::{SpectrumFile, SpectrumFormat};
//!
//! let mut file = SpectrumFile::open("gfswave.46042.spec", SpectrumFormat::Text)?;
//! for record in file.records() {
//!     let record = record?;
//!     println!("{} Hs={:.2}m", record.record_time, record.hs());
//! }
//! # Ok::<(), spectrum_parser::SpectrumError>(())
//! ```

mod binary;
pub mod error;
mod file;
pub mod grid;
mod lines;
pub mod record;
mod text;
pub mod time;

pub use error::{SpectrumError, SpectrumResult};
pub use file::{Records, SpectrumFile, SpectrumFormat, StationInfo};
pub use grid::Grid;
pub use record::{RecordSummary, SpectrumRecord};
pub use time::local_timestamp;
