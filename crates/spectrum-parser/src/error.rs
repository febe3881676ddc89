//! Error types for spectrum parsing.

use thiserror::Error;

/// Result type for spectrum parser operations.
pub type SpectrumResult<T> = Result<T, SpectrumError>;

/// Errors raised while reading a spectrum file.
///
/// All variants are fatal for the stream they were raised on: once a
/// record fails, the position in the underlying reader can no longer be
/// trusted and the record sequence ends.
#[derive(Error, Debug)]
pub enum SpectrumError {
    /// Underlying reader failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// First line is not a `'WAVEWATCH III SPECTRA' nf nd np` header
    #[error("Bad header format: {0}")]
    HeaderFormat(String),

    /// Frequency or direction block length disagrees with the header counts
    #[error("Wrong number of {axis}: {actual} != {expected}")]
    HeaderCount {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Axis values that cannot describe a spectral grid
    #[error("Invalid spectral grid: {0}")]
    InvalidGrid(String),

    /// Record timestamp line is not `YYYYMMDD HHMMSS`
    #[error("Bad record time on line {line}: '{text}'")]
    RecordTime { line: usize, text: String },

    /// Malformed per-record station summary line
    #[error("Bad record header on line {line}: '{text}'")]
    RecordSummaryFormat { line: usize, text: String },

    /// Energy block length disagrees with `nfreqs * ndirs`
    #[error("Unexpected amount of record data: got {actual} values, expected {expected}")]
    RecordCount { expected: usize, actual: usize },

    /// A token inside a numeric block did not parse as a float
    #[error("Invalid number '{token}' on line {line}")]
    InvalidNumber { line: usize, token: String },

    /// The stream ended inside a header or a declared-length block
    #[error("Unexpected end of stream while reading {0}")]
    UnexpectedEndOfStream(&'static str),
}
