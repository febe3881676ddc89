//! Shared test utilities for the ncep-wave workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Test data path helpers
//! - Skip macros for optional sample files
//! - Synthetic spectrum generators (text and binary)
//! - Forecast cache layout fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a real spectrum sample, or return early from the calling test.
///
/// Sample files come from NCEP and are not checked in; see
/// [`find_test_file`] for where they are looked up.
///
/// ```ignore
/// #[test]
/// fn test_monterey_sample() {
///     let path = require_test_file!("gfswave.46042.spec");
///     let file = SpectrumFile::open(&path, SpectrumFormat::Text).unwrap();
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: spectrum sample '{}' not found (set TEST_DATA_DIR)",
                    $name
                );
                return;
            }
        }
    }};
}

/// Assert two values agree to within an absolute tolerance, comparing as `f64`.
///
/// Used where text and binary spectra of the same data are compared, since the
/// text format rounds energies to a few significant digits.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let (left, right, tolerance) = ($left as f64, $right as f64, $tolerance as f64);
        let diff = (left - right).abs();
        assert!(
            diff <= tolerance,
            "{} = {:?} and {} = {:?} differ by {:?}, more than {:?}",
            stringify!($left),
            left,
            stringify!($right),
            right,
            diff,
            tolerance
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "more than")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }
}
