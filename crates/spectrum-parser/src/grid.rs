//! Frequency/direction axes shared by every record of a spectrum file.

use crate::error::{SpectrumError, SpectrumResult};

/// Spectral grid definition.
///
/// Built once from the file header and never mutated afterwards; records
/// hold a shared reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    freqs: Vec<f64>,
    dfreqs: Vec<f64>,
    dirs: Vec<f64>,
}

impl Grid {
    /// Build a grid from frequency (Hz) and direction (radians) axes.
    ///
    /// The per-band ratios `dfreqs` are derived here. The top band has no
    /// upper neighbour, so it repeats the ratio of the band below it.
    pub fn new(freqs: Vec<f64>, dirs: Vec<f64>) -> SpectrumResult<Self> {
        if freqs.len() < 2 {
            return Err(SpectrumError::InvalidGrid(format!(
                "need at least 2 frequencies, got {}",
                freqs.len()
            )));
        }
        if dirs.is_empty() {
            return Err(SpectrumError::InvalidGrid("no directions".to_string()));
        }
        if freqs.len() > u16::MAX as usize || dirs.len() > u16::MAX as usize {
            return Err(SpectrumError::InvalidGrid(format!(
                "axis too long: {} frequencies, {} directions",
                freqs.len(),
                dirs.len()
            )));
        }
        if freqs[0] <= 0.0 || freqs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SpectrumError::InvalidGrid(
                "frequencies must be positive and strictly increasing".to_string(),
            ));
        }

        let dfreqs = band_ratios(&freqs);
        Ok(Self {
            freqs,
            dfreqs,
            dirs,
        })
    }

    pub fn nfreqs(&self) -> usize {
        self.freqs.len()
    }

    pub fn ndirs(&self) -> usize {
        self.dirs.len()
    }

    /// Number of energy values in one record (`ndirs * nfreqs`).
    pub fn size(&self) -> usize {
        self.freqs.len() * self.dirs.len()
    }

    /// Band centre frequencies in Hz.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// Ratio of each band's frequency to the next one up.
    pub fn dfreqs(&self) -> &[f64] {
        &self.dfreqs
    }

    /// Direction bins in radians.
    pub fn dirs(&self) -> &[f64] {
        &self.dirs
    }
}

fn band_ratios(freqs: &[f64]) -> Vec<f64> {
    let mut ratios: Vec<f64> = freqs.windows(2).map(|w| w[1] / w[0]).collect();
    if let Some(&last) = ratios.last() {
        ratios.push(last);
    }
    ratios
}
