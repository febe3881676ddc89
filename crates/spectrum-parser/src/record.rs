//! Spectrum records and the significant wave height derivation.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::f64::consts::PI;

use crate::error::{SpectrumError, SpectrumResult};
use crate::grid::Grid;

/// Station metadata carried by every record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSummary {
    /// POSIX timestamp of the record (seconds)
    pub record_time: i64,
    pub station_id: String,
    /// Latitude (degrees)
    pub lat: f64,
    /// Longitude (degrees)
    pub lon: f64,
    /// Water depth (m)
    pub depth: f64,
    /// Wind speed at 10m (m/s)
    pub wind_speed: f64,
    /// Wind direction (degrees)
    pub wind_dir: f64,
    /// Current speed (m/s)
    pub current_speed: f64,
    /// Current direction (degrees)
    pub current_dir: f64,
}

/// One timestamped spectrum observation.
///
/// Energy density is stored direction-major: row `d` holds the `nfreqs`
/// values of direction bin `d`. The record borrows the [`Grid`] of the file
/// it came from.
#[derive(Debug, Clone)]
pub struct SpectrumRecord<'g> {
    pub record_time: i64,
    pub station_id: String,
    pub lat: f64,
    pub lon: f64,
    pub depth: f64,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub current_speed: f64,
    pub current_dir: f64,
    energy: Vec<f64>,
    grid: &'g Grid,
}

impl<'g> SpectrumRecord<'g> {
    /// Attach an energy block to a parsed summary.
    ///
    /// `energy` must hold exactly `grid.size()` values in direction-major
    /// order.
    pub fn new(summary: RecordSummary, energy: Vec<f64>, grid: &'g Grid) -> SpectrumResult<Self> {
        if energy.len() != grid.size() {
            return Err(SpectrumError::RecordCount {
                expected: grid.size(),
                actual: energy.len(),
            });
        }

        let RecordSummary {
            record_time,
            station_id,
            lat,
            lon,
            depth,
            wind_speed,
            wind_dir,
            current_speed,
            current_dir,
        } = summary;

        Ok(Self {
            record_time,
            station_id,
            lat,
            lon,
            depth,
            wind_speed,
            wind_dir,
            current_speed,
            current_dir,
            energy,
            grid,
        })
    }

    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    /// Flat direction-major energy values.
    pub fn energy(&self) -> &[f64] {
        &self.energy
    }

    /// Energy values of a single direction bin, one per frequency.
    pub fn direction_row(&self, dir: usize) -> Option<&[f64]> {
        self.energy.chunks_exact(self.grid.nfreqs()).nth(dir)
    }

    /// Iterate over the direction rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.energy.chunks_exact(self.grid.nfreqs())
    }

    /// Energy density at a direction/frequency bin.
    pub fn energy_at(&self, dir: usize, freq: usize) -> Option<f64> {
        if freq >= self.grid.nfreqs() {
            return None;
        }
        self.energy.get(dir * self.grid.nfreqs() + freq).copied()
    }

    /// Record time as a UTC datetime.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.record_time, 0).single()
    }

    /// Record time in the local timezone (the zone artifact names use).
    pub fn local_datetime(&self) -> Option<DateTime<Local>> {
        Local.timestamp_opt(self.record_time, 0).earliest()
    }

    /// Energy integrated over direction, one value per frequency band.
    ///
    /// Rows are summed in direction order before scaling by the bin width.
    pub fn direction_integral(&self) -> Vec<f64> {
        let ndirs = self.grid.ndirs() as f64;
        let mut integral = vec![0.0; self.grid.nfreqs()];
        for row in self.rows() {
            for (acc, value) in integral.iter_mut().zip(row) {
                *acc += value;
            }
        }
        for value in integral.iter_mut() {
            *value = *value * 2.0 * PI / ndirs;
        }
        integral
    }

    /// Significant wave height in metres, `4 * sqrt(E)`.
    ///
    /// E is the spectrum integral (NDBC "Nondirectional and Directional Wave
    /// Data Analysis Procedures", sec 3.2.11): the direction integral weighted
    /// by each band's width, the top band counted at half width, plus a tail
    /// term for energy above the highest resolved frequency. The summation
    /// order is fixed so results are bit-for-bit reproducible.
    pub fn hs(&self) -> f64 {
        let freqs = self.grid.freqs();
        let dfreqs = self.grid.dfreqs();
        let last = freqs.len() - 1;

        let dir_integral = self.direction_integral();

        let mut energy = 0.0;
        for (i, (&f, &df)) in freqs.iter().zip(dfreqs).enumerate() {
            let mut bandwidth = 0.5 * (df - 1.0 / df) * f;
            if i == last {
                bandwidth *= 0.5;
            }
            energy += dir_integral[i] * bandwidth;
        }

        let tail = 0.25 * freqs[last];
        energy += tail * dir_integral[last];

        4.0 * energy.sqrt()
    }
}
