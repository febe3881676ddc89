//! Synthetic spectrum generators.
//!
//! [`SyntheticSpectrum`] describes a small station time series and can
//! write it in both the text and the binary spectrum formats, so the same
//! logical records can be fed through either decoder.
//!
//! Location, wind and current values default to numbers that are exact in
//! `f32`, which keeps text/binary comparisons tight.

use chrono::{Local, TimeZone};

/// One record of a synthetic spectrum.
#[derive(Debug, Clone)]
pub struct SyntheticRecord {
    /// POSIX seconds
    pub time: u32,
    pub depth: f64,
    pub wind_speed: f64,
    pub wind_dir: f64,
    pub current_speed: f64,
    pub current_dir: f64,
    /// Direction-major energy values (`ndirs * nfreqs`)
    pub energy: Vec<f64>,
}

/// A station spectrum with a shared frequency/direction grid.
#[derive(Debug, Clone)]
pub struct SyntheticSpectrum {
    pub station: String,
    pub lat: f64,
    pub lon: f64,
    pub freqs: Vec<f64>,
    pub dirs: Vec<f64>,
    pub records: Vec<SyntheticRecord>,
}

/// 2020-01-15 00:00:00 UTC. Mid-January keeps local-time conversions clear
/// of DST transitions in any zone.
pub const BASE_TIME: u32 = 1_579_046_400;

impl SyntheticSpectrum {
    /// Build a spectrum with geometric frequencies (ratio 1.1 from 0.035 Hz),
    /// evenly spaced directions and `nrecords` hourly records.
    ///
    /// Each record's energy is `(record + 1) * (dir + 1) * (freq + 1) / 1024`.
    pub fn new(station: &str, nfreqs: usize, ndirs: usize, nrecords: usize) -> Self {
        let freqs = (0..nfreqs)
            .map(|i| 0.035 * 1.1_f64.powi(i as i32))
            .collect();
        let dirs = (0..ndirs)
            .map(|i| i as f64 * 2.0 * std::f64::consts::PI / ndirs as f64)
            .collect();

        let records = (0..nrecords)
            .map(|r| SyntheticRecord {
                time: BASE_TIME + 3600 * r as u32,
                depth: 2098.0,
                wind_speed: 6.25,
                wind_dir: 305.0,
                current_speed: 0.0,
                current_dir: 270.0,
                energy: (0..ndirs)
                    .flat_map(|d| {
                        (0..nfreqs).map(move |f| ((r + 1) * (d + 1) * (f + 1)) as f64 / 1024.0)
                    })
                    .collect(),
            })
            .collect();

        Self {
            station: station.to_string(),
            lat: 36.75,
            lon: -122.5,
            freqs,
            dirs,
            records,
        }
    }

    pub fn nfreqs(&self) -> usize {
        self.freqs.len()
    }

    pub fn ndirs(&self) -> usize {
        self.dirs.len()
    }

    /// Render the WAVEWATCH III text format.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "'WAVEWATCH III SPECTRA'     {}    {}     1 'spectral resolution for points'\n",
            self.nfreqs(),
            self.ndirs()
        );
        out.push_str(&indented_block(&self.freqs, 1, 8));
        out.push_str(&indented_block(&self.dirs, 2, 7));

        for record in &self.records {
            let local = Local
                .timestamp_opt(i64::from(record.time), 0)
                .earliest()
                .map(|dt| dt.format("%Y%m%d %H%M%S").to_string())
                .unwrap_or_default();
            out.push_str(&local);
            out.push('\n');
            out.push_str(&format!(
                "'{:<10}' {}{} {} {} {} {} {}\n",
                self.station,
                self.lat,
                self.lon,
                record.depth,
                record.wind_speed,
                record.wind_dir,
                record.current_speed,
                record.current_dir
            ));
            out.push_str(&indented_block(&record.energy, 2, 7));
        }
        out
    }

    /// Render the compact little-endian binary format.
    pub fn to_binary(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.station.len() as u8);
        out.extend_from_slice(self.station.as_bytes());
        out.extend_from_slice(&(self.lat as f32).to_le_bytes());
        out.extend_from_slice(&(self.lon as f32).to_le_bytes());

        out.extend_from_slice(&(self.nfreqs() as u16).to_le_bytes());
        for f in &self.freqs {
            out.extend_from_slice(&(*f as f32).to_le_bytes());
        }
        out.extend_from_slice(&(self.ndirs() as u16).to_le_bytes());
        for d in &self.dirs {
            out.extend_from_slice(&(*d as f32).to_le_bytes());
        }

        for record in &self.records {
            out.extend_from_slice(&record.time.to_le_bytes());
            for value in [
                record.depth,
                record.wind_speed,
                record.wind_dir,
                record.current_speed,
                record.current_dir,
            ] {
                out.extend_from_slice(&(value as f32).to_le_bytes());
            }
            out.extend_from_slice(&(record.energy.len() as u32).to_le_bytes());
            for e in &record.energy {
                out.extend_from_slice(&(*e as f32).to_le_bytes());
            }
        }
        out
    }
}

/// Lay values out `per_line` to a line, each line prefixed by `indent` spaces.
pub fn indented_block(values: &[f64], indent: usize, per_line: usize) -> String {
    let pad = " ".repeat(indent);
    values
        .chunks(per_line.max(1))
        .map(|chunk| {
            let line: Vec<String> = chunk.iter().map(|v| format!("{:E}", v)).collect();
            format!("{}{}\n", pad, line.join(" "))
        })
        .collect()
}
