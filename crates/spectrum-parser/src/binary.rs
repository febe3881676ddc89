//! Compact binary spectrum format.
//!
//! All multi-byte values are little-endian.
//!
//! | Block  | Value         | Type           | Unit | Count        |
//! |--------|---------------|----------------|------|--------------|
//! | Header | name length   | u8             |      | 1            |
//! |        | station name  | bytes          |      | name length  |
//! |        | latitude      | f32            | deg  | 1            |
//! |        | longitude     | f32            | deg  | 1            |
//! |        | n freqs       | u16            |      | 1            |
//! |        | freqs         | f32            | Hz   | n freqs      |
//! |        | n dirs        | u16            |      | 1            |
//! |        | directions    | f32            | rad  | n dirs       |
//! | Record | time          | u32            | s    | 1            |
//! |        | water depth   | f32            | m    | 1            |
//! |        | wind speed    | f32            | m/s  | 1            |
//! |        | wind dir      | f32            |      | 1            |
//! |        | current speed | f32            | m/s  | 1            |
//! |        | current dir   | f32            |      | 1            |
//! |        | spectrum      | u32 + f32 list |      | nf * nd      |

use bytes::Buf;
use std::io::{ErrorKind, Read};
use tracing::{debug, warn};

use crate::error::{SpectrumError, SpectrumResult};
use crate::file::StationInfo;
use crate::grid::Grid;
use crate::record::{RecordSummary, SpectrumRecord};

/// Size of the fixed part of a record (time + five floats).
const RECORD_PREFIX_LEN: usize = 24;

pub(crate) struct BinaryDecoder<R> {
    reader: R,
}

impl<R: Read> BinaryDecoder<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader }
    }

    pub(crate) fn read_header(&mut self) -> SpectrumResult<(Grid, StationInfo)> {
        let mut len = [0u8; 1];
        self.fill(&mut len, "station name length")?;
        let mut name = vec![0u8; len[0] as usize];
        self.fill(&mut name, "station name")?;
        let name = String::from_utf8_lossy(&name).trim().to_string();

        let mut location = [0u8; 8];
        self.fill(&mut location, "station location")?;
        let mut buf = &location[..];
        let lat = f64::from(buf.get_f32_le());
        let lon = f64::from(buf.get_f32_le());

        let nfreqs = self.read_u16("frequency count")? as usize;
        let freqs = self.read_f32_array(nfreqs, "frequencies")?;
        let ndirs = self.read_u16("direction count")? as usize;
        let dirs = self.read_f32_array(ndirs, "directions")?;

        debug!(station = %name, nfreqs, ndirs, "Parsed binary spectrum header");

        let grid = Grid::new(freqs, dirs)?;
        Ok((grid, StationInfo { name, lat, lon }))
    }

    pub(crate) fn read_record<'g>(
        &mut self,
        grid: &'g Grid,
        station: &StationInfo,
    ) -> SpectrumResult<Option<SpectrumRecord<'g>>> {
        let mut prefix = [0u8; RECORD_PREFIX_LEN];
        let got = self.read_up_to(&mut prefix)?;
        if got < RECORD_PREFIX_LEN {
            if got > 0 {
                warn!(
                    station = %station.name,
                    trailing_bytes = got,
                    "Discarding partial record at end of binary spectrum"
                );
            }
            return Ok(None);
        }

        let mut buf = &prefix[..];
        let record_time = i64::from(buf.get_u32_le());
        let depth = f64::from(buf.get_f32_le());
        let wind_speed = f64::from(buf.get_f32_le());
        let wind_dir = f64::from(buf.get_f32_le());
        let current_speed = f64::from(buf.get_f32_le());
        let current_dir = f64::from(buf.get_f32_le());

        let declared = self.read_u32("spectrum length")? as usize;
        if declared != grid.size() {
            return Err(SpectrumError::RecordCount {
                expected: grid.size(),
                actual: declared,
            });
        }
        let energy = self.read_f32_array(declared, "spectrum")?;

        let summary = RecordSummary {
            record_time,
            station_id: station.name.clone(),
            lat: station.lat,
            lon: station.lon,
            depth,
            wind_speed,
            wind_dir,
            current_speed,
            current_dir,
        };
        SpectrumRecord::new(summary, energy, grid).map(Some)
    }

    fn read_u16(&mut self, context: &'static str) -> SpectrumResult<u16> {
        let mut raw = [0u8; 2];
        self.fill(&mut raw, context)?;
        Ok(u16::from_le_bytes(raw))
    }

    fn read_u32(&mut self, context: &'static str) -> SpectrumResult<u32> {
        let mut raw = [0u8; 4];
        self.fill(&mut raw, context)?;
        Ok(u32::from_le_bytes(raw))
    }

    fn read_f32_array(&mut self, count: usize, context: &'static str) -> SpectrumResult<Vec<f64>> {
        let mut raw = vec![0u8; count * 4];
        self.fill(&mut raw, context)?;
        let mut buf = &raw[..];
        Ok((0..count).map(|_| f64::from(buf.get_f32_le())).collect())
    }

    /// Read exactly `buf.len()` bytes; running out is a corrupt stream.
    fn fill(&mut self, buf: &mut [u8], context: &'static str) -> SpectrumResult<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                SpectrumError::UnexpectedEndOfStream(context)
            } else {
                SpectrumError::Io(e)
            }
        })
    }

    /// Read as many bytes as are available, up to `buf.len()`.
    fn read_up_to(&mut self, buf: &mut [u8]) -> SpectrumResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}
