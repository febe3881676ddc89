//! Native WAVEWATCH III text spectrum format.
//!
//! ```text
//! 'WAVEWATCH III SPECTRA'     <nf>  <nd>  <np> '<grid name>'
//!  <freqs (Hz)> x nf                                 (indent 1)
//!   <directions (rad)> x nd                          (indent 2)
//! <YYYYMMDD HHMMSS>
//! '<station>'  <lat><lon> <depth> <u10> <u10 dir> <current> <current dir>
//!   <E(f, theta)> x nf*nd                            (indent 2)
//! ```
//!
//! The time/summary/energy triple repeats until the end of the file.

use nom::{
    bytes::complete::{tag, take_till1, take_while1},
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map_res, opt, recognize},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use std::io::BufRead;
use tracing::debug;

use crate::error::{SpectrumError, SpectrumResult};
use crate::grid::Grid;
use crate::lines::LineReader;
use crate::record::{RecordSummary, SpectrumRecord};
use crate::time::{local_timestamp, parse_record_time};

const HEADER_TAG: &str = "'WAVEWATCH III SPECTRA'";
const FREQ_INDENT: usize = 1;
const DATA_INDENT: usize = 2;

/// Counts declared on the first line of a text spectrum file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderCounts {
    pub nfreqs: u16,
    pub ndirs: u16,
    pub npoints: u32,
}

/// Station fields of a record summary line, before the time is attached.
#[derive(Debug, Clone, PartialEq)]
struct SummaryFields {
    station_id: String,
    lat: f64,
    lon: f64,
    depth: f64,
    wind_speed: f64,
    wind_dir: f64,
    current_speed: f64,
    current_dir: f64,
}

pub(crate) struct TextDecoder<R> {
    lines: LineReader<R>,
}

impl<R: BufRead> TextDecoder<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: LineReader::new(reader),
        }
    }

    /// Parse the header block: counts, frequencies and directions.
    pub(crate) fn read_header(&mut self) -> SpectrumResult<(Grid, HeaderCounts)> {
        let line = self.lines.next_line()?.unwrap_or_default();
        let parsed = header_line(line.trim()).map(|(_, counts)| counts).ok();
        let counts = match parsed {
            Some(counts) => counts,
            None => return Err(SpectrumError::HeaderFormat(line)),
        };

        let freqs = self.read_block(FREQ_INDENT)?;
        if freqs.len() != counts.nfreqs as usize {
            return Err(SpectrumError::HeaderCount {
                axis: "frequencies",
                expected: counts.nfreqs as usize,
                actual: freqs.len(),
            });
        }

        let dirs = self.read_block(DATA_INDENT)?;
        if dirs.len() != counts.ndirs as usize {
            return Err(SpectrumError::HeaderCount {
                axis: "directions",
                expected: counts.ndirs as usize,
                actual: dirs.len(),
            });
        }

        debug!(
            nfreqs = counts.nfreqs,
            ndirs = counts.ndirs,
            npoints = counts.npoints,
            "Parsed text spectrum header"
        );

        Ok((Grid::new(freqs, dirs)?, counts))
    }

    /// Parse the next record, `None` at a clean end of stream.
    pub(crate) fn read_record<'g>(
        &mut self,
        grid: &'g Grid,
    ) -> SpectrumResult<Option<SpectrumRecord<'g>>> {
        // Trailing blank lines after the last record are not a record.
        let time_line = loop {
            match self.lines.next_line()? {
                None => return Ok(None),
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => break line,
            }
        };

        let record_time = parse_record_time(&time_line)
            .and_then(|t| local_timestamp(&t))
            .ok_or_else(|| SpectrumError::RecordTime {
                line: self.lines.line_no(),
                text: time_line.clone(),
            })?;

        let summary_line = self
            .lines
            .next_line()?
            .ok_or(SpectrumError::UnexpectedEndOfStream("record summary"))?;
        let parsed = all_consuming(summary)(summary_line.trim())
            .map(|(_, fields)| fields)
            .ok();
        let fields = match parsed {
            Some(fields) => fields,
            None => {
                return Err(SpectrumError::RecordSummaryFormat {
                    line: self.lines.line_no(),
                    text: summary_line,
                })
            }
        };

        let energy = self.read_block(DATA_INDENT)?;
        if energy.len() != grid.size() {
            return Err(SpectrumError::RecordCount {
                expected: grid.size(),
                actual: energy.len(),
            });
        }

        let summary = RecordSummary {
            record_time,
            station_id: fields.station_id,
            lat: fields.lat,
            lon: fields.lon,
            depth: fields.depth,
            wind_speed: fields.wind_speed,
            wind_dir: fields.wind_dir,
            current_speed: fields.current_speed,
            current_dir: fields.current_dir,
        };
        SpectrumRecord::new(summary, energy, grid).map(Some)
    }

    /// Concatenate the floats of consecutive lines at exactly `indent` spaces.
    fn read_block(&mut self, indent: usize) -> SpectrumResult<Vec<f64>> {
        let mut values = Vec::new();
        while let Some(line) = self.lines.next_if_indent(indent)? {
            for token in line.split_whitespace() {
                let value = token
                    .parse::<f64>()
                    .map_err(|_| SpectrumError::InvalidNumber {
                        line: self.lines.line_no(),
                        token: token.to_string(),
                    })?;
                values.push(value);
            }
        }
        Ok(values)
    }
}

// ===== Line grammars =====

fn header_line(input: &str) -> IResult<&str, HeaderCounts> {
    let (input, _) = tag(HEADER_TAG)(input)?;
    let (input, nfreqs) = preceded(space1, map_res(digit1, |s: &str| s.parse::<u16>()))(input)?;
    let (input, ndirs) = preceded(space1, map_res(digit1, |s: &str| s.parse::<u16>()))(input)?;
    let (input, npoints) = preceded(space1, map_res(digit1, |s: &str| s.parse::<u32>()))(input)?;
    // Whatever follows the counts is the grid name; it is not used.
    Ok((
        input,
        HeaderCounts {
            nfreqs,
            ndirs,
            npoints,
        },
    ))
}

fn numeric(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_digit() || c == '.')(input)
}

fn unsigned(input: &str) -> IResult<&str, f64> {
    map_res(numeric, |s: &str| s.parse::<f64>())(input)
}

fn signed(input: &str) -> IResult<&str, f64> {
    map_res(recognize(pair(opt(char('-')), numeric)), |s: &str| {
        s.parse::<f64>()
    })(input)
}

/// Station id in single quotes, optionally space padded inside the quotes.
fn station_id(input: &str) -> IResult<&str, &str> {
    delimited(
        char('\''),
        terminated(take_till1(|c: char| c == ' ' || c == '\''), space0),
        char('\''),
    )(input)
}

fn summary(input: &str) -> IResult<&str, SummaryFields> {
    let (input, station) = station_id(input)?;
    let (input, lat) = preceded(space1, signed)(input)?;
    // A negative longitude may abut the latitude: `36.75-122.42`.
    let (input, lon) = preceded(space0, signed)(input)?;
    let (input, depth) = preceded(space1, unsigned)(input)?;
    let (input, wind_speed) = preceded(space1, unsigned)(input)?;
    let (input, wind_dir) = preceded(space1, unsigned)(input)?;
    let (input, current_speed) = preceded(space1, unsigned)(input)?;
    let (input, current_dir) = preceded(space1, unsigned)(input)?;

    Ok((
        input,
        SummaryFields {
            station_id: station.to_string(),
            lat,
            lon,
            depth,
            wind_speed,
            wind_dir,
            current_speed,
            current_dir,
        },
    ))
}
