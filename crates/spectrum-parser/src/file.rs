//! Spectrum file handle and the lazy record stream.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::binary::BinaryDecoder;
use crate::error::SpectrumResult;
use crate::grid::Grid;
use crate::record::SpectrumRecord;
use crate::text::TextDecoder;

/// Wire format of a spectrum stream. Chosen by the caller, never sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectrumFormat {
    /// Indentation-delimited WAVEWATCH III text output
    #[default]
    Text,
    /// Compact little-endian binary
    Binary,
}

/// Station identity carried in a binary file header.
#[derive(Debug, Clone, PartialEq)]
pub struct StationInfo {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

enum Decoder<R> {
    Text(TextDecoder<R>),
    Binary(BinaryDecoder<R>, StationInfo),
}

/// An open spectrum stream whose header has been parsed.
///
/// Records are pulled one at a time through [`SpectrumFile::records`]. The
/// stream is forward-only: a record that has been yielded is gone, and after
/// the end of data (or the first error) no further records are produced. To
/// read the records again, open the source again.
pub struct SpectrumFile<R> {
    decoder: Decoder<R>,
    grid: Grid,
    npoints: Option<u32>,
    finished: bool,
}

impl SpectrumFile<BufReader<File>> {
    /// Open a spectrum file from disk.
    pub fn open<P: AsRef<Path>>(path: P, format: SpectrumFormat) -> SpectrumResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), ?format, "Opening spectrum file");
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), format)
    }
}

impl<R: BufRead> SpectrumFile<R> {
    /// Wrap a reader and parse the header.
    pub fn from_reader(reader: R, format: SpectrumFormat) -> SpectrumResult<Self> {
        match format {
            SpectrumFormat::Text => {
                let mut decoder = TextDecoder::new(reader);
                let (grid, counts) = decoder.read_header()?;
                Ok(Self {
                    decoder: Decoder::Text(decoder),
                    grid,
                    npoints: Some(counts.npoints),
                    finished: false,
                })
            }
            SpectrumFormat::Binary => {
                let mut decoder = BinaryDecoder::new(reader);
                let (grid, station) = decoder.read_header()?;
                Ok(Self {
                    decoder: Decoder::Binary(decoder, station),
                    grid,
                    npoints: None,
                    finished: false,
                })
            }
        }
    }

    pub fn format(&self) -> SpectrumFormat {
        match self.decoder {
            Decoder::Text(_) => SpectrumFormat::Text,
            Decoder::Binary(..) => SpectrumFormat::Binary,
        }
    }

    /// The grid shared by every record of this file.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Point count declared by a text header.
    pub fn npoints(&self) -> Option<u32> {
        self.npoints
    }

    /// Station from the binary header. Text files name the station per record.
    pub fn station(&self) -> Option<&StationInfo> {
        match &self.decoder {
            Decoder::Binary(_, station) => Some(station),
            Decoder::Text(_) => None,
        }
    }

    /// Stream the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            decoder: &mut self.decoder,
            grid: &self.grid,
            finished: &mut self.finished,
        }
    }

    /// Collect every remaining record, stopping at the first error.
    pub fn read_all(&mut self) -> SpectrumResult<Vec<SpectrumRecord<'_>>> {
        self.records().collect()
    }
}

/// Iterator over the records of a [`SpectrumFile`].
pub struct Records<'a, R> {
    decoder: &'a mut Decoder<R>,
    grid: &'a Grid,
    finished: &'a mut bool,
}

impl<'a, R: BufRead> Iterator for Records<'a, R> {
    type Item = SpectrumResult<SpectrumRecord<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if *self.finished {
            return None;
        }

        let grid: &'a Grid = self.grid;
        let result = match self.decoder {
            Decoder::Text(decoder) => decoder.read_record(grid),
            Decoder::Binary(decoder, station) => decoder.read_record(grid, station),
        };

        match result {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                *self.finished = true;
                None
            }
            Err(e) => {
                *self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<'a, R: BufRead> std::iter::FusedIterator for Records<'a, R> {}
