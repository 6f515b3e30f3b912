//! Fixed-layout binary records for windows and sources.
//!
//! All fields are big-endian.
//!
//! # Source record (57 bytes)
//!
//! | Offset | Type | Field |
//! |--------|------|-------|
//! | 0  | f64 | integrated flux |
//! | 8  | f64 | peak flux |
//! | 16 | f64 | flux ratio |
//! | 24 | f64 | major eigenvalue |
//! | 32 | f64 | minor eigenvalue |
//! | 40 | f64 | orientation |
//! | 48 | u8  | type ordinal |
//! | 49 | f64 | observation time |
//!
//! # Window record (46-byte header + 4 bytes per sample)
//!
//! | Offset | Type | Field |
//! |--------|------|-------|
//! | 0  | u8  | field of view |
//! | 1  | u8  | CCD row |
//! | 2  | u8  | CCD strip |
//! | 3  | i16 | AC window coordinate |
//! | 5  | u8  | gate |
//! | 6  | i64 | transit id |
//! | 14 | f64 | observation time |
//! | 22 | i32 | AL samples |
//! | 26 | i32 | AC samples |
//! | 30 | i32 | AL pixels per sample |
//! | 34 | i32 | AC pixels per sample |
//! | 38 | f64 | integration time |
//! | 46 | f32 × AL × AC | samples, AC fastest |

use crate::source::{Source, SourceType};
use crate::window::Window;
use ndarray::Array2;
use std::fmt;
use thiserror::Error;

/// Size of an encoded source record
pub const SOURCE_RECORD_LEN: usize = 57;

/// Size of an encoded window header, before the samples
pub const WINDOW_HEADER_LEN: usize = 46;

/// Errors decoding or encoding records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("truncated {record} record: field `{field}` at offset {offset} needs {expected} bytes, {available} available")]
    Truncated {
        record: &'static str,
        field: &'static str,
        offset: usize,
        expected: usize,
        available: usize,
    },

    #[error("invalid window dimension {field}={value}")]
    InvalidDimension { field: &'static str, value: i64 },

    #[error("unknown source type ordinal {0}")]
    UnknownSourceType(u8),
}

/// Decoded contents of a source record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRecord {
    pub flux: f64,
    pub peak_flux: f64,
    pub flux_ratio: f64,
    pub major_eigenvalue: f64,
    pub minor_eigenvalue: f64,
    pub orientation: f64,
    pub source_type: SourceType,
    pub obs_time: f64,
}

impl From<&Source> for SourceRecord {
    fn from(source: &Source) -> Self {
        Self {
            flux: source.flux,
            peak_flux: source.peak_flux,
            flux_ratio: source.flux_ratio,
            major_eigenvalue: source.eigenvalues.major,
            minor_eigenvalue: source.eigenvalues.minor,
            orientation: source.orientation,
            source_type: source.source_type,
            obs_time: source.obs_time,
        }
    }
}

/// Tab-separated statistics line, same columns as a [`Source`]
impl fmt::Display for SourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.flux,
            self.peak_flux,
            self.flux_ratio,
            self.major_eigenvalue,
            self.minor_eigenvalue,
            self.orientation,
            self.source_type
        )
    }
}

impl SourceRecord {
    /// Append the 57-byte encoding to `buf`
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.flux.to_be_bytes());
        buf.extend_from_slice(&self.peak_flux.to_be_bytes());
        buf.extend_from_slice(&self.flux_ratio.to_be_bytes());
        buf.extend_from_slice(&self.major_eigenvalue.to_be_bytes());
        buf.extend_from_slice(&self.minor_eigenvalue.to_be_bytes());
        buf.extend_from_slice(&self.orientation.to_be_bytes());
        buf.push(self.source_type.ordinal());
        buf.extend_from_slice(&self.obs_time.to_be_bytes());
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self, RecordError> {
        let flux = reader.f64("flux")?;
        let peak_flux = reader.f64("peak_flux")?;
        let flux_ratio = reader.f64("flux_ratio")?;
        let major_eigenvalue = reader.f64("major_eigenvalue")?;
        let minor_eigenvalue = reader.f64("minor_eigenvalue")?;
        let orientation = reader.f64("orientation")?;
        let ordinal = reader.u8("source_type")?;
        let source_type = SourceType::from_ordinal(ordinal).ok_or(RecordError::UnknownSourceType(ordinal))?;
        let obs_time = reader.f64("obs_time")?;

        Ok(Self {
            flux,
            peak_flux,
            flux_ratio,
            major_eigenvalue,
            minor_eigenvalue,
            orientation,
            source_type,
            obs_time,
        })
    }
}

/// Big-endian cursor that reports which field ran out of data
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    record: &'static str,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], record: &'static str) -> Self {
        Self { data, pos: 0, record }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], RecordError> {
        let available = self.data.len() - self.pos;
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .ok_or(RecordError::Truncated {
                record: self.record,
                field,
                offset: self.pos,
                expected: N,
                available,
            })?;
        self.pos += N;
        Ok(bytes)
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, RecordError> {
        Ok(self.take::<1>(field)?[0])
    }

    fn i16(&mut self, field: &'static str) -> Result<i16, RecordError> {
        Ok(i16::from_be_bytes(self.take(field)?))
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, RecordError> {
        Ok(i32::from_be_bytes(self.take(field)?))
    }

    fn i64(&mut self, field: &'static str) -> Result<i64, RecordError> {
        Ok(i64::from_be_bytes(self.take(field)?))
    }

    fn f32(&mut self, field: &'static str) -> Result<f32, RecordError> {
        Ok(f32::from_be_bytes(self.take(field)?))
    }

    fn f64(&mut self, field: &'static str) -> Result<f64, RecordError> {
        Ok(f64::from_be_bytes(self.take(field)?))
    }

    fn dimension(&mut self, field: &'static str) -> Result<usize, RecordError> {
        let value = self.i32(field)?;
        usize::try_from(value).map_err(|_| RecordError::InvalidDimension {
            field,
            value: value as i64,
        })
    }
}

/// Append the 57-byte record of a source to `buf`
pub fn encode_source(source: &Source, buf: &mut Vec<u8>) {
    SourceRecord::from(source).encode(buf);
}

/// Decode exactly one source record
pub fn decode_source(bytes: &[u8]) -> Result<SourceRecord, RecordError> {
    SourceRecord::read(&mut Reader::new(bytes, "source"))
}

/// Decode a stream of concatenated source records
pub fn decode_sources(bytes: &[u8]) -> Result<Vec<SourceRecord>, RecordError> {
    let mut reader = Reader::new(bytes, "source");
    let mut records = Vec::with_capacity(bytes.len() / SOURCE_RECORD_LEN);
    while !reader.is_empty() {
        records.push(SourceRecord::read(&mut reader)?);
    }
    Ok(records)
}

fn dimension_to_i32(field: &'static str, value: usize) -> Result<i32, RecordError> {
    i32::try_from(value).map_err(|_| RecordError::InvalidDimension {
        field,
        value: i64::try_from(value).unwrap_or(i64::MAX),
    })
}

/// Append the record of a window (header and samples) to `buf`
///
/// Attached sources are not part of the window record.
pub fn encode_window(window: &Window, buf: &mut Vec<u8>) -> Result<(), RecordError> {
    let (al, ac) = window.samples.dim();
    let al_samples = dimension_to_i32("al_samples", al)?;
    let ac_samples = dimension_to_i32("ac_samples", ac)?;
    let al_sample_size = dimension_to_i32("al_sample_size", window.al_sample_size)?;
    let ac_sample_size = dimension_to_i32("ac_sample_size", window.ac_sample_size)?;

    buf.reserve(WINDOW_HEADER_LEN + 4 * al * ac);
    buf.push(window.fov);
    buf.push(window.ccd_row);
    buf.push(window.ccd_strip);
    buf.extend_from_slice(&window.ac_window_coord.to_be_bytes());
    buf.push(window.gate);
    buf.extend_from_slice(&window.transit_id.to_be_bytes());
    buf.extend_from_slice(&window.obs_time.to_be_bytes());
    buf.extend_from_slice(&al_samples.to_be_bytes());
    buf.extend_from_slice(&ac_samples.to_be_bytes());
    buf.extend_from_slice(&al_sample_size.to_be_bytes());
    buf.extend_from_slice(&ac_sample_size.to_be_bytes());
    buf.extend_from_slice(&window.integration_time.to_be_bytes());
    for level in window.samples.iter() {
        buf.extend_from_slice(&level.to_be_bytes());
    }
    Ok(())
}

fn read_window(reader: &mut Reader<'_>) -> Result<Window, RecordError> {
    let fov = reader.u8("fov")?;
    let ccd_row = reader.u8("ccd_row")?;
    let ccd_strip = reader.u8("ccd_strip")?;
    let ac_window_coord = reader.i16("ac_window_coord")?;
    let gate = reader.u8("gate")?;
    let transit_id = reader.i64("transit_id")?;
    let obs_time = reader.f64("obs_time")?;
    let al_samples = reader.dimension("al_samples")?;
    let ac_samples = reader.dimension("ac_samples")?;
    let al_sample_size = reader.dimension("al_sample_size")?;
    let ac_sample_size = reader.dimension("ac_sample_size")?;
    let integration_time = reader.f64("integration_time")?;

    let count = al_samples * ac_samples;
    let mut levels = Vec::with_capacity(count.min(reader.data.len() / 4));
    for _ in 0..count {
        levels.push(reader.f32("samples")?);
    }
    let samples = Array2::from_shape_vec((al_samples, ac_samples), levels).map_err(|_| {
        RecordError::InvalidDimension {
            field: "samples",
            value: count as i64,
        }
    })?;

    Ok(Window {
        fov,
        ccd_row,
        ccd_strip,
        ac_window_coord,
        gate,
        transit_id,
        obs_time,
        integration_time,
        al_sample_size,
        ac_sample_size,
        samples,
        sources: Vec::new(),
    })
}

/// Decode exactly one window record
pub fn decode_window(bytes: &[u8]) -> Result<Window, RecordError> {
    read_window(&mut Reader::new(bytes, "window"))
}

/// Decode a stream of concatenated window records
pub fn decode_windows(bytes: &[u8]) -> Result<Vec<Window>, RecordError> {
    let mut reader = Reader::new(bytes, "window");
    let mut windows = Vec::new();
    while !reader.is_empty() {
        windows.push(read_window(&mut reader)?);
    }
    Ok(windows)
}
