//! Parsers for the recommender's input files.
//!
//! - `*.npy`: dense score matrices in NumPy's binary array format
//! - `interactions*.csv`: `u,i,t` interaction log
//! - `seq_pred.csv`: `user_id,recommendation` with a list literal per user
//! - submission CSV: `user_id,recommendation` with space-separated item ids
//!
//! Each file parser has a `*_str` / `*_bytes` twin that works on in-memory
//! content, which is what the tests exercise.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::StringRecord;
use ndarray::{Array2, ShapeBuilder};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

// =============================================================================
// File helpers
// =============================================================================

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = read_bytes(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// =============================================================================
// NumPy .npy score matrices
// =============================================================================

/// Element types we accept for score matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F64 { big_endian: bool },
    F32 { big_endian: bool },
}

impl Dtype {
    fn parse(descr: &str, file: &str) -> Result<Self> {
        match descr {
            "<f8" => Ok(Dtype::F64 { big_endian: false }),
            ">f8" => Ok(Dtype::F64 { big_endian: true }),
            "<f4" => Ok(Dtype::F32 { big_endian: false }),
            ">f4" => Ok(Dtype::F32 { big_endian: true }),
            other => Err(DataLoadError::UnsupportedFormat {
                file: file.to_string(),
                reason: format!("dtype '{}' is not a float array", other),
            }),
        }
    }

    fn size(self) -> usize {
        match self {
            Dtype::F64 { .. } => 8,
            Dtype::F32 { .. } => 4,
        }
    }

    fn decode(self, chunk: &[u8]) -> f64 {
        match self {
            Dtype::F64 { big_endian } => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(chunk);
                if big_endian {
                    f64::from_be_bytes(buf)
                } else {
                    f64::from_le_bytes(buf)
                }
            }
            Dtype::F32 { big_endian } => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(chunk);
                let value = if big_endian {
                    f32::from_be_bytes(buf)
                } else {
                    f32::from_le_bytes(buf)
                };
                value as f64
            }
        }
    }
}

/// Load a score matrix from a `.npy` file
pub fn parse_score_matrix(path: &Path) -> Result<ScoreMatrix> {
    let bytes = read_bytes(path)?;
    parse_npy_bytes(&bytes, &display_name(path))
}

/// Decode an in-memory `.npy` payload holding a 2-D float array
pub fn parse_npy_bytes(bytes: &[u8], file: &str) -> Result<ScoreMatrix> {
    let unsupported = |reason: String| DataLoadError::UnsupportedFormat {
        file: file.to_string(),
        reason,
    };

    if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
        return Err(unsupported("missing NPY magic string".to_string()));
    }

    // Version 1.0 stores the header length as u16, 2.0 and 3.0 as u32
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(unsupported("truncated header".to_string()));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        major => return Err(unsupported(format!("format version {} is unknown", major))),
    };

    let header_end = header_start + header_len;
    if bytes.len() < header_end {
        return Err(unsupported("truncated header".to_string()));
    }
    let header = std::str::from_utf8(&bytes[header_start..header_end])
        .map_err(|e| unsupported(format!("header is not text: {}", e)))?;

    let descr = header_quoted_value(header, "descr")
        .ok_or_else(|| unsupported("header has no 'descr'".to_string()))?;
    let fortran_order = header_bool_value(header, "fortran_order")
        .ok_or_else(|| unsupported("header has no 'fortran_order'".to_string()))?;
    let shape = header_shape(header)
        .ok_or_else(|| unsupported("header has no readable 'shape'".to_string()))?;

    let (n_users, n_items) = match shape.as_slice() {
        &[rows, cols] => (rows, cols),
        dims => {
            return Err(unsupported(format!(
                "expected a 2-D array, found {} dimensions",
                dims.len()
            )));
        }
    };

    let dtype = Dtype::parse(descr, file)?;
    let expected = n_users
        .checked_mul(n_items)
        .and_then(|n| n.checked_mul(dtype.size()))
        .ok_or_else(|| {
            unsupported(format!("shape ({}, {}) is too large", n_users, n_items))
        })?;
    let body = &bytes[header_end..];
    if body.len() < expected {
        return Err(unsupported(format!(
            "data section holds {} bytes, shape needs {}",
            body.len(),
            expected
        )));
    }

    let values: Vec<f64> = body[..expected]
        .chunks_exact(dtype.size())
        .map(|chunk| dtype.decode(chunk))
        .collect();

    let array = if fortran_order {
        Array2::from_shape_vec((n_users, n_items).f(), values)
    } else {
        Array2::from_shape_vec((n_users, n_items), values)
    }
    .map_err(|e| unsupported(e.to_string()))?;

    Ok(ScoreMatrix::from_array(
        array.as_standard_layout().into_owned(),
    ))
}

/// Text following `'key':` in the header dict
fn header_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let quoted = format!("'{}'", key);
    let start = header.find(&quoted)? + quoted.len();
    let rest = header[start..].trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

fn header_quoted_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let rest = header_value(header, key)?.strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

fn header_bool_value(header: &str, key: &str) -> Option<bool> {
    let rest = header_value(header, key)?;
    if rest.starts_with("True") {
        Some(true)
    } else if rest.starts_with("False") {
        Some(false)
    } else {
        None
    }
}

fn header_shape(header: &str) -> Option<Vec<usize>> {
    let rest = header_value(header, "shape")?.strip_prefix('(')?;
    let end = rest.find(')')?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| dim.parse().ok())
        .collect()
}

// =============================================================================
// CSV helpers
// =============================================================================

/// Reader over in-memory CSV with a header row and trimmed fields.
///
/// The `csv` reader strips a leading UTF-8 BOM, skips blank lines and keeps
/// newlines inside quoted fields.
fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn csv_error(err: csv::Error, file: &str) -> DataLoadError {
    let line = err.position().map_or(0, |pos| pos.line() as usize);
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => DataLoadError::FieldCountMismatch {
            expected: *expected_len as usize,
            found: *len as usize,
            line,
        },
        _ => DataLoadError::ParseError {
            file: file.to_string(),
            line,
            reason: err.to_string(),
        },
    }
}

/// Column positions resolved from a CSV header row
struct CsvHeader {
    file: String,
    columns: StringRecord,
}

impl CsvHeader {
    fn read(reader: &mut csv::Reader<&[u8]>, file: &str) -> Result<Self> {
        let columns = reader.headers().map_err(|e| csv_error(e, file))?.clone();
        Ok(Self {
            file: file.to_string(),
            columns,
        })
    }

    fn index_of(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
    }
}

/// Data records after the header as `(line number, record)`
fn data_rows<'a>(
    reader: csv::Reader<&'a [u8]>,
    file: &'a str,
) -> impl Iterator<Item = Result<(usize, StringRecord)>> + 'a {
    reader.into_records().map(move |record| {
        let record = record.map_err(|e| csv_error(e, file))?;
        let line_no = record.position().map_or(0, |pos| pos.line() as usize);
        Ok((line_no, record))
    })
}

fn parse_field<T>(record: &StringRecord, col: usize, file: &str, line: usize, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = record.get(col).unwrap_or_default();
    value.parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

// =============================================================================
// Interaction log
// =============================================================================

/// Parse an interaction log with columns `u`, `i`, `t`
pub fn parse_interactions(path: &Path) -> Result<Vec<Interaction>> {
    let content = read_text(path)?;
    parse_interactions_str(&content, &display_name(path))
}

pub fn parse_interactions_str(content: &str, file: &str) -> Result<Vec<Interaction>> {
    let mut reader = csv_reader(content);
    let header = CsvHeader::read(&mut reader, file)?;
    let user_col = header.index_of("u")?;
    let item_col = header.index_of("i")?;
    let time_col = header.index_of("t")?;

    let mut interactions = Vec::new();
    for row in data_rows(reader, file) {
        let (line_no, record) = row?;
        interactions.push(Interaction {
            user_id: parse_field(&record, user_col, file, line_no, "user id")?,
            item_id: parse_field(&record, item_col, file, line_no, "item id")?,
            timestamp: parse_field(&record, time_col, file, line_no, "timestamp")?,
        });
    }
    Ok(interactions)
}

// =============================================================================
// Sequence model predictions
// =============================================================================

/// Parse the sequence model output (`user_id`, `recommendation` list literal)
pub fn parse_sequence_predictions(path: &Path) -> Result<SequencePredictions> {
    let content = read_text(path)?;
    parse_sequence_predictions_str(&content, &display_name(path))
}

pub fn parse_sequence_predictions_str(content: &str, file: &str) -> Result<SequencePredictions> {
    let mut reader = csv_reader(content);
    let header = CsvHeader::read(&mut reader, file)?;
    let user_col = header.index_of("user_id")?;
    let list_col = header.index_of("recommendation")?;

    let mut predictions = SequencePredictions::new();
    for row in data_rows(reader, file) {
        let (line_no, record) = row?;
        let user_id = parse_field(&record, user_col, file, line_no, "user_id")?;
        // "[12, 7, 3]" is valid JSON, so serde_json reads the list literal
        let literal = record.get(list_col).unwrap_or_default();
        let items: Vec<ItemId> =
            serde_json::from_str(literal).map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: format!("Invalid recommendation list: {}", e),
            })?;
        predictions.insert(user_id, items);
    }
    Ok(predictions)
}

// =============================================================================
// Submission files
// =============================================================================

/// Parse a submission file (`user_id`, space-separated `recommendation`)
pub fn parse_submission(path: &Path) -> Result<Vec<SubmissionRow>> {
    let content = read_text(path)?;
    parse_submission_str(&content, &display_name(path))
}

pub fn parse_submission_str(content: &str, file: &str) -> Result<Vec<SubmissionRow>> {
    let mut reader = csv_reader(content);
    let header = CsvHeader::read(&mut reader, file)?;
    let user_col = header.index_of("user_id")?;
    let list_col = header.index_of("recommendation")?;

    let mut rows = Vec::new();
    for row in data_rows(reader, file) {
        let (line_no, record) = row?;
        rows.push(SubmissionRow {
            user_id: parse_field(&record, user_col, file, line_no, "user_id")?,
            recommendation: record.get(list_col).unwrap_or_default().to_string(),
        });
    }
    Ok(rows)
}
