//! Raw CSV extraction.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Result of a raw extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExtract {
    /// Extracted rows. Every field of the schema holds `Utf8` or `Null`.
    pub dataset: DataSet,
    /// Number of lines skipped because their field count did not match the header.
    pub skipped_lines: usize,
}

/// Read a CSV file into an all-text [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers; surrounding whitespace in header names is ignored.
/// - Headers must contain the source header of every schema field (order can differ).
/// - Values are kept as text. Empty cells become [`Value::Null`].
/// - Lines whose field count differs from the header are skipped with a warning.
pub fn read_raw_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> PipelineResult<RawExtract> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening csv source");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    read_raw_csv_from_reader(&mut rdr, schema)
}

/// Read CSV data from an existing CSV reader.
///
/// The reader should be built with `flexible(true)`; otherwise short or long lines surface as
/// [`PipelineError::Csv`] instead of being skipped.
pub fn read_raw_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> PipelineResult<RawExtract> {
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_owned()).collect();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h == field.source_header()) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(PipelineError::SchemaMismatch {
                    message: format!(
                        "missing required column '{header}'. headers={headers:?}",
                        header = field.source_header(),
                    ),
                });
            }
        }
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut skipped_lines = 0;
    for result in rdr.records() {
        let record = result?;

        if record.len() != headers.len() {
            skipped_lines += 1;
            warn!(
                line = record.position().map(|p| p.line()).unwrap_or_default(),
                expected = headers.len(),
                found = record.len(),
                "skipping malformed line"
            );
            continue;
        }

        let row = col_idxs
            .iter()
            .map(|&idx| match record.get(idx) {
                Some(raw) if !raw.is_empty() => Value::Utf8(raw.to_owned()),
                _ => Value::Null,
            })
            .collect();
        rows.push(row);
    }

    let mut text_schema = schema.clone();
    for field in &mut text_schema.fields {
        field.data_type = DataType::Utf8;
    }

    debug!(rows = rows.len(), skipped_lines, "csv extraction finished");
    Ok(RawExtract {
        dataset: DataSet::new(text_schema, rows),
        skipped_lines,
    })
}
