//! Numeric column validation.
//!
//! Validation is split into two phases so the drop policy can be checked on its own:
//! [`validity_mask`] computes one flag per row, [`coerce_valid`] casts the values of the rows
//! that are kept.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Value};

/// Parse a single numeric cell. Surrounding whitespace is ignored; non-finite values are
/// rejected because they cannot be stored in a fixed-point column.
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Per-row validity of `column`: `true` when the value is a float or parses as one.
pub fn validity_mask(dataset: &DataSet, column: &str) -> PipelineResult<Vec<bool>> {
    let idx = column_index(dataset, column)?;
    Ok(dataset
        .column(idx)
        .map(|value| match value {
            Value::Float64(v) => v.is_finite(),
            Value::Utf8(s) => parse_float(s).is_some(),
            _ => false,
        })
        .collect())
}

/// Cast every value of `column` to [`Value::Float64`] and mark the field as `Float64`.
///
/// Rows must already have been filtered with [`validity_mask`]; values that still do not parse
/// are reported as a schema mismatch.
pub fn coerce_valid(dataset: &mut DataSet, column: &str) -> PipelineResult<()> {
    let idx = column_index(dataset, column)?;
    for row in &mut dataset.rows {
        let cell = &mut row[idx];
        let parsed = match cell {
            Value::Float64(v) => Some(*v),
            Value::Utf8(s) => parse_float(s),
            _ => None,
        };
        match parsed {
            Some(v) => *cell = Value::Float64(v),
            None => {
                return Err(PipelineError::SchemaMismatch {
                    message: format!(
                        "column '{column}' holds non-numeric value '{}' after filtering",
                        cell.to_raw_string()
                    ),
                });
            }
        }
    }
    dataset.set_field_type(idx, DataType::Float64);
    Ok(())
}

pub(crate) fn column_index(dataset: &DataSet, column: &str) -> PipelineResult<usize> {
    dataset
        .schema
        .index_of(column)
        .ok_or_else(|| PipelineError::SchemaMismatch {
            message: format!("missing required column '{column}'"),
        })
}
