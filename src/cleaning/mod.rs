//! Normalization of raw sighting rows into typed values.
//!
//! [`normalize`] applies, in order:
//!
//! 1. `datetime`: `24:00` repair and parsing into [`crate::types::Value::Timestamp`]
//! 2. a stable sort of all rows by the canonical `datetime`
//! 3. `date_posted`: parsing into [`crate::types::Value::Date`]
//! 4. `duration_seconds`, `latitude`, `longitude`: validate-then-filter, then cast to `Float64`
//!
//! Failures in steps 1 and 3 abort the run. Failures in step 4 drop only the offending row.

pub mod datetime;
pub mod numeric;

use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::sighting::SightingColumn;
use crate::types::{DataSet, DataType, Value};

use self::numeric::column_index;

/// A row removed because one of its numeric fields did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDrop {
    /// 1-based position of the record in the extracted source.
    pub record: usize,
    /// Column that failed validation.
    pub column: String,
    /// The offending raw value (empty for a missing value).
    pub raw: String,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    /// Typed rows, ordered by `datetime`.
    pub dataset: DataSet,
    /// Rows dropped by numeric validation, in the order they were dropped.
    pub dropped: Vec<RowDrop>,
}

/// Normalize an extracted sighting dataset.
///
/// `source` identifies the input (usually the file path) in diagnostics.
pub fn normalize(mut dataset: DataSet, source: &str) -> PipelineResult<CleanOutcome> {
    info!(source, rows = dataset.row_count(), "normalizing dataset");

    // Source position of every row, carried through the sort and the filters.
    let mut records: Vec<usize> = (1..=dataset.row_count()).collect();

    canonicalize_datetimes(&mut dataset, &records)?;
    sort_by_datetime(&mut dataset, &mut records)?;
    parse_dates_posted(&mut dataset, &records)?;

    let mut dropped = Vec::new();
    for column in SightingColumn::NUMERIC {
        dropped.extend(filter_numeric(&mut dataset, &mut records, column.name(), source)?);
    }

    info!(
        source,
        rows = dataset.row_count(),
        dropped = dropped.len(),
        "normalization finished"
    );
    Ok(CleanOutcome { dataset, dropped })
}

fn canonicalize_datetimes(dataset: &mut DataSet, records: &[usize]) -> PipelineResult<()> {
    let column = SightingColumn::Datetime.name();
    let idx = column_index(dataset, column)?;
    for (row, &record) in dataset.rows.iter_mut().zip(records) {
        let parsed = match &row[idx] {
            Value::Timestamp(ts) => *ts,
            Value::Utf8(raw) => datetime::repair_datetime(raw).map_err(|message| PipelineError::Parse {
                row: record,
                column: column.to_owned(),
                raw: raw.clone(),
                message,
            })?,
            other => return Err(missing_value(record, column, other)),
        };
        row[idx] = Value::Timestamp(parsed);
    }
    dataset.set_field_type(idx, DataType::Timestamp);
    Ok(())
}

fn sort_by_datetime(dataset: &mut DataSet, records: &mut Vec<usize>) -> PipelineResult<()> {
    let idx = column_index(dataset, SightingColumn::Datetime.name())?;

    let mut keyed: Vec<_> = std::mem::take(&mut dataset.rows)
        .into_iter()
        .zip(records.drain(..))
        .collect();
    // Stable, so rows sharing a timestamp keep their source order.
    keyed.sort_by_key(|(row, _)| match &row[idx] {
        Value::Timestamp(ts) => Some(*ts),
        _ => None,
    });

    for (row, record) in keyed {
        dataset.rows.push(row);
        records.push(record);
    }
    Ok(())
}

fn parse_dates_posted(dataset: &mut DataSet, records: &[usize]) -> PipelineResult<()> {
    let column = SightingColumn::DatePosted.name();
    let idx = column_index(dataset, column)?;
    for (row, &record) in dataset.rows.iter_mut().zip(records) {
        let parsed = match &row[idx] {
            Value::Date(d) => *d,
            Value::Utf8(raw) => datetime::parse_date_posted(raw).map_err(|message| PipelineError::Parse {
                row: record,
                column: column.to_owned(),
                raw: raw.clone(),
                message,
            })?,
            other => return Err(missing_value(record, column, other)),
        };
        row[idx] = Value::Date(parsed);
    }
    dataset.set_field_type(idx, DataType::Date);
    Ok(())
}

fn filter_numeric(
    dataset: &mut DataSet,
    records: &mut Vec<usize>,
    column: &str,
    source: &str,
) -> PipelineResult<Vec<RowDrop>> {
    let idx = column_index(dataset, column)?;
    if dataset.schema.fields[idx].data_type == DataType::Float64 {
        return Ok(Vec::new());
    }

    let mask = numeric::validity_mask(dataset, column)?;

    let mut dropped = Vec::new();
    for ((row, &record), &valid) in dataset.rows.iter().zip(records.iter()).zip(&mask) {
        if !valid {
            let raw = row[idx].to_raw_string();
            warn!(source, record, column, value = %raw, "float check failed, dropping row");
            dropped.push(RowDrop {
                record,
                column: column.to_owned(),
                raw,
            });
        }
    }

    dataset.retain_by_mask(&mask);
    let mut flags = mask.iter();
    records.retain(|_| flags.next().copied().unwrap_or(false));

    numeric::coerce_valid(dataset, column)?;
    Ok(dropped)
}

fn missing_value(record: usize, column: &str, value: &Value) -> PipelineError {
    PipelineError::Parse {
        row: record,
        column: column.to_owned(),
        raw: value.to_raw_string(),
        message: "missing value".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sighting::source_schema;
    use chrono::NaiveDate;

    fn raw_row(datetime: &str, duration: &str, posted: &str, lat: &str, lon: &str) -> Vec<Value> {
        let text = |s: &str| {
            if s.is_empty() {
                Value::Null
            } else {
                Value::Utf8(s.to_string())
            }
        };
        vec![
            text(datetime),
            text("seattle"),
            text("wa"),
            text("us"),
            text("light"),
            text(duration),
            text("5 min"),
            text("bright light"),
            text(posted),
            text(lat),
            text(lon),
        ]
    }

    fn raw_dataset(rows: Vec<Vec<Value>>) -> DataSet {
        DataSet::new(source_schema(), rows)
    }

    fn column_values(ds: &DataSet, column: SightingColumn) -> Vec<Value> {
        let idx = ds.schema.index_of(column.name()).unwrap();
        ds.column(idx).cloned().collect()
    }

    #[test]
    fn rows_with_any_invalid_numeric_field_are_dropped() {
        let ds = raw_dataset(vec![
            raw_row("01/01/2020 10:00", "60", "01/02/2020", "4x7.6", "-122.3"),
            raw_row("01/01/2020 11:00", "sixty", "01/02/2020", "47.6", "-122.3"),
            raw_row("01/01/2020 12:00", "60", "01/02/2020", "47.6", "-122.3"),
        ]);

        let out = normalize(ds, "test.csv").unwrap();

        assert_eq!(out.dataset.row_count(), 1);
        assert_eq!(
            column_values(&out.dataset, SightingColumn::Datetime),
            vec![Value::Timestamp(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
            )]
        );
        assert_eq!(
            out.dropped,
            vec![
                RowDrop {
                    record: 2,
                    column: "duration_seconds".to_string(),
                    raw: "sixty".to_string()
                },
                RowDrop {
                    record: 1,
                    column: "latitude".to_string(),
                    raw: "4x7.6".to_string()
                },
            ]
        );
    }

    #[test]
    fn rows_are_sorted_by_canonical_datetime() {
        let ds = raw_dataset(vec![
            raw_row("01/01/2021 05:00", "1", "01/02/2021", "1", "1"),
            raw_row("06/01/2020 12:00", "2", "06/02/2020", "2", "2"),
            raw_row("12/31/2020 24:00", "3", "01/02/2021", "3", "3"),
        ]);

        let out = normalize(ds, "test.csv").unwrap();
        let ts = |y, m, d, h| {
            Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap())
        };
        assert_eq!(
            column_values(&out.dataset, SightingColumn::Datetime),
            vec![ts(2020, 6, 1, 12), ts(2021, 1, 1, 0), ts(2021, 1, 1, 5)]
        );
        assert_eq!(
            column_values(&out.dataset, SightingColumn::DurationSeconds),
            vec![Value::Float64(2.0), Value::Float64(3.0), Value::Float64(1.0)]
        );
    }

    #[test]
    fn typed_columns_are_marked_in_schema() {
        let ds = raw_dataset(vec![raw_row("01/01/2020 10:00", "60", "01/02/2020", "47.6", "-122.3")]);
        let out = normalize(ds, "test.csv").unwrap();
        let ty = |c: SightingColumn| {
            let idx = out.dataset.schema.index_of(c.name()).unwrap();
            out.dataset.schema.fields[idx].data_type.clone()
        };
        assert_eq!(ty(SightingColumn::Datetime), DataType::Timestamp);
        assert_eq!(ty(SightingColumn::DatePosted), DataType::Date);
        assert_eq!(ty(SightingColumn::Latitude), DataType::Float64);
        assert_eq!(ty(SightingColumn::City), DataType::Utf8);
    }

    #[test]
    fn invalid_date_posted_is_fatal() {
        let ds = raw_dataset(vec![
            raw_row("01/01/2020 10:00", "60", "01/02/2020", "47.6", "-122.3"),
            raw_row("01/01/2020 11:00", "60", "13/40/2020", "47.6", "-122.3"),
        ]);
        let err = normalize(ds, "test.csv").unwrap_err();
        match err {
            PipelineError::Parse { row, column, raw, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "date_posted");
                assert_eq!(raw, "13/40/2020");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_datetime_is_fatal() {
        let ds = raw_dataset(vec![raw_row("", "60", "01/02/2020", "47.6", "-122.3")]);
        let err = normalize(ds, "test.csv").unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn empty_numeric_value_drops_row() {
        let ds = raw_dataset(vec![raw_row("01/01/2020 10:00", "60", "01/02/2020", "47.6", "")]);
        let out = normalize(ds, "test.csv").unwrap();
        assert_eq!(out.dataset.row_count(), 0);
        assert_eq!(out.dropped[0].column, "longitude");
        assert_eq!(out.dropped[0].raw, "");
    }
}
