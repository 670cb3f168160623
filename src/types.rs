//! Core data model types shared by every stage.
//!
//! A run moves one [`DataSet`] through the pipeline. The reader fills it with text, the
//! normalizer rewrites columns into typed [`Value`]s in place, and the loader binds the final
//! values into SQL inserts.

use chrono::{NaiveDate, NaiveDateTime};

/// Logical data type for a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Date and time without a zone.
    Timestamp,
    /// Calendar date.
    Date,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Header used for this field in the source file, when it differs from `name`.
    pub source: Option<String>,
}

impl Field {
    /// Create a new field whose source header equals its name.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            source: None,
        }
    }

    /// Create a field that is read from a differently named source header.
    pub fn with_source(name: impl Into<String>, source: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            source: Some(source.into()),
        }
    }

    /// The header this field is matched against when reading a source file.
    pub fn source_header(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }
}

/// A list of fields describing the expected shape of incoming data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Date and time without a zone.
    Timestamp(NaiveDateTime),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Text form of the value for diagnostics; `Null` renders as an empty string.
    pub fn to_raw_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Utf8(s) => s.clone(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate the values of one column in row order.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Keep only the rows whose entry in `keep` is `true`.
    ///
    /// # Panics
    ///
    /// Panics if `keep` does not have exactly one entry per row.
    pub fn retain_by_mask(&mut self, keep: &[bool]) {
        assert!(
            keep.len() == self.rows.len(),
            "mask length {} does not match row count {}",
            keep.len(),
            self.rows.len()
        );
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
    }

    /// Replace the type of field `idx` after its values were rewritten.
    pub fn set_field_type(&mut self, idx: usize, data_type: DataType) {
        if let Some(field) = self.schema.fields.get_mut(idx) {
            field.data_type = data_type;
        }
    }
}
