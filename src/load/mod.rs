//! Loading cleaned datasets into a destination table.
//!
//! Loading is append-only: [`Destination::ensure_table`] declares the table only when it does
//! not exist yet, and [`Destination::append`] inserts rows without touching existing ones.

pub mod sql;

pub use sql::SqlDestination;

use crate::error::{PipelineError, PipelineResult};
use crate::schema::TableSchema;
use crate::types::DataSet;

/// A store that can declare a table and append rows to it.
pub trait Destination {
    /// Create `table` if it does not already exist.
    fn ensure_table(&mut self, table: &TableSchema) -> PipelineResult<()>;

    /// Append every row of `dataset` to `table`; returns the number of rows written.
    fn append(&mut self, table: &TableSchema, dataset: &DataSet) -> PipelineResult<u64>;
}

/// Dataset field index for every data column of `table`, in column order.
pub fn bound_field_indexes(table: &TableSchema, dataset: &DataSet) -> PipelineResult<Vec<usize>> {
    table
        .data_columns()
        .map(|column| {
            dataset
                .schema
                .index_of(&column.name)
                .ok_or_else(|| PipelineError::SchemaMismatch {
                    message: format!(
                        "table '{}' column '{}' has no matching dataset field",
                        table.name, column.name
                    ),
                })
        })
        .collect()
}
