//! Schema inference for the destination table.
//!
//! [`width`] turns a cleaned dataset into [`TextWidths`]; [`table`] turns those widths into a
//! [`TableSchema`] that the loader can declare and insert into.

pub mod table;
pub mod width;

pub use table::{ColumnSpec, SqlDialect, SqlType, TableSchema};
pub use width::{estimate_text_widths, estimate_width, TextWidths};
