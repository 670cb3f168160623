//! Source extraction.
//!
//! Extraction never infers types: every field is read as text so that the
//! [`crate::cleaning`] stage can validate rows individually afterwards.

pub mod csv;

pub use self::csv::{read_raw_csv_from_path, read_raw_csv_from_reader, RawExtract};
