use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by every pipeline stage.
///
/// All variants are fatal for a run. Row-level numeric failures are not errors: they drop the
/// row and are reported as [`crate::cleaning::RowDrop`]s instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV extraction error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input does not have the expected shape (missing columns, unexpected types, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A datetime or date value could not be parsed.
    #[error("failed to parse value at record {row} column '{column}': {message} (raw='{raw}')")]
    Parse {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// Width estimation was asked for a column without a single non-null value.
    #[error("cannot estimate width of column '{column}': no non-null values")]
    EmptyColumn { column: String },

    /// Connectivity, DDL or insert failure in the destination database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration could not be loaded or is invalid.
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
}
