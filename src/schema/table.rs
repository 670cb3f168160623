//! Destination table description and DDL rendering.

use crate::error::{PipelineError, PipelineResult};
use crate::sighting::SightingColumn;

use super::width::TextWidths;

/// SQL dialect used to render statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    Sqlite,
}

impl SqlDialect {
    /// Quote an identifier; identifiers containing the quote character are rejected.
    pub fn quote_ident(self, ident: &str) -> PipelineResult<String> {
        let quote = match self {
            SqlDialect::MySql => '`',
            SqlDialect::Sqlite => '"',
        };
        if ident.is_empty() || ident.contains(quote) {
            return Err(PipelineError::SchemaMismatch {
                message: format!("invalid identifier {ident:?}"),
            });
        }
        Ok(format!("{quote}{ident}{quote}"))
    }

    /// Most bound parameters one statement may carry.
    pub fn max_bind_params(self) -> usize {
        match self {
            SqlDialect::MySql => 65_535,
            // SQLITE_MAX_VARIABLE_NUMBER since 3.32
            SqlDialect::Sqlite => 32_766,
        }
    }

    /// Rows per multi-row insert: `requested`, capped so `columns` binds per row stay within
    /// [`Self::max_bind_params`].
    pub fn rows_per_insert(self, requested: usize, columns: usize) -> usize {
        let cap = self.max_bind_params() / columns.max(1);
        requested.min(cap).max(1)
    }
}

/// Storage type of a destination column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    /// 64-bit integer.
    BigInt,
    /// Date and time.
    Timestamp,
    /// Variable-length text with a maximum width in characters.
    Varchar(u32),
    /// Fixed-point decimal.
    Decimal { precision: u8, scale: u8 },
}

impl SqlType {
    fn render(self, dialect: SqlDialect) -> String {
        match (self, dialect) {
            (SqlType::BigInt, SqlDialect::MySql) => "BIGINT".to_string(),
            // INTEGER is required for SQLite rowid aliasing; it is 64-bit.
            (SqlType::BigInt, SqlDialect::Sqlite) => "INTEGER".to_string(),
            (SqlType::Timestamp, SqlDialect::MySql) => "DATETIME".to_string(),
            (SqlType::Timestamp, SqlDialect::Sqlite) => "TIMESTAMP".to_string(),
            (SqlType::Varchar(width), _) => format!("VARCHAR({width})"),
            (SqlType::Decimal { precision, scale }, _) => format!("DECIMAL({precision}, {scale})"),
        }
    }
}

/// One destination column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Column name in the destination table.
    pub name: String,
    /// Storage type.
    pub sql_type: SqlType,
    /// Generated surrogate key; never bound from the dataset.
    pub primary_key: bool,
}

impl ColumnSpec {
    fn data(name: &str, sql_type: SqlType) -> Self {
        Self {
            name: name.to_owned(),
            sql_type,
            primary_key: false,
        }
    }

    fn render(&self, dialect: SqlDialect) -> PipelineResult<String> {
        let name = dialect.quote_ident(&self.name)?;
        let ty = self.sql_type.render(dialect);
        if !self.primary_key {
            return Ok(format!("{name} {ty}"));
        }
        Ok(match dialect {
            SqlDialect::MySql => format!("{name} {ty} NOT NULL AUTO_INCREMENT PRIMARY KEY"),
            SqlDialect::Sqlite => format!("{name} {ty} PRIMARY KEY AUTOINCREMENT"),
        })
    }
}

/// A destination table: its name and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// The sighting table, sized with the widths estimated for this run.
    pub fn sightings(name: impl Into<String>, widths: &TextWidths) -> PipelineResult<Self> {
        let mut columns = vec![ColumnSpec {
            name: "sight_id".to_string(),
            sql_type: SqlType::BigInt,
            primary_key: true,
        }];

        for column in SightingColumn::ALL {
            let sql_type = match column {
                SightingColumn::Datetime | SightingColumn::DatePosted => SqlType::Timestamp,
                SightingColumn::DurationSeconds => SqlType::Decimal {
                    precision: 11,
                    scale: 2,
                },
                SightingColumn::Latitude | SightingColumn::Longitude => SqlType::Decimal {
                    precision: 11,
                    scale: 8,
                },
                text => SqlType::Varchar(widths.width(text).ok_or_else(|| {
                    PipelineError::SchemaMismatch {
                        message: format!("no width estimated for column '{}'", text.name()),
                    }
                })?),
            };
            columns.push(ColumnSpec::data(column.name(), sql_type));
        }

        Ok(Self {
            name: name.into(),
            columns,
        })
    }

    /// Columns that are bound from dataset fields of the same name, in declaration order.
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| !c.primary_key)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_table_sql(&self, dialect: SqlDialect) -> PipelineResult<String> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.render(dialect))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            dialect.quote_ident(&self.name)?,
            columns.join(",\n    ")
        ))
    }

    /// `INSERT INTO table (cols...) ` prefix; the caller appends the `VALUES` list.
    pub fn insert_prefix(&self, dialect: SqlDialect) -> PipelineResult<String> {
        let columns = self
            .data_columns()
            .map(|c| dialect.quote_ident(&c.name))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(format!(
            "INSERT INTO {} ({}) ",
            dialect.quote_ident(&self.name)?,
            columns.join(", ")
        ))
    }
}
