//! MySQL / SQLite destination backed by sqlx.
//!
//! sqlx is async; the destination owns a current-thread tokio runtime and blocks on it so the
//! pipeline stays synchronous.

use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::query_builder::Separated;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Database, Encode, MySql, QueryBuilder, Sqlite, Type};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::config::{invalid_config, DatabaseBackend, DatabaseConfig};
use crate::error::PipelineResult;
use crate::schema::{SqlDialect, TableSchema};
use crate::types::{DataSet, Value};

use super::{bound_field_indexes, Destination};

const SQLITE_IN_MEMORY: &str = ":memory:";

enum Connection {
    MySql(MySqlConnection),
    Sqlite(SqliteConnection),
}

/// A single database connection used for one run.
pub struct SqlDestination {
    runtime: Runtime,
    conn: Connection,
    batch_size: usize,
}

impl std::fmt::Debug for SqlDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlDestination")
            .field("dialect", &self.dialect())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl SqlDestination {
    /// Open a connection described by `config`.
    pub fn connect(config: &DatabaseConfig) -> PipelineResult<Self> {
        if config.insert_batch_size == 0 {
            return Err(invalid_config("database.insert_batch_size must be > 0"));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let conn = runtime.block_on(open(config))?;
        info!(backend = ?config.backend, "connected to destination database");

        Ok(Self {
            runtime,
            conn,
            batch_size: config.insert_batch_size,
        })
    }

    /// SQL dialect of the underlying connection.
    pub fn dialect(&self) -> SqlDialect {
        match self.conn {
            Connection::MySql(_) => SqlDialect::MySql,
            Connection::Sqlite(_) => SqlDialect::Sqlite,
        }
    }

    /// Number of rows currently stored in `table`.
    pub fn row_count(&mut self, table: &str) -> PipelineResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.dialect().quote_ident(table)?);
        let conn = &mut self.conn;
        let count = self.runtime.block_on(async move {
            match conn {
                Connection::MySql(c) => sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *c).await,
                Connection::Sqlite(c) => sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *c).await,
            }
        })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

impl Destination for SqlDestination {
    fn ensure_table(&mut self, table: &TableSchema) -> PipelineResult<()> {
        let ddl = table.create_table_sql(self.dialect())?;
        debug!(table = %table.name, %ddl, "declaring destination table");

        let conn = &mut self.conn;
        self.runtime.block_on(async move {
            match conn {
                Connection::MySql(c) => sqlx::query(&ddl).execute(&mut *c).await.map(|_| ()),
                Connection::Sqlite(c) => sqlx::query(&ddl).execute(&mut *c).await.map(|_| ()),
            }
        })?;
        Ok(())
    }

    fn append(&mut self, table: &TableSchema, dataset: &DataSet) -> PipelineResult<u64> {
        let prefix = table.insert_prefix(self.dialect())?;
        let fields = bound_field_indexes(table, dataset)?;
        let rows_per_insert = self.dialect().rows_per_insert(self.batch_size, fields.len());
        if rows_per_insert < self.batch_size {
            debug!(
                table = %table.name,
                requested = self.batch_size,
                rows_per_insert,
                "batch size capped by bind parameter limit"
            );
        }

        let mut written = 0;
        for chunk in dataset.rows.chunks(rows_per_insert) {
            let conn = &mut self.conn;
            written += self
                .runtime
                .block_on(insert_batch(conn, &prefix, &fields, chunk))?;
            debug!(table = %table.name, written, "inserted batch");
        }

        info!(table = %table.name, rows = written, "appended rows");
        Ok(written)
    }
}

async fn open(config: &DatabaseConfig) -> Result<Connection, sqlx::Error> {
    match config.backend {
        DatabaseBackend::Mysql => {
            // Connect options keep credentials out of a URL string.
            let mut options = MySqlConnectOptions::new()
                .host(&config.host)
                .port(config.port);
            if let Some(user) = &config.user {
                options = options.username(user);
            }
            if let Some(password) = &config.password {
                options = options.password(password);
            }
            if let Some(name) = &config.name {
                options = options.database(name);
            }
            Ok(Connection::MySql(options.connect().await?))
        }
        DatabaseBackend::Sqlite => {
            let options = if config.path == SQLITE_IN_MEMORY {
                SqliteConnectOptions::from_str("sqlite::memory:")?
            } else {
                SqliteConnectOptions::new()
                    .filename(&config.path)
                    .create_if_missing(true)
            };
            Ok(Connection::Sqlite(options.connect().await?))
        }
    }
}

async fn insert_batch(
    conn: &mut Connection,
    prefix: &str,
    fields: &[usize],
    rows: &[Vec<Value>],
) -> Result<u64, sqlx::Error> {
    match conn {
        Connection::MySql(c) => {
            let mut qb = QueryBuilder::<MySql>::new(prefix);
            qb.push_values(rows, |mut sep, row| push_row(&mut sep, fields, row));
            Ok(qb.build().execute(&mut *c).await?.rows_affected())
        }
        Connection::Sqlite(c) => {
            let mut qb = QueryBuilder::<Sqlite>::new(prefix);
            qb.push_values(rows, |mut sep, row| push_row(&mut sep, fields, row));
            Ok(qb.build().execute(&mut *c).await?.rows_affected())
        }
    }
}

fn push_row<'args, DB>(sep: &mut Separated<'_, 'args, DB, &'static str>, fields: &[usize], row: &[Value])
where
    DB: Database,
    Option<String>: Encode<'args, DB> + Type<DB>,
    Option<f64>: Encode<'args, DB> + Type<DB>,
    Option<i64>: Encode<'args, DB> + Type<DB>,
    Option<NaiveDateTime>: Encode<'args, DB> + Type<DB>,
{
    for &idx in fields {
        match &row[idx] {
            Value::Null => sep.push_bind(None::<String>),
            Value::Int64(v) => sep.push_bind(Some(*v)),
            Value::Float64(v) => sep.push_bind(Some(*v)),
            Value::Utf8(s) => sep.push_bind(Some(s.clone())),
            Value::Timestamp(ts) => sep.push_bind(Some(*ts)),
            // Date columns are declared as timestamps.
            Value::Date(d) => sep.push_bind(Some(d.and_time(NaiveTime::MIN))),
        };
    }
}
