//! Physical connection handling.
//!
//! [`Connection`] owns a pool for one of the supported drivers and implements
//! [`Executor`], the narrow surface the query builder, repository, schema
//! builder and migrator run their statements through. All SQL handed to an
//! executor uses `?` placeholders; the executor rewrites them for the active
//! driver before the statement reaches the wire.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Column as _, Connection as _, Row as _, TypeInfo as _, ValueRef as _};
use tokio::sync::Mutex;

#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};

use crate::{
    config::{DatabaseConfig, Driver},
    error::{ConnectionError, Error, MappingError, Result},
    value::{Row, Value},
};

/// Statement execution surface shared by connections and transactions.
#[async_trait]
pub trait Executor: Send + Sync {
    fn driver(&self) -> Driver;

    /// Runs a statement with no result set and returns the affected row count.
    async fn execute(&self, sql: &str, binds: Vec<Value>) -> Result<u64>;

    async fn fetch_all(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>>;

    async fn fetch_optional(&self, sql: &str, binds: Vec<Value>) -> Result<Option<Row>> {
        Ok(self.fetch_all(sql, binds).await?.into_iter().next())
    }

    /// Runs an INSERT and returns the identifier the store assigned, if any.
    async fn insert(&self, sql: &str, binds: Vec<Value>, id_column: &str) -> Result<Option<i64>>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn driver(&self) -> Driver {
        (**self).driver()
    }

    async fn execute(&self, sql: &str, binds: Vec<Value>) -> Result<u64> {
        (**self).execute(sql, binds).await
    }

    async fn fetch_all(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>> {
        (**self).fetch_all(sql, binds).await
    }

    async fn fetch_optional(&self, sql: &str, binds: Vec<Value>) -> Result<Option<Row>> {
        (**self).fetch_optional(sql, binds).await
    }

    async fn insert(&self, sql: &str, binds: Vec<Value>, id_column: &str) -> Result<Option<i64>> {
        (**self).insert(sql, binds, id_column).await
    }
}

#[derive(Debug, Clone)]
enum Pool {
    #[cfg(feature = "mysql")]
    MySql(MySqlPool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

/// A pooled handle to a MySQL or PostgreSQL database.
///
/// Cloning is cheap and shares the underlying pool. No locking happens above
/// the driver's pool, so concurrent callers may interleave freely.
///
/// ```rust,ignore
/// let config = DatabaseConfig::builder()
///     .driver("postgres")
///     .name("blog")
///     .user("postgres")
///     .password("postgres")
///     .build();
///
/// let conn = Connection::open(&config).await?;
/// let rows = conn.query_rows("SELECT * FROM users WHERE id = ?", vec![1.into()]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Connection {
    pool: Pool,
}

impl Connection {
    /// Opens a pool for the configured driver and checks it with a ping.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let driver = config.driver()?;
        let port = config.port()?;

        tracing::debug!(dsn = %config.redacted_dsn()?, "opening database connection");

        let pool = match driver {
            Driver::MySql => Self::open_mysql(config, port).await?,
            Driver::Postgres => Self::open_postgres(config, port).await?,
        };

        let conn = Self { pool };
        conn.ping().await?;

        tracing::info!(driver = %driver, host = %config.host, database = %config.name, "database connected");

        Ok(conn)
    }

    #[cfg(feature = "mysql")]
    async fn open_mysql(config: &DatabaseConfig, port: u16) -> Result<Pool> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = MySqlPoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|source| ConnectionError::Open {
                driver: Driver::MySql.name(),
                source,
            })?;

        Ok(Pool::MySql(pool))
    }

    #[cfg(not(feature = "mysql"))]
    async fn open_mysql(_config: &DatabaseConfig, _port: u16) -> Result<Pool> {
        Err(ConnectionError::DriverDisabled(Driver::MySql.name()).into())
    }

    #[cfg(feature = "postgres")]
    async fn open_postgres(config: &DatabaseConfig, port: u16) -> Result<Pool> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name)
            .ssl_mode(PgSslMode::Disable);

        let pool = PgPoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|source| ConnectionError::Open {
                driver: Driver::Postgres.name(),
                source,
            })?;

        Ok(Pool::Postgres(pool))
    }

    #[cfg(not(feature = "postgres"))]
    async fn open_postgres(_config: &DatabaseConfig, _port: u16) -> Result<Pool> {
        Err(ConnectionError::DriverDisabled(Driver::Postgres.name()).into())
    }

    /// Acquires one connection from the pool and pings it.
    pub async fn ping(&self) -> Result<()> {
        let driver = self.driver().name();
        let ping_err = |source| ConnectionError::Ping { driver, source };

        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => {
                let mut conn = pool.acquire().await.map_err(ping_err)?;
                conn.ping().await.map_err(ping_err)?;
            }
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => {
                let mut conn = pool.acquire().await.map_err(ping_err)?;
                conn.ping().await.map_err(ping_err)?;
            }
        }

        Ok(())
    }

    /// Runs a statement returning rows.
    pub async fn query_rows(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>> {
        self.fetch_all(sql, binds).await
    }

    /// Runs a statement returning at most one row.
    pub async fn query_one(&self, sql: &str, binds: Vec<Value>) -> Result<Option<Row>> {
        self.fetch_optional(sql, binds).await
    }

    /// Starts a transaction on a dedicated pooled connection.
    pub async fn begin(&self) -> Result<Transaction> {
        let inner = match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => {
                TxInner::MySql(pool.begin().await.map_err(Error::execution("begin", "BEGIN"))?)
            }
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => {
                TxInner::Postgres(pool.begin().await.map_err(Error::execution("begin", "BEGIN"))?)
            }
        };

        Ok(Transaction {
            driver: self.driver(),
            inner: Mutex::new(Some(inner)),
        })
    }

    pub async fn close(&self) {
        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => pool.close().await,
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => pool.close().await,
        }
    }
}

#[cfg(feature = "mysql")]
impl From<MySqlPool> for Connection {
    fn from(value: MySqlPool) -> Self {
        Self {
            pool: Pool::MySql(value),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<PgPool> for Connection {
    fn from(value: PgPool) -> Self {
        Self {
            pool: Pool::Postgres(value),
        }
    }
}

#[async_trait]
impl Executor for Connection {
    fn driver(&self) -> Driver {
        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(_) => Driver::MySql,
            #[cfg(feature = "postgres")]
            Pool::Postgres(_) => Driver::Postgres,
        }
    }

    async fn execute(&self, sql: &str, binds: Vec<Value>) -> Result<u64> {
        let (sql, binds) = self.driver().prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "execute");

        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => mysql::execute(pool, &sql, binds).await,
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => postgres::execute(pool, &sql, binds).await,
        }
    }

    async fn fetch_all(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>> {
        let (sql, binds) = self.driver().prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "fetch_all");

        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => mysql::fetch_all(pool, &sql, binds).await,
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => postgres::fetch_all(pool, &sql, binds).await,
        }
    }

    async fn fetch_optional(&self, sql: &str, binds: Vec<Value>) -> Result<Option<Row>> {
        let (sql, binds) = self.driver().prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "fetch_optional");

        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => mysql::fetch_optional(pool, &sql, binds).await,
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => postgres::fetch_optional(pool, &sql, binds).await,
        }
    }

    async fn insert(&self, sql: &str, binds: Vec<Value>, id_column: &str) -> Result<Option<i64>> {
        let (sql, binds) = self.driver().prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "insert");

        match &self.pool {
            #[cfg(feature = "mysql")]
            Pool::MySql(pool) => mysql::insert(pool, &sql, binds).await,
            #[cfg(feature = "postgres")]
            Pool::Postgres(pool) => postgres::insert(pool, &sql, binds, id_column).await,
        }
    }
}

enum TxInner {
    #[cfg(feature = "mysql")]
    MySql(sqlx::Transaction<'static, sqlx::MySql>),
    #[cfg(feature = "postgres")]
    Postgres(sqlx::Transaction<'static, sqlx::Postgres>),
}

/// An open transaction.
///
/// Statements run through its [`Executor`] implementation share one physical
/// connection until [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback). Dropping it without either rolls back.
pub struct Transaction {
    driver: Driver,
    inner: Mutex<Option<TxInner>>,
}

impl Transaction {
    pub async fn commit(self) -> Result<()> {
        match self.inner.into_inner() {
            #[cfg(feature = "mysql")]
            Some(TxInner::MySql(tx)) => tx.commit().await.map_err(Error::execution("commit", "COMMIT")),
            #[cfg(feature = "postgres")]
            Some(TxInner::Postgres(tx)) => {
                tx.commit().await.map_err(Error::execution("commit", "COMMIT"))
            }
            None => Err(Error::TransactionClosed),
        }
    }

    pub async fn rollback(self) -> Result<()> {
        match self.inner.into_inner() {
            #[cfg(feature = "mysql")]
            Some(TxInner::MySql(tx)) => tx
                .rollback()
                .await
                .map_err(Error::execution("rollback", "ROLLBACK")),
            #[cfg(feature = "postgres")]
            Some(TxInner::Postgres(tx)) => tx
                .rollback()
                .await
                .map_err(Error::execution("rollback", "ROLLBACK")),
            None => Err(Error::TransactionClosed),
        }
    }
}

#[async_trait]
impl Executor for Transaction {
    fn driver(&self) -> Driver {
        self.driver
    }

    async fn execute(&self, sql: &str, binds: Vec<Value>) -> Result<u64> {
        let (sql, binds) = self.driver.prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "execute in transaction");

        let mut guard = self.inner.lock().await;
        match guard.as_mut().ok_or(Error::TransactionClosed)? {
            #[cfg(feature = "mysql")]
            TxInner::MySql(tx) => mysql::execute(&mut **tx, &sql, binds).await,
            #[cfg(feature = "postgres")]
            TxInner::Postgres(tx) => postgres::execute(&mut **tx, &sql, binds).await,
        }
    }

    async fn fetch_all(&self, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>> {
        let (sql, binds) = self.driver.prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "fetch_all in transaction");

        let mut guard = self.inner.lock().await;
        match guard.as_mut().ok_or(Error::TransactionClosed)? {
            #[cfg(feature = "mysql")]
            TxInner::MySql(tx) => mysql::fetch_all(&mut **tx, &sql, binds).await,
            #[cfg(feature = "postgres")]
            TxInner::Postgres(tx) => postgres::fetch_all(&mut **tx, &sql, binds).await,
        }
    }

    async fn insert(&self, sql: &str, binds: Vec<Value>, id_column: &str) -> Result<Option<i64>> {
        let (sql, binds) = self.driver.prepare(sql, binds);
        tracing::debug!(sql = %sql, binds = binds.len(), "insert in transaction");

        let mut guard = self.inner.lock().await;
        match guard.as_mut().ok_or(Error::TransactionClosed)? {
            #[cfg(feature = "mysql")]
            TxInner::MySql(tx) => mysql::insert(&mut **tx, &sql, binds).await,
            #[cfg(feature = "postgres")]
            TxInner::Postgres(tx) => postgres::insert(&mut **tx, &sql, binds, id_column).await,
        }
    }
}

type Query<'q, DB> = sqlx::query::Query<'q, DB, <DB as sqlx::Database>::Arguments<'q>>;

fn bind_all<'q, DB>(mut query: Query<'q, DB>, binds: Vec<Value>) -> Query<'q, DB>
where
    DB: sqlx::Database,
    bool: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    i64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    f64: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Decimal: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    String: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Option<String>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    Vec<u8>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    DateTime<Utc>: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    NaiveDate: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
    serde_json::Value: sqlx::Encode<'q, DB> + sqlx::Type<DB>,
{
    for value in binds {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(v),
            Value::Int(v) => query.bind(v),
            Value::Float(v) => query.bind(v),
            Value::Decimal(v) => query.bind(v),
            Value::String(v) => query.bind(v),
            Value::Bytes(v) => query.bind(v),
            Value::DateTime(v) => query.bind(v),
            Value::Date(v) => query.bind(v),
            Value::Json(v) => query.bind(v),
        };
    }

    query
}

fn decode<'r, DB, T>(row: &'r DB::Row, index: usize, type_name: &str) -> std::result::Result<T, MappingError>
where
    DB: sqlx::Database,
    T: sqlx::Decode<'r, DB> + sqlx::Type<DB>,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    row.try_get::<T, _>(index)
        .map_err(|_| MappingError::UnsupportedType {
            column: String::new(),
            type_name: type_name.to_owned(),
        })
}

fn decode_row<DB>(
    row: &DB::Row,
    decode_value: fn(&DB::Row, usize, &str) -> std::result::Result<Value, MappingError>,
) -> Result<Row>
where
    DB: sqlx::Database,
    usize: sqlx::ColumnIndex<DB::Row>,
{
    row.columns()
        .iter()
        .map(|column| {
            let name = column.name().to_owned();
            let index = column.ordinal();
            let is_null = row
                .try_get_raw(index)
                .map(|raw| raw.is_null())
                .unwrap_or(false);

            let value = if is_null {
                Value::Null
            } else {
                decode_value(row, index, column.type_info().name())
                    .map_err(|e| e.in_column(&name))?
            };

            Ok((name, value))
        })
        .collect()
}

#[cfg(feature = "mysql")]
mod mysql {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::mysql::{MySql, MySqlRow};

    use super::{bind_all, decode, decode_row};
    use crate::{
        error::{Error, MappingError, Result},
        value::{Row, Value},
    };

    pub(super) async fn execute<'c, E>(executor: E, sql: &str, binds: Vec<Value>) -> Result<u64>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        let result = bind_all(sqlx::query(sql), binds)
            .execute(executor)
            .await
            .map_err(Error::execution("execute", sql))?;

        Ok(result.rows_affected())
    }

    pub(super) async fn fetch_all<'c, E>(executor: E, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        let rows = bind_all(sqlx::query(sql), binds)
            .fetch_all(executor)
            .await
            .map_err(Error::execution("query", sql))?;

        rows.iter().map(|row| decode_row::<MySql>(row, decode_value)).collect()
    }

    pub(super) async fn fetch_optional<'c, E>(
        executor: E,
        sql: &str,
        binds: Vec<Value>,
    ) -> Result<Option<Row>>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        let row = bind_all(sqlx::query(sql), binds)
            .fetch_optional(executor)
            .await
            .map_err(Error::execution("query", sql))?;

        row.as_ref()
            .map(|row| decode_row::<MySql>(row, decode_value))
            .transpose()
    }

    pub(super) async fn insert<'c, E>(executor: E, sql: &str, binds: Vec<Value>) -> Result<Option<i64>>
    where
        E: sqlx::Executor<'c, Database = MySql>,
    {
        let result = bind_all(sqlx::query(sql), binds)
            .execute(executor)
            .await
            .map_err(Error::execution("insert", sql))?;

        Ok(match result.last_insert_id() {
            0 => None,
            id => i64::try_from(id).ok(),
        })
    }

    fn decode_value(
        row: &MySqlRow,
        index: usize,
        type_name: &str,
    ) -> std::result::Result<Value, MappingError> {
        Ok(match type_name {
            "BOOLEAN" => Value::Bool(decode::<MySql, bool>(row, index, type_name)?),
            "TINYINT" => Value::from(decode::<MySql, i8>(row, index, type_name)?),
            "SMALLINT" | "YEAR" => Value::from(decode::<MySql, i16>(row, index, type_name)?),
            "INT" | "MEDIUMINT" => Value::from(decode::<MySql, i32>(row, index, type_name)?),
            "BIGINT" => Value::from(decode::<MySql, i64>(row, index, type_name)?),
            "TINYINT UNSIGNED" => Value::from(decode::<MySql, u8>(row, index, type_name)?),
            "SMALLINT UNSIGNED" => Value::from(decode::<MySql, u16>(row, index, type_name)?),
            "INT UNSIGNED" | "MEDIUMINT UNSIGNED" => {
                Value::from(decode::<MySql, u32>(row, index, type_name)?)
            }
            "BIGINT UNSIGNED" => Value::from(decode::<MySql, u64>(row, index, type_name)?),
            "FLOAT" => Value::from(decode::<MySql, f32>(row, index, type_name)?),
            "DOUBLE" => Value::from(decode::<MySql, f64>(row, index, type_name)?),
            "DECIMAL" => Value::Decimal(decode::<MySql, Decimal>(row, index, type_name)?),
            "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => Value::String(decode::<MySql, String>(row, index, type_name)?),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                Value::Bytes(decode::<MySql, Vec<u8>>(row, index, type_name)?)
            }
            "TIMESTAMP" => Value::DateTime(decode::<MySql, DateTime<Utc>>(row, index, type_name)?),
            "DATETIME" => Value::from(decode::<MySql, NaiveDateTime>(row, index, type_name)?),
            "DATE" => Value::Date(decode::<MySql, NaiveDate>(row, index, type_name)?),
            "JSON" => Value::Json(decode::<MySql, serde_json::Value>(row, index, type_name)?),
            other => {
                return Err(MappingError::UnsupportedType {
                    column: String::new(),
                    type_name: other.to_owned(),
                })
            }
        })
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::postgres::{PgRow, Postgres};

    use super::{bind_all, decode, decode_row};
    use crate::{
        error::{Error, MappingError, Result},
        value::{Row, Value},
    };

    pub(super) async fn execute<'c, E>(executor: E, sql: &str, binds: Vec<Value>) -> Result<u64>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let result = bind_all(sqlx::query(sql), binds)
            .execute(executor)
            .await
            .map_err(Error::execution("execute", sql))?;

        Ok(result.rows_affected())
    }

    pub(super) async fn fetch_all<'c, E>(executor: E, sql: &str, binds: Vec<Value>) -> Result<Vec<Row>>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let rows = bind_all(sqlx::query(sql), binds)
            .fetch_all(executor)
            .await
            .map_err(Error::execution("query", sql))?;

        rows.iter()
            .map(|row| decode_row::<Postgres>(row, decode_value))
            .collect()
    }

    pub(super) async fn fetch_optional<'c, E>(
        executor: E,
        sql: &str,
        binds: Vec<Value>,
    ) -> Result<Option<Row>>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let row = bind_all(sqlx::query(sql), binds)
            .fetch_optional(executor)
            .await
            .map_err(Error::execution("query", sql))?;

        row.as_ref()
            .map(|row| decode_row::<Postgres>(row, decode_value))
            .transpose()
    }

    /// Postgres reports generated keys through `RETURNING`.
    pub(super) async fn insert<'c, E>(
        executor: E,
        sql: &str,
        binds: Vec<Value>,
        id_column: &str,
    ) -> Result<Option<i64>>
    where
        E: sqlx::Executor<'c, Database = Postgres>,
    {
        let sql = format!("{sql} RETURNING \"{}\"", id_column.replace('"', "\"\""));
        let row = bind_all(sqlx::query(&sql), binds)
            .fetch_optional(executor)
            .await
            .map_err(Error::execution("insert", &sql))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let row = decode_row::<Postgres>(&row, decode_value)?;

        Ok(row.try_get::<Option<i64>>(id_column)?)
    }

    fn decode_value(
        row: &PgRow,
        index: usize,
        type_name: &str,
    ) -> std::result::Result<Value, MappingError> {
        Ok(match type_name {
            "BOOL" => Value::Bool(decode::<Postgres, bool>(row, index, type_name)?),
            "INT2" => Value::from(decode::<Postgres, i16>(row, index, type_name)?),
            "INT4" => Value::from(decode::<Postgres, i32>(row, index, type_name)?),
            "INT8" => Value::from(decode::<Postgres, i64>(row, index, type_name)?),
            "FLOAT4" => Value::from(decode::<Postgres, f32>(row, index, type_name)?),
            "FLOAT8" => Value::from(decode::<Postgres, f64>(row, index, type_name)?),
            "NUMERIC" => Value::Decimal(decode::<Postgres, Decimal>(row, index, type_name)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
                Value::String(decode::<Postgres, String>(row, index, type_name)?)
            }
            "BYTEA" => Value::Bytes(decode::<Postgres, Vec<u8>>(row, index, type_name)?),
            "TIMESTAMP" => Value::from(decode::<Postgres, NaiveDateTime>(row, index, type_name)?),
            "TIMESTAMPTZ" => {
                Value::DateTime(decode::<Postgres, DateTime<Utc>>(row, index, type_name)?)
            }
            "DATE" => Value::Date(decode::<Postgres, NaiveDate>(row, index, type_name)?),
            "JSON" | "JSONB" => {
                Value::Json(decode::<Postgres, serde_json::Value>(row, index, type_name)?)
            }
            other => {
                return Err(MappingError::UnsupportedType {
                    column: String::new(),
                    type_name: other.to_owned(),
                })
            }
        })
    }
}
