use std::fmt;

/// Failures while resolving a driver or establishing the pool.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("unsupported database driver `{0}`, consider using mysql or postgres")]
    UnsupportedDriver(String),

    #[error("database driver `{0}` is not enabled in this build")]
    DriverDisabled(&'static str),

    #[error("failed to open {driver} database: {source}")]
    Open {
        driver: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to ping {driver} database: {source}")]
    Ping {
        driver: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Failures while moving values between rows and entities.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("`{entity}` has no field mapped to column `{column}`")]
    UnknownColumn { entity: &'static str, column: String },

    #[error("column `{column}`: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column `{column}`: unsupported database type `{type_name}`")]
    UnsupportedType { column: String, type_name: String },

    #[error("`{0}` has no identifier value")]
    MissingIdentifier(&'static str),

    #[error("`{0}` has no mapped fields")]
    NoMappedFields(&'static str),
}

impl MappingError {
    /// Attaches the column name to a conversion failure raised without one.
    pub fn in_column(self, name: &str) -> Self {
        match self {
            MappingError::TypeMismatch {
                expected, found, ..
            } => MappingError::TypeMismatch {
                column: name.to_owned(),
                expected,
                found,
            },
            MappingError::UnsupportedType { type_name, .. } => MappingError::UnsupportedType {
                column: name.to_owned(),
                type_name,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Failures raised by the migration registry and engine.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration not found: {0}")]
    NotFound(String),

    #[error("invalid migration name `{0}`, expected `<timestamp>_<name>`")]
    InvalidName(String),

    #[error("migration `{0}` is already registered")]
    Duplicate(String),

    #[error("migration `{name}` failed while running {direction} after {completed} completed: {source}")]
    Failed {
        name: String,
        direction: Direction,
        completed: usize,
        #[source]
        source: Box<Error>,
    },
}

impl MigrationError {
    /// Number of units completed by the run before this error stopped it.
    pub fn completed(&self) -> usize {
        match self {
            MigrationError::Failed { completed, .. } => *completed,
            _ => 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("{operation} failed for `{sql}`: {source}")]
    Execution {
        operation: &'static str,
        sql: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("no `{table}` row matched")]
    NotFound { table: String },

    #[error("{0}")]
    Builder(String),

    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    #[error("config `{path}`: {source}")]
    Config {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    pub(crate) fn execution(operation: &'static str, sql: &str) -> impl FnOnce(sqlx::Error) -> Self {
        let sql = sql.to_owned();
        move |source| Error::Execution {
            operation,
            sql,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
