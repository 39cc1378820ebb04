//! Data persistence for MySQL and PostgreSQL applications.
//!
//! - [`Connection`] opens a driver pool from a [`DatabaseConfig`] and runs
//!   statements through the [`Executor`] trait.
//! - [`QueryBuilder`] assembles parameterized SELECT/INSERT/UPDATE/DELETE SQL.
//! - [`Repository`] provides CRUD for any type deriving [`Entity`].
//! - [`Schema`] and [`Blueprint`] render CREATE/ALTER TABLE DDL per dialect.
//! - [`Migrator`] applies and reverts [`Migration`] units in batches.
//!
//! # Features
//!
//! - **`mysql`** - MySQL/MariaDB driver
//! - **`postgres`** - PostgreSQL driver
//!
//! Both are enabled by default.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlframe::{Config, Connection, Entity, Repository};
//!
//! #[derive(Debug, Default, Entity)]
//! #[entity(table = "users")]
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//!     pub email: String,
//!     pub created_at: Option<chrono::DateTime<chrono::Utc>>,
//!     pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
//! }
//!
//! let config = Config::load("config.yaml")?;
//! let conn = Connection::open(&config.database).await?;
//! let users = Repository::<User>::new(conn);
//!
//! let mut user = User { name: "john".into(), email: "john@example.com".into(), ..Default::default() };
//! users.create(&mut user).await?;
//!
//! let found = users.find_by_id(user.id).await?;
//! ```

#![forbid(unsafe_code)]

#[cfg(not(any(feature = "mysql", feature = "postgres")))]
compile_error!("enable at least one of the `mysql` or `postgres` features");

extern crate self as sqlframe;

mod config;
mod connection;
mod entity;
mod error;
mod migration;
mod migrator;
mod query;
mod repository;
mod schema;
mod value;

pub use config::{
    Config, ConfigBuilder, DatabaseConfig, Driver, DEFAULT_HOST, DEFAULT_MYSQL_PORT,
    DEFAULT_POSTGRES_PORT,
};
pub use connection::{Connection, Executor, Transaction};
pub use entity::{materialize_row, materialize_rows, Entity, Field};
pub use error::{ConnectionError, Direction, Error, MappingError, MigrationError, Result};
pub use migration::{
    MemoryMigrationRepository, Migration, MigrationRecord, MigrationRegistry, MigrationRepository,
    SqlMigrationRepository, MIGRATIONS_TABLE,
};
pub use migrator::{MigrationStatus, Migrator, Refreshed};
pub use query::{Order, QueryBuilder};
pub use repository::Repository;
pub use schema::{
    Blueprint, Column, ColumnType, ForeignKey, Index, Schema, DEFAULT_CHARSET, DEFAULT_COLLATION,
    DEFAULT_ENGINE,
};
pub use sqlframe_macro::Entity;
pub use value::{FromValue, Row, Value};

pub use async_trait::async_trait;
pub use rust_decimal::Decimal;
