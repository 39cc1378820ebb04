use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::Mutex;

use crate::{
    connection::Executor,
    error::{MigrationError, Result},
    query::QueryBuilder,
    schema::{Blueprint, Schema},
    value::Row,
};

/// Name of the table recording applied migrations.
pub const MIGRATIONS_TABLE: &str = "migrations";

/// A reversible schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    async fn up(&self, schema: &Schema) -> Result<()>;

    async fn down(&self, schema: &Schema) -> Result<()>;
}

/// Named migration units, kept in name order.
///
/// Names are `<digits>_<snake_case>`, e.g. `20230615120000_create_users_table`,
/// so that name order is chronological.
#[derive(Default, Clone)]
pub struct MigrationRegistry {
    units: BTreeMap<String, Arc<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M>(&mut self, name: impl Into<String>, migration: M) -> std::result::Result<&mut Self, MigrationError>
    where
        M: Migration + 'static,
    {
        let name = name.into();
        validate_name(&name)?;

        if self.units.contains_key(&name) {
            return Err(MigrationError::Duplicate(name));
        }

        self.units.insert(name, Arc::new(migration));

        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Migration>> {
        self.units.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Registered names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn validate_name(name: &str) -> std::result::Result<(), MigrationError> {
    let invalid = || MigrationError::InvalidName(name.to_owned());
    let (version, rest) = name.split_once('_').ok_or_else(invalid)?;

    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    if rest.is_empty()
        || !rest
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(invalid());
    }

    Ok(())
}

/// One row of the migrations table.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationRecord {
    pub id: i64,
    pub name: String,
    pub batch: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<Row> for MigrationRecord {
    type Error = crate::Error;

    fn try_from(row: Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            batch: row.try_get("batch")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Storage of applied migration records.
#[async_trait]
pub trait MigrationRepository: Send + Sync {
    /// Creates the record storage if it does not exist.
    async fn ensure_table(&self) -> Result<()>;

    /// Applied records ordered by batch then id, ascending.
    async fn applied(&self) -> Result<Vec<MigrationRecord>>;

    async fn log(&self, name: &str, batch: i64) -> Result<()>;

    async fn delete(&self, record: &MigrationRecord) -> Result<()>;
}

/// Records kept in the `migrations` table: `(id, name unique, batch, created_at)`.
#[derive(Clone)]
pub struct SqlMigrationRepository {
    schema: Schema,
}

impl SqlMigrationRepository {
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    fn executor(&self) -> &dyn Executor {
        self.schema.executor()
    }

    fn query(&self) -> QueryBuilder {
        QueryBuilder::table(MIGRATIONS_TABLE)
    }
}

#[async_trait]
impl MigrationRepository for SqlMigrationRepository {
    async fn ensure_table(&self) -> Result<()> {
        let mut table = Blueprint::create_if_not_exists(MIGRATIONS_TABLE);
        table.id();
        table.string("name", 255).unique();
        table.integer("batch", false);
        table.date_time("created_at").use_current();

        self.schema.build(&table).await
    }

    async fn applied(&self) -> Result<Vec<MigrationRecord>> {
        self.query()
            .order_by("batch", "asc")
            .order_by("id", "asc")
            .fetch_rows(self.executor())
            .await?
            .into_iter()
            .map(MigrationRecord::try_from)
            .collect()
    }

    async fn log(&self, name: &str, batch: i64) -> Result<()> {
        self.query()
            .insert(
                self.executor(),
                vec![
                    ("name", name.into()),
                    ("batch", batch.into()),
                    ("created_at", Utc::now().trunc_subsecs(0).into()),
                ],
            )
            .await?;

        Ok(())
    }

    async fn delete(&self, record: &MigrationRecord) -> Result<()> {
        self.query()
            .and_where("id", "=", record.id)
            .delete(self.executor())
            .await?;

        Ok(())
    }
}

/// In-process record storage, for tests and dry runs.
#[derive(Default)]
pub struct MemoryMigrationRepository {
    records: Mutex<Vec<MigrationRecord>>,
}

impl MemoryMigrationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MigrationRepository for MemoryMigrationRepository {
    async fn ensure_table(&self) -> Result<()> {
        Ok(())
    }

    async fn applied(&self) -> Result<Vec<MigrationRecord>> {
        let mut records = self.records.lock().await.clone();
        records.sort_by_key(|r| (r.batch, r.id));

        Ok(records)
    }

    async fn log(&self, name: &str, batch: i64) -> Result<()> {
        let mut records = self.records.lock().await;
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;

        records.push(MigrationRecord {
            id,
            name: name.to_owned(),
            batch,
            created_at: Some(Utc::now()),
        });

        Ok(())
    }

    async fn delete(&self, record: &MigrationRecord) -> Result<()> {
        self.records.lock().await.retain(|r| r.id != record.id);

        Ok(())
    }
}

#[async_trait]
impl<R: MigrationRepository + ?Sized> MigrationRepository for Arc<R> {
    async fn ensure_table(&self) -> Result<()> {
        (**self).ensure_table().await
    }

    async fn applied(&self) -> Result<Vec<MigrationRecord>> {
        (**self).applied().await
    }

    async fn log(&self, name: &str, batch: i64) -> Result<()> {
        (**self).log(name, batch).await
    }

    async fn delete(&self, record: &MigrationRecord) -> Result<()> {
        (**self).delete(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Migration for Noop {
        async fn up(&self, _schema: &Schema) -> Result<()> {
            Ok(())
        }

        async fn down(&self, _schema: &Schema) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn registry_validates_names() {
        let mut registry = MigrationRegistry::new();

        registry
            .register("20230615120100_create_posts_table", Noop)
            .unwrap()
            .register("20230615120000_create_users_table", Noop)
            .unwrap();

        for name in ["create_users", "2023_", "_users", "2023x_users", "2023_Users"] {
            assert!(matches!(
                registry.register(name, Noop),
                Err(MigrationError::InvalidName(_))
            ));
        }

        assert!(matches!(
            registry.register("20230615120000_create_users_table", Noop),
            Err(MigrationError::Duplicate(_))
        ));

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec![
                "20230615120000_create_users_table",
                "20230615120100_create_posts_table"
            ]
        );
    }

    #[tokio::test]
    async fn memory_repository_orders_by_batch() -> anyhow::Result<()> {
        let repository = MemoryMigrationRepository::new();
        repository.log("2_b", 2).await?;
        repository.log("1_a", 1).await?;

        let applied = repository.applied().await?;
        assert_eq!(
            applied.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["1_a", "2_b"]
        );

        repository.delete(&applied[0]).await?;
        assert_eq!(repository.applied().await?.len(), 1);

        Ok(())
    }
}
