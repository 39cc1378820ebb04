//! Batch-based migration runner.
//!
//! Every call to [`Migrator::run`] applies all pending units under one new
//! batch number. [`Migrator::rollback`] reverts whole batches, newest first, so
//! units applied together are always reverted together.
//!
//! A failing unit stops the operation immediately. Units completed earlier in
//! the same call stay applied and recorded; the error reports how many there
//! were through [`MigrationError::completed`].

use std::{collections::HashMap, sync::Arc};

use crate::{
    connection::Executor,
    error::{Direction, Error, MigrationError, Result},
    migration::{
        Migration, MigrationRecord, MigrationRegistry, MigrationRepository, SqlMigrationRepository,
    },
    schema::Schema,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: String,
    /// Batch the unit was applied in, `None` while pending.
    pub batch: Option<i64>,
    /// Whether the unit is known to the registry. Applied records whose unit
    /// has been removed cannot be rolled back.
    pub registered: bool,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.batch.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refreshed {
    pub reset: usize,
    pub ran: usize,
}

pub struct Migrator {
    schema: Schema,
    registry: MigrationRegistry,
    repository: Arc<dyn MigrationRepository>,
}

impl Migrator {
    /// A migrator recording applied units in the `migrations` table.
    pub fn new<E: Executor + 'static>(executor: E, registry: MigrationRegistry) -> Self {
        let schema = Schema::new(executor);
        let repository = SqlMigrationRepository::new(schema.clone());

        Self::with_repository(schema, registry, repository)
    }

    pub fn with_repository<R>(schema: Schema, registry: MigrationRegistry, repository: R) -> Self
    where
        R: MigrationRepository + 'static,
    {
        Self {
            schema,
            registry,
            repository: Arc::new(repository),
        }
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Applies every pending unit in name order under a new batch number and
    /// returns how many were applied.
    pub async fn run(&self) -> Result<usize> {
        self.repository.ensure_table().await?;

        let applied = self.repository.applied().await?;
        let batch = applied.iter().map(|r| r.batch).max().unwrap_or(0) + 1;
        let pending: Vec<&str> = self
            .registry
            .names()
            .filter(|name| !applied.iter().any(|r| r.name == *name))
            .collect();

        if pending.is_empty() {
            tracing::info!("nothing to migrate");
            return Ok(0);
        }

        let mut completed = 0;
        for name in pending {
            let unit = self.unit(name, Direction::Up, completed)?;

            tracing::info!(migration = name, batch, "migrating");

            if let Err(e) = unit.up(&self.schema).await {
                return Err(failed(name, Direction::Up, completed, e));
            }

            if let Err(e) = self.repository.log(name, batch).await {
                return Err(failed(name, Direction::Up, completed, e));
            }

            completed += 1;
        }

        tracing::info!(count = completed, batch, "migrations applied");

        Ok(completed)
    }

    /// Reverts the `step` most recent batches, or all of them when `step` is 0
    /// or not smaller than the number of batches. Returns how many units were
    /// reverted.
    pub async fn rollback(&self, step: usize) -> Result<usize> {
        self.repository.ensure_table().await?;

        let mut applied = self.repository.applied().await?;
        applied.sort_by(|a, b| (b.batch, b.id).cmp(&(a.batch, a.id)));

        let mut batches: Vec<i64> = applied.iter().map(|r| r.batch).collect();
        batches.dedup();

        if step > 0 && step < batches.len() {
            batches.truncate(step);
        }

        let selected = applied
            .into_iter()
            .filter(|r| batches.contains(&r.batch))
            .collect();

        self.revert(selected).await
    }

    /// Reverts every applied unit.
    pub async fn reset(&self) -> Result<usize> {
        self.rollback(0).await
    }

    /// Resets then runs every unit again.
    pub async fn refresh(&self) -> Result<Refreshed> {
        let reset = self.reset().await?;
        let ran = self.run().await?;

        Ok(Refreshed { reset, ran })
    }

    /// Every registered unit in name order, followed by applied records with
    /// no registered unit.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        self.repository.ensure_table().await?;

        let applied = self.repository.applied().await?;
        let batches: HashMap<&str, i64> = applied
            .iter()
            .map(|r| (r.name.as_str(), r.batch))
            .collect();

        let mut status: Vec<MigrationStatus> = self
            .registry
            .names()
            .map(|name| MigrationStatus {
                name: name.to_owned(),
                batch: batches.get(name).copied(),
                registered: true,
            })
            .collect();

        status.extend(
            applied
                .iter()
                .filter(|r| !self.registry.contains(&r.name))
                .map(|r| MigrationStatus {
                    name: r.name.clone(),
                    batch: Some(r.batch),
                    registered: false,
                }),
        );

        Ok(status)
    }

    async fn revert(&self, records: Vec<MigrationRecord>) -> Result<usize> {
        if records.is_empty() {
            tracing::info!("nothing to roll back");
            return Ok(0);
        }

        let mut completed = 0;
        for record in records {
            let unit = self.unit(&record.name, Direction::Down, completed)?;

            tracing::info!(migration = %record.name, batch = record.batch, "rolling back");

            if let Err(e) = unit.down(&self.schema).await {
                return Err(failed(&record.name, Direction::Down, completed, e));
            }

            if let Err(e) = self.repository.delete(&record).await {
                return Err(failed(&record.name, Direction::Down, completed, e));
            }

            completed += 1;
        }

        tracing::info!(count = completed, "migrations rolled back");

        Ok(completed)
    }

    fn unit(&self, name: &str, direction: Direction, completed: usize) -> Result<Arc<dyn Migration>> {
        self.registry.get(name).ok_or_else(|| {
            failed(
                name,
                direction,
                completed,
                MigrationError::NotFound(name.to_owned()).into(),
            )
        })
    }
}

fn failed(name: &str, direction: Direction, completed: usize, source: Error) -> Error {
    tracing::warn!(migration = name, %direction, completed, error = %source, "migration failed");

    MigrationError::Failed {
        name: name.to_owned(),
        direction,
        completed,
        source: Box::new(source),
    }
    .into()
}
