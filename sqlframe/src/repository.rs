use std::{marker::PhantomData, sync::Arc};

use chrono::{DateTime, SubsecRound, Utc};

use crate::{
    connection::Executor,
    entity::Entity,
    error::{Error, MappingError, Result},
    query::QueryBuilder,
    value::Value,
};

/// CRUD over one entity type.
///
/// Every operation is a single autocommit statement run through the bound
/// executor. Pass a [`Transaction`](crate::Transaction) wrapped in an `Arc` to
/// group several operations atomically.
pub struct Repository<T> {
    executor: Arc<dyn Executor>,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new<E: Executor + 'static>(executor: E) -> Self {
        Self::from_arc(Arc::new(executor))
    }

    pub fn from_arc(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            entity: PhantomData,
        }
    }

    pub fn executor(&self) -> &dyn Executor {
        self.executor.as_ref()
    }

    /// A query on the entity's table.
    pub fn query(&self) -> QueryBuilder {
        QueryBuilder::table(T::table_name())
    }

    /// Inserts the entity, stamping both timestamps.
    ///
    /// An unassigned identifier (zero or null) is left out of the INSERT and
    /// replaced by the one the store generates.
    pub async fn create(&self, entity: &mut T) -> Result<()> {
        let now = now();
        entity.set_created_at(now)?;
        entity.set_updated_at(now)?;

        let values = entity.to_values();
        if values.is_empty() {
            return Err(MappingError::NoMappedFields(T::entity_name()).into());
        }

        let id = entity.id();
        let values = values
            .into_iter()
            .filter(|(column, _)| !(*column == T::id_column() && id.is_unassigned_id()))
            .collect();

        let assigned = self
            .query()
            .insert_get_id(self.executor(), values, T::id_column())
            .await?;

        if let (true, Some(new_id)) = (id.is_unassigned_id(), assigned) {
            entity.set_id(new_id)?;
        }

        tracing::debug!(table = T::table_name(), id = ?entity.id(), "entity created");

        Ok(())
    }

    pub async fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<T>> {
        self.find_by_column(T::id_column(), id).await
    }

    pub async fn find_by_id_or_fail(&self, id: impl Into<Value>) -> Result<T> {
        self.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
            table: T::table_name().to_owned(),
        })
    }

    pub async fn find_by_column(&self, column: &str, value: impl Into<Value>) -> Result<Option<T>> {
        self.query()
            .and_where(column, "=", value)
            .first(self.executor())
            .await
    }

    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.query().get(self.executor()).await
    }

    /// All rows matching one raw condition, e.g. `("age > ? AND vip = ?", binds)`.
    pub async fn find_all_where(&self, condition: &str, binds: Vec<Value>) -> Result<Vec<T>> {
        self.query()
            .where_raw(condition, binds)
            .get(self.executor())
            .await
    }

    pub async fn count(&self) -> Result<i64> {
        self.query().count(self.executor()).await
    }

    /// Writes every persisted field except the identifier and creation
    /// timestamp, refreshing `updated_at` first.
    pub async fn update(&self, entity: &mut T) -> Result<u64> {
        let id = self.assigned_id(entity)?;
        entity.set_updated_at(now())?;

        let values = entity
            .to_values()
            .into_iter()
            .filter(|(column, _)| *column != T::id_column() && *column != T::created_at_column())
            .collect();

        self.query()
            .and_where(T::id_column(), "=", id)
            .update(self.executor(), values)
            .await
    }

    pub async fn delete(&self, entity: &T) -> Result<u64> {
        let id = self.assigned_id(entity)?;

        self.query()
            .and_where(T::id_column(), "=", id)
            .delete(self.executor())
            .await
    }

    fn assigned_id(&self, entity: &T) -> Result<Value> {
        let id = entity.id();
        if id.is_unassigned_id() {
            return Err(MappingError::MissingIdentifier(T::entity_name()).into());
        }

        Ok(id)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
