use chrono::{DateTime, Utc};

use crate::{
    error::MappingError,
    value::{Row, Value},
};

/// Persistence metadata for one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// Column the field maps to, `None` when the field is excluded.
    pub column: Option<&'static str>,
}

impl Field {
    pub const fn new(name: &'static str, column: Option<&'static str>) -> Self {
        Self { name, column }
    }

    pub fn is_persisted(&self) -> bool {
        self.column.is_some()
    }
}

/// A record type with a numeric identity and creation/update timestamps.
///
/// Implemented with `#[derive(Entity)]`:
///
/// ```rust,ignore
/// #[derive(Debug, Default, Entity)]
/// #[entity(table = "users")]
/// pub struct User {
///     pub id: i64,
///     pub name: String,
///     pub email: String,
///     #[entity(column = "password_hash")]
///     pub password: String,
///     #[entity(skip)]
///     pub remember: bool,
///     pub created_at: Option<DateTime<Utc>>,
///     pub updated_at: Option<DateTime<Utc>>,
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// Rust type name, used in error messages.
    fn entity_name() -> &'static str;

    fn table_name() -> &'static str;

    /// Field descriptors in declaration order.
    fn fields() -> &'static [Field];

    fn id_column() -> &'static str {
        "id"
    }

    fn created_at_column() -> &'static str {
        "created_at"
    }

    fn updated_at_column() -> &'static str {
        "updated_at"
    }

    fn id(&self) -> Value;

    /// Persisted `(column, value)` pairs in declaration order.
    fn to_values(&self) -> Vec<(&'static str, Value)>;

    /// Assigns a decoded value to the field mapped to `column`.
    fn set_value(&mut self, column: &str, value: Value) -> Result<(), MappingError>;

    fn set_id(&mut self, id: i64) -> Result<(), MappingError> {
        self.set_value(Self::id_column(), Value::Int(id))
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) -> Result<(), MappingError> {
        self.set_value(Self::created_at_column(), Value::DateTime(at))
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) -> Result<(), MappingError> {
        self.set_value(Self::updated_at_column(), Value::DateTime(at))
    }

    /// Persisted column names in declaration order.
    fn columns() -> Vec<&'static str> {
        Self::fields().iter().filter_map(|f| f.column).collect()
    }
}

/// Builds one `T` from a row.
///
/// Columns are matched to persisted fields ignoring ASCII case; columns with
/// no matching field are skipped.
pub fn materialize_row<T: Entity>(row: Row) -> Result<T, MappingError> {
    let mut entity = T::default();

    for (name, value) in row.into_columns() {
        let column = T::fields()
            .iter()
            .filter_map(|f| f.column)
            .find(|column| column.eq_ignore_ascii_case(&name));

        if let Some(column) = column {
            entity.set_value(column, value)?;
        }
    }

    Ok(entity)
}

/// Appends one `T` per row to `dest`.
pub fn materialize_rows<T: Entity>(rows: Vec<Row>, dest: &mut Vec<T>) -> Result<(), MappingError> {
    dest.reserve(rows.len());

    for row in rows {
        dest.push(materialize_row(row)?);
    }

    Ok(())
}
