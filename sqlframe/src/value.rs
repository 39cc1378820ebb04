//! Driver-neutral values and rows.
//!
//! Every bind handed to the query builder and every cell read back from the
//! store passes through [`Value`], which keeps the builder, the repository and
//! the migration engine independent of the active driver.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::error::MappingError;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Json(_) => "json",
        }
    }

    /// Whether an identifier holding this value has been assigned by the store.
    pub fn is_unassigned_id(&self) -> bool {
        matches!(self, Value::Null | Value::Int(0))
    }

    fn mismatch(&self, expected: &'static str) -> MappingError {
        MappingError::TypeMismatch {
            column: String::new(),
            expected,
            found: self.kind(),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::String(value.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Json(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a stored [`Value`] back into an entity field type.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, MappingError>;
}

macro_rules! impl_from_value_int {
    ($($ty:ty => $name:literal),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, MappingError> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|_| value_out_of_range($name)),
                        Value::Bool(v) => Ok(<$ty>::from(v)),
                        Value::String(ref s) => s.parse::<$ty>().map_err(|_| value.mismatch($name)),
                        other => Err(other.mismatch($name)),
                    }
                }
            }
        )*
    };
}

fn value_out_of_range(expected: &'static str) -> MappingError {
    MappingError::TypeMismatch {
        column: String::new(),
        expected,
        found: "out of range number",
    }
}

impl_from_value_int!(
    i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64",
    u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64"
);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            other => Err(other.mismatch("bool")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Decimal(v) => f64::try_from(v).map_err(|_| value_out_of_range("f64")),
            Value::String(ref s) => s.parse().map_err(|_| value.mismatch("f64")),
            other => Err(other.mismatch("f64")),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Decimal(v) => Ok(v),
            Value::Int(v) => Ok(Decimal::from(v)),
            Value::Float(v) => Decimal::try_from(v).map_err(|_| value_out_of_range("decimal")),
            Value::String(ref s) => s.parse().map_err(|_| value.mismatch("decimal")),
            other => Err(other.mismatch("decimal")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::String(v) => Ok(v),
            Value::Decimal(v) => Ok(v.to_string()),
            Value::Bytes(v) => String::from_utf8(v).map_err(|_| MappingError::TypeMismatch {
                column: String::new(),
                expected: "string",
                found: "non utf-8 bytes",
            }),
            other => Err(other.mismatch("string")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Bytes(v) => Ok(v),
            Value::String(v) => Ok(v.into_bytes()),
            other => Err(other.mismatch("bytes")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::DateTime(v) => Ok(v),
            Value::Date(v) => Ok(v.and_time(chrono::NaiveTime::MIN).and_utc()),
            other => Err(other.mismatch("datetime")),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        DateTime::<Utc>::from_value(value).map(|v| v.naive_utc())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Date(v) => Ok(v),
            Value::DateTime(v) => Ok(v.date_naive()),
            other => Err(other.mismatch("date")),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Json(v) => Ok(v),
            Value::String(ref s) => serde_json::from_str(s).map_err(|_| value.mismatch("json")),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(other.mismatch("json")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, MappingError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// One result row: column names paired with decoded values, in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Looks a column up by name, ignoring ASCII case.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }

    /// Decodes a column into `T`; a missing column decodes as `Null`.
    pub fn try_get<T: FromValue>(&self, column: &str) -> Result<T, MappingError> {
        T::from_value(self.get(column).cloned().unwrap_or_default())
            .map_err(|e| e.in_column(column))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_columns(self) -> impl Iterator<Item = (String, Value)> {
        self.columns.into_iter()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
