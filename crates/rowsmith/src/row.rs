//! Row mapping traits and utilities

use crate::error::{Error, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tokio_postgres::types::{FromSql, Kind, Type};

/// A flat, ordered field → value map.
///
/// Inserting a key that already exists overwrites the value in place, so the
/// last write wins and the original column position is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set `key` to `value`, replacing any previous value for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder-style [`Record::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, returning its value.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(pos).1)
    }

    /// Typed access to a column.
    ///
    /// A missing column decodes like `NULL`, so `Option<T>` targets yield `None`.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<T> {
        T::from_value(key, self.get(key).unwrap_or(&Value::Null))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply `f` to every value, stopping at the first error.
    pub fn try_map_values(self, mut f: impl FnMut(Value) -> Result<Value>) -> Result<Self> {
        let fields = self
            .fields
            .into_iter()
            .map(|(k, v)| Ok((k, f(v)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Decode a single column value.
pub trait FromValue: Sized {
    fn from_value(column: &str, value: &Value) -> Result<Self>;
}

fn mismatch(column: &str, expected: &str, value: &Value) -> Error {
    Error::decode(column, format!("expected {expected}, got {}", value.kind()))
}

impl FromValue for Value {
    fn from_value(_column: &str, value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| mismatch(column, "integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        let v = i64::from_value(column, value)?;
        i32::try_from(v).map_err(|e| Error::decode(column, e.to_string()))
    }
}

impl FromValue for f64 {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch(column, "real", value))
    }
}

impl FromValue for bool {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch(column, "bool", value))
    }
}

impl FromValue for String {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }
}

impl FromValue for Vec<u8> {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(mismatch(column, "blob", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(column, "timestamp", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(column: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(column, other).map(Some),
        }
    }
}

/// Trait for types that can be built from a decoded [`Record`].
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> Result<Self>;
}

impl FromRecord for Record {
    fn from_record(record: Record) -> Result<Self> {
        Ok(record)
    }
}

/// Trait for insertable types: the columns and values to write.
///
/// Absent optional columns should simply be left out of the record so the
/// storage engine applies its defaults.
pub trait IntoRecord {
    fn into_record(self) -> Record;
}

impl IntoRecord for Record {
    fn into_record(self) -> Record {
        self
    }
}

// ==================== PostgreSQL rows ====================

/// Convert a `tokio_postgres` row into a [`Record`], keyed by column name.
///
/// Types without a native mapping (`uuid`, `numeric`, ...) are kept as their
/// binary wire form in a [`Value::Blob`]; enum labels come back as text.
pub(crate) fn record_from_pg_row(row: &tokio_postgres::Row) -> Result<Record> {
    let mut record = Record::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let decode = |e: tokio_postgres::Error| Error::decode(name, e.to_string());
        let value = match *column.type_() {
            Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(decode)?.map(Value::Bool),
            Type::INT2 => row.try_get::<_, Option<i16>>(idx).map_err(decode)?.map(Value::from),
            Type::INT4 => row.try_get::<_, Option<i32>>(idx).map_err(decode)?.map(Value::from),
            Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(decode)?.map(Value::from),
            Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx).map_err(decode)?.map(Value::from),
            Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(decode)?.map(Value::from),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(idx)
                .map_err(decode)?
                .map(Value::Text),
            Type::BYTEA => row
                .try_get::<_, Option<Vec<u8>>>(idx)
                .map_err(decode)?
                .map(Value::Blob),
            Type::TIMESTAMP => row
                .try_get::<_, Option<NaiveDateTime>>(idx)
                .map_err(decode)?
                .map(|dt| Value::Timestamp(dt.and_utc())),
            Type::TIMESTAMPTZ => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)
                .map_err(decode)?
                .map(Value::Timestamp),
            Type::DATE => row
                .try_get::<_, Option<NaiveDate>>(idx)
                .map_err(decode)?
                .map(Value::from),
            Type::TIME => row
                .try_get::<_, Option<NaiveTime>>(idx)
                .map_err(decode)?
                .map(|t| Value::Text(t.format("%H:%M:%S").to_string())),
            Type::JSON | Type::JSONB => row
                .try_get::<_, Option<serde_json::Value>>(idx)
                .map_err(decode)?
                .map(|j| Value::Text(j.to_string())),
            ref other => row
                .try_get::<_, Option<RawBytes>>(idx)
                .map_err(decode)?
                .map(|raw| raw_value(other, raw.0)),
        };
        record.insert(name, value.unwrap_or(Value::Null));
    }
    Ok(record)
}

/// Undecoded column payload.
struct RawBytes(Vec<u8>);

impl<'a> FromSql<'a> for RawBytes {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(RawBytes(raw.to_vec()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn raw_value(ty: &Type, raw: Vec<u8>) -> Value {
    match ty.kind() {
        Kind::Enum(_) => match String::from_utf8(raw) {
            Ok(label) => Value::Text(label),
            Err(e) => Value::Blob(e.into_bytes()),
        },
        _ => Value::Blob(raw),
    }
}
