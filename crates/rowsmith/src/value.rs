//! Dynamic scalar values carried in statement parameters and result rows.

use crate::temporal;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A single column value.
///
/// `Timestamp` never reaches the storage engine from the compilers: it is
/// rendered to canonical temporal text before binding and decoded back on read.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view; SQLite-style `0`/`1` integers are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Integer(0) => Some(false),
            Value::Integer(1) => Some(true),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Short type name used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Blob(_) => "blob",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(v.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Operand of a numeric update operator.
///
/// Only numbers convert into `Number`, so `increment`/`multiply`/... on a
/// text or temporal value does not type-check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Real(f64),
}

macro_rules! impl_number_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Number {
                fn from(v: $t) -> Self {
                    Number::Integer(i64::from(v))
                }
            }
        )*
    };
}

impl_number_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Number {
    fn from(v: f32) -> Self {
        Number::Real(f64::from(v))
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Real(v)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Integer(v) => Value::Integer(v),
            Number::Real(v) => Value::Real(v),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(v) => serializer.serialize_i64(*v),
            Value::Real(v) => serializer.serialize_f64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Blob(b) => serializer.serialize_bytes(b),
            Value::Timestamp(dt) => {
                serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

// ==================== PostgreSQL binding ====================

// Values are bound against whatever type the server inferred for the
// placeholder, so integers are narrowed and canonical temporal text is parsed
// when the target column is a native date/timestamp. Anything else goes
// through the inner type's own check and fails with `WrongType`.
impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::BOOL => (*v != 0).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Real(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    Value::Integer(integral(*v)?).to_sql(ty, out)
                }
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(s) => match *ty {
                Type::TIMESTAMP => temporal::parse(s)?.naive_utc().to_sql(ty, out),
                Type::TIMESTAMPTZ => temporal::parse(s)?.to_sql(ty, out),
                Type::DATE => temporal::parse(s)?.date_naive().to_sql(ty, out),
                _ => s.as_str().to_sql_checked(ty, out),
            },
            Value::Bool(b) => b.to_sql_checked(ty, out),
            Value::Blob(b) => b.as_slice().to_sql_checked(ty, out),
            Value::Timestamp(dt) => match *ty {
                Type::TIMESTAMP => dt.naive_utc().to_sql(ty, out),
                Type::TIMESTAMPTZ => dt.to_sql(ty, out),
                Type::DATE => dt.date_naive().to_sql(ty, out),
                _ => temporal::serialize(dt).as_str().to_sql_checked(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// A real bound to an integer column must have no fractional part.
fn integral(v: f64) -> std::result::Result<i64, Box<dyn std::error::Error + Sync + Send>> {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Ok(v as i64)
    } else {
        Err(format!("cannot bind {v} to an integer column").into())
    }
}
