use rust_decimal::Decimal;
use std::fmt;
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed column value used for query parameters and row decoding.
///
/// Every variant carries an `Option`: `None` is the typed SQL `NULL`, while
/// [`Value::Null`] is the untyped one coming from the backend.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
    Json(Option<serde_json::Value>),
    /// Sequence of values, expanded into one placeholder per element by `IN` conditions.
    List(Option<Vec<Value>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null
            | Value::Boolean(None)
            | Value::Int8(None)
            | Value::Int16(None)
            | Value::Int32(None)
            | Value::Int64(None)
            | Value::UInt8(None)
            | Value::UInt16(None)
            | Value::UInt32(None)
            | Value::UInt64(None)
            | Value::Float32(None)
            | Value::Float64(None)
            | Value::Decimal(None)
            | Value::Varchar(None)
            | Value::Blob(None)
            | Value::Date(None)
            | Value::Time(None)
            | Value::Timestamp(None)
            | Value::Uuid(None)
            | Value::Json(None)
            | Value::List(None) => true,
            _ => false,
        }
    }

    /// True when the value equals the zero value of its Rust type.
    ///
    /// Columns marked `omitempty` (and primary keys) holding a zero value are
    /// left out of inserts and updates so the database default applies.
    pub fn is_zero(&self) -> bool {
        match self {
            v if v.is_null() => true,
            Value::Boolean(Some(v)) => !*v,
            Value::Int8(Some(v)) => *v == 0,
            Value::Int16(Some(v)) => *v == 0,
            Value::Int32(Some(v)) => *v == 0,
            Value::Int64(Some(v)) => *v == 0,
            Value::UInt8(Some(v)) => *v == 0,
            Value::UInt16(Some(v)) => *v == 0,
            Value::UInt32(Some(v)) => *v == 0,
            Value::UInt64(Some(v)) => *v == 0,
            Value::Float32(Some(v)) => *v == 0.0,
            Value::Float64(Some(v)) => *v == 0.0,
            Value::Decimal(Some(v)) => v.is_zero(),
            Value::Varchar(Some(v)) => v.is_empty(),
            Value::Blob(Some(v)) => v.is_empty(),
            Value::Uuid(Some(v)) => v.is_nil(),
            Value::Json(Some(v)) => v.is_null(),
            Value::List(Some(v)) => v.is_empty(),
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::Int8(..)
                | Value::Int16(..)
                | Value::Int32(..)
                | Value::Int64(..)
                | Value::UInt8(..)
                | Value::UInt16(..)
                | Value::UInt32(..)
                | Value::UInt64(..)
        )
    }

    /// Integer content widened to `i128`, `None` for null or non integer values.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Int8(Some(v)) => Some(*v as _),
            Value::Int16(Some(v)) => Some(*v as _),
            Value::Int32(Some(v)) => Some(*v as _),
            Value::Int64(Some(v)) => Some(*v as _),
            Value::UInt8(Some(v)) => Some(*v as _),
            Value::UInt16(Some(v)) => Some(*v as _),
            Value::UInt32(Some(v)) => Some(*v as _),
            Value::UInt64(Some(v)) => Some(*v as _),
            _ => None,
        }
    }

    /// Flattens a list into its elements, any other value is a single element.
    pub fn into_elements(self) -> Vec<Value> {
        match self {
            Value::List(Some(v)) => v,
            Value::List(None) => Vec::new(),
            v => vec![v],
        }
    }

    /// Number of placeholders this value fills inside an `IN (...)` clause.
    pub fn elements_len(&self) -> usize {
        match self {
            Value::List(Some(v)) => v.len(),
            Value::List(None) => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            v if v.is_null() => f.write_str("NULL"),
            Value::Boolean(Some(v)) => write!(f, "{v}"),
            Value::Int8(Some(v)) => write!(f, "{v}"),
            Value::Int16(Some(v)) => write!(f, "{v}"),
            Value::Int32(Some(v)) => write!(f, "{v}"),
            Value::Int64(Some(v)) => write!(f, "{v}"),
            Value::UInt8(Some(v)) => write!(f, "{v}"),
            Value::UInt16(Some(v)) => write!(f, "{v}"),
            Value::UInt32(Some(v)) => write!(f, "{v}"),
            Value::UInt64(Some(v)) => write!(f, "{v}"),
            Value::Float32(Some(v)) => write!(f, "{v}"),
            Value::Float64(Some(v)) => write!(f, "{v}"),
            Value::Decimal(Some(v)) => write!(f, "{v}"),
            Value::Varchar(Some(v)) => write!(f, "'{v}'"),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Date(Some(v)) => write!(f, "'{v}'"),
            Value::Time(Some(v)) => write!(f, "'{v}'"),
            Value::Timestamp(Some(v)) => write!(f, "'{v}'"),
            Value::Uuid(Some(v)) => write!(f, "'{v}'"),
            Value::Json(Some(v)) => write!(f, "'{v}'"),
            Value::List(Some(v)) => {
                f.write_str("[")?;
                for (i, v) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            _ => unreachable!(),
        }
    }
}
