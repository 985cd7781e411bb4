use crate::{Error, Result, Value, truncate_long};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::{any, str::FromStr};
use time::{
    Date, PrimitiveDateTime, Time, format_description::BorrowedFormatItem, macros::format_description,
};
use uuid::Uuid;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]");
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Every column field of a model implements it: `as_value` produces query
/// parameters, `try_from_value` decodes what the backend returns. Decoding is
/// lenient about the wire representation, the text protocol delivers numbers,
/// decimals and dates as bytes, so textual forms are parsed as well.
///
/// ```rust
/// use keel_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int32(Some(42)));
/// let n = i64::try_from_value(Value::Blob(Some(b"42".to_vec().into()))).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// Typed NULL for this type.
    fn as_empty_value() -> Value;
    /// Owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Decode a dynamic value, range checking numeric conversions.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn mismatch<T>(value: &Value) -> Error {
    if value.is_null() {
        Error::msg(format!(
            "Cannot decode NULL into {}, use an Option field for nullable columns",
            any::type_name::<T>()
        ))
    } else {
        Error::msg(format!(
            "Cannot decode {} into {}",
            truncate_long!(value.to_string()),
            any::type_name::<T>()
        ))
    }
}

fn text(value: &Value) -> Option<Result<&str>> {
    match value {
        Value::Varchar(Some(v)) => Some(Ok(v.as_str())),
        Value::Blob(Some(v)) => Some(std::str::from_utf8(v).map_err(|e| {
            Error::new(e).context("The column bytes are not a valid UTF-8 string")
        })),
        _ => None,
    }
}

fn parse_text<T: FromStr>(value: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse::<T>().map_err(|e| {
        Error::new(e).context(format!(
            "Cannot parse `{}` as {}",
            truncate_long!(value),
            any::type_name::<T>()
        ))
    })
}

macro_rules! impl_as_value_integer {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Some(v) = value.as_i128() {
                    return <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v} is out of range for {}",
                            any::type_name::<Self>()
                        ))
                    });
                }
                if let Some(v) = text(&value) {
                    return parse_text(v?);
                }
                match value {
                    Value::Boolean(Some(v)) => Ok(v as _),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_integer!(i8, Value::Int8);
impl_as_value_integer!(i16, Value::Int16);
impl_as_value_integer!(i32, Value::Int32);
impl_as_value_integer!(i64, Value::Int64);
impl_as_value_integer!(u8, Value::UInt8);
impl_as_value_integer!(u16, Value::UInt16);
impl_as_value_integer!(u32, Value::UInt32);
impl_as_value_integer!(u64, Value::UInt64);

macro_rules! impl_as_value_float {
    ($source:ty, $variant:path, $from_decimal:ident) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                if let Some(v) = value.as_i128() {
                    return Ok(v as _);
                }
                if let Some(v) = text(&value) {
                    return parse_text(v?);
                }
                match value {
                    Value::Float32(Some(v)) => Ok(v as _),
                    Value::Float64(Some(v)) => Ok(v as _),
                    Value::Decimal(Some(v)) => v.$from_decimal().ok_or_else(|| {
                        Error::msg(format!(
                            "Decimal {v} is out of range for {}",
                            any::type_name::<Self>()
                        ))
                    }),
                    _ => Err(mismatch::<Self>(&value)),
                }
            }
        }
    };
}

impl_as_value_float!(f32, Value::Float32, to_f32);
impl_as_value_float!(f64, Value::Float64, to_f64);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_i128() {
            return Ok(v != 0);
        }
        if let Some(v) = text(&value) {
            return match v?.trim() {
                "1" | "true" | "TRUE" => Ok(true),
                "0" | "false" | "FALSE" => Ok(false),
                _ => Err(mismatch::<Self>(&value)),
            };
        }
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = value.as_i128() {
            return Decimal::from_i128(v).ok_or_else(|| mismatch::<Self>(&value));
        }
        if let Some(v) = text(&value) {
            return parse_text(v?);
        }
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Decimal::from_f32(v).ok_or_else(|| mismatch::<Self>(&value)),
            Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| mismatch::<Self>(&value)),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(Some(v)) => Ok(v),
            Value::Blob(Some(v)) => String::from_utf8(v.into_vec()).map_err(|e| {
                Error::new(e).context("The column bytes are not a valid UTF-8 string")
            }),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

/// Parameter only: borrowed strings cannot be decoded.
impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
    fn try_from_value(_value: Value) -> Result<Self> {
        Err(Error::msg(
            "Cannot decode a value into a borrowed &str, use String instead",
        ))
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_empty_value() -> Value {
        Value::Date(None)
    }
    fn as_value(self) -> Value {
        Value::Date(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = text(&value) {
            let v = v?;
            return Date::parse(v.trim(), DATE_FORMAT)
                .or_else(|_| PrimitiveDateTime::parse(v.trim(), TIMESTAMP_FORMAT).map(|v| v.date()))
                .map_err(|_| mismatch::<Self>(&value));
        }
        match value {
            Value::Date(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.date()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Time {
    fn as_empty_value() -> Value {
        Value::Time(None)
    }
    fn as_value(self) -> Value {
        Value::Time(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = text(&value) {
            return Time::parse(v?.trim(), TIME_FORMAT).map_err(|_| mismatch::<Self>(&value));
        }
        match value {
            Value::Time(Some(v)) => Ok(v),
            Value::Timestamp(Some(v)) => Ok(v.time()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_empty_value() -> Value {
        Value::Timestamp(None)
    }
    fn as_value(self) -> Value {
        Value::Timestamp(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if let Some(v) = text(&value) {
            return PrimitiveDateTime::parse(v?.trim(), TIMESTAMP_FORMAT)
                .map_err(|_| mismatch::<Self>(&value));
        }
        match value {
            Value::Timestamp(Some(v)) => Ok(v),
            Value::Date(Some(v)) => Ok(v.midnight()),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Blob(Some(ref v)) if v.len() == 16 => {
                Uuid::from_slice(v).map_err(|_| mismatch::<Self>(&value))
            }
            _ => match text(&value) {
                Some(v) => parse_text(v?),
                None => Err(mismatch::<Self>(&value)),
            },
        }
    }
}

impl AsValue for serde_json::Value {
    fn as_empty_value() -> Value {
        Value::Json(None)
    }
    fn as_value(self) -> Value {
        Value::Json(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(serde_json::Value::Null);
        }
        if let Some(v) = text(&value) {
            return serde_json::from_str(v?).map_err(|e| {
                Error::new(e).context("The column content is not a valid JSON document")
            });
        }
        match value {
            Value::Json(Some(v)) => Ok(v),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None)
    }
    fn as_value(self) -> Value {
        Value::List(Some(self.into_iter().map(AsValue::as_value).collect()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(Some(v)) => v.into_iter().map(T::try_from_value).collect(),
            _ => Err(mismatch::<Self>(&value)),
        }
    }
}

/// Parameter only, used to feed `IN` conditions from borrowed keys.
impl<T: AsValue + Clone> AsValue for &[T] {
    fn as_empty_value() -> Value {
        Value::List(None)
    }
    fn as_value(self) -> Value {
        Value::List(Some(self.iter().cloned().map(AsValue::as_value).collect()))
    }
    fn try_from_value(_value: Value) -> Result<Self> {
        Err(Error::msg(
            "Cannot decode a value into a borrowed slice, use Vec instead",
        ))
    }
}

impl<T: AsValue, const N: usize> AsValue for [T; N] {
    fn as_empty_value() -> Value {
        Value::List(None)
    }
    fn as_value(self) -> Value {
        Value::List(Some(self.into_iter().map(AsValue::as_value).collect()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        let values = Vec::<T>::try_from_value(value)?;
        let len = values.len();
        values.try_into().map_err(|_| {
            Error::msg(format!(
                "Expected a list of {N} elements for {}, found {len}",
                any::type_name::<Self>()
            ))
        })
    }
}
