use keel_core::{Error, Value};
use mysql_async::{FromValueError, prelude::FromValue};
use time::{Date, Month, PrimitiveDateTime, Time};

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<mysql_async::Value> for ValueWrap {
    type Error = FromValueError;

    fn try_from(value: mysql_async::Value) -> Result<Self, Self::Error> {
        type MySQLValue = mysql_async::Value;
        Ok(match value {
            MySQLValue::NULL => Value::Null,
            MySQLValue::Bytes(v) => Value::Blob(Some(v.into())),
            MySQLValue::Int(v) => Value::Int64(Some(v)),
            MySQLValue::UInt(v) => Value::UInt64(Some(v)),
            MySQLValue::Float(v) => Value::Float32(Some(v)),
            MySQLValue::Double(v) => Value::Float64(Some(v)),
            MySQLValue::Date(year, month, day, hour, minute, second, micro) => {
                let date = Month::try_from(month)
                    .ok()
                    .and_then(|month| Date::from_calendar_date(year as _, month, day).ok());
                let time = Time::from_hms_micro(hour, minute, second, micro).ok();
                match (date, time) {
                    (Some(date), Some(time)) => {
                        Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))
                    }
                    _ => return Err(FromValueError(value)),
                }
            }
            MySQLValue::Time(false, 0, hours, minutes, seconds, micro) => {
                match Time::from_hms_micro(hours, minutes, seconds, micro) {
                    Ok(v) => Value::Time(Some(v)),
                    Err(..) => return Err(FromValueError(value)),
                }
            }
            // Negative or multi-day durations have no time-of-day counterpart
            MySQLValue::Time(..) => return Err(FromValueError(value)),
        }
        .into())
    }
}

impl TryFrom<ValueWrap> for mysql_async::Value {
    type Error = Error;

    fn try_from(value: ValueWrap) -> Result<Self, Self::Error> {
        type MySQLValue = mysql_async::Value;
        Ok(match value.0 {
            ref v if v.is_null() => MySQLValue::NULL,
            Value::Boolean(Some(v)) => MySQLValue::from(v),
            Value::Int8(Some(v)) => MySQLValue::from(v),
            Value::Int16(Some(v)) => MySQLValue::from(v),
            Value::Int32(Some(v)) => MySQLValue::from(v),
            Value::Int64(Some(v)) => MySQLValue::from(v),
            Value::UInt8(Some(v)) => MySQLValue::from(v),
            Value::UInt16(Some(v)) => MySQLValue::from(v),
            Value::UInt32(Some(v)) => MySQLValue::from(v),
            Value::UInt64(Some(v)) => MySQLValue::from(v),
            Value::Float32(Some(v)) => MySQLValue::from(v),
            Value::Float64(Some(v)) => MySQLValue::from(v),
            Value::Decimal(Some(v)) => MySQLValue::from(v),
            Value::Varchar(Some(v)) => MySQLValue::from(v),
            Value::Blob(Some(v)) => MySQLValue::Bytes(v.into_vec()),
            Value::Date(Some(v)) => MySQLValue::from(v),
            Value::Time(Some(v)) => MySQLValue::from(v),
            Value::Timestamp(Some(v)) => {
                if !(0..=9999).contains(&v.year()) {
                    return Err(Error::msg(format!("Timestamp {v} is out of range for MySQL")));
                }
                MySQLValue::from(v)
            }
            Value::Uuid(Some(v)) => MySQLValue::from(v.hyphenated().to_string()),
            Value::Json(Some(v)) => MySQLValue::from(v.to_string()),
            ref v => {
                return Err(Error::msg(format!(
                    "keel::Value variant `{v:?}` is not supported by MySQL"
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mysql() {
        let value = ValueWrap::try_from(mysql_async::Value::Date(2024, 2, 29, 13, 45, 10, 0))
            .expect("Timestamp should decode");
        assert_eq!(
            value.0,
            Value::Timestamp(Some(PrimitiveDateTime::new(
                Date::from_calendar_date(2024, Month::February, 29).unwrap(),
                Time::from_hms(13, 45, 10).unwrap(),
            )))
        );
        let value = ValueWrap::try_from(mysql_async::Value::Time(false, 0, 8, 30, 0, 0))
            .expect("Time should decode");
        assert_eq!(value.0, Value::Time(Some(Time::from_hms(8, 30, 0).unwrap())));
        assert!(ValueWrap::try_from(mysql_async::Value::Time(true, 0, 8, 30, 0, 0)).is_err());
        assert!(ValueWrap::try_from(mysql_async::Value::Time(false, 2, 8, 30, 0, 0)).is_err());
        assert!(ValueWrap::try_from(mysql_async::Value::Date(2024, 13, 1, 0, 0, 0, 0)).is_err());
        assert_eq!(
            ValueWrap::try_from(mysql_async::Value::Bytes(b"abc".to_vec()))
                .unwrap()
                .0,
            Value::Blob(Some(b"abc".to_vec().into()))
        );
    }

    #[test]
    fn to_mysql() {
        let convert = |v: Value| mysql_async::Value::try_from(ValueWrap(v));
        assert_eq!(
            convert(Value::Int32(None)).unwrap(),
            mysql_async::Value::NULL
        );
        assert_eq!(
            convert(Value::Varchar(Some("barv".into()))).unwrap(),
            mysql_async::Value::Bytes(b"barv".to_vec())
        );
        assert_eq!(
            convert(Value::Json(Some(serde_json::json!({"a": 1})))).unwrap(),
            mysql_async::Value::Bytes(br#"{"a":1}"#.to_vec())
        );
        assert!(convert(Value::List(Some(vec![Value::Int64(Some(1))]))).is_err());
    }
}
