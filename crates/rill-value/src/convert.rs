//! Conversion accessors.
//!
//! Each accessor either succeeds directly, coerces (textual parsing,
//! numeric widening), or fails with a `TypeConversion` failure. Dynamic
//! values are read first and the product converted.

use crate::error::{Failure, ValueResult};
use crate::ty::Type;
use crate::value::Value;
use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;

impl Value {
    /// Integer form. Decimals truncate; strings parse; booleans map to
    /// 0/1; dates yield epoch seconds.
    pub fn to_integer(&self) -> ValueResult<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            Value::Decimal(n) => Ok(*n as i64),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| Failure::conversion(Type::String, Type::Integer)),
            Value::Boolean(b) => Ok(i64::from(*b)),
            Value::Date(d) => Ok(d.timestamp()),
            Value::Dynamic(d) => d.read()?.to_integer(),
            other => Err(Failure::conversion(other.type_of(), Type::Integer)),
        }
    }

    /// Decimal form.
    pub fn to_decimal(&self) -> ValueResult<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Decimal(n) => Ok(*n),
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Failure::conversion(Type::String, Type::Decimal)),
            Value::Boolean(b) => Ok(f64::from(u8::from(*b))),
            Value::Date(d) => Ok(d.timestamp() as f64),
            Value::Dynamic(d) => d.read()?.to_decimal(),
            other => Err(Failure::conversion(other.type_of(), Type::Decimal)),
        }
    }

    /// Boolean form. Strings accept `true`/`false`; numbers are non-zero;
    /// void and nulls are false.
    pub fn to_boolean(&self) -> ValueResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(n) => Ok(*n != 0),
            Value::Decimal(n) => Ok(*n != 0.0),
            Value::Str(s) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Failure::conversion(Type::String, Type::Boolean)),
            },
            Value::Void | Value::Null(_) => Ok(false),
            Value::Dynamic(d) => d.read()?.to_boolean(),
            other => Err(Failure::conversion(other.type_of(), Type::Boolean)),
        }
    }

    /// Date form. Strings parse as RFC 3339; integers are epoch seconds.
    pub fn to_date(&self) -> ValueResult<DateTime<Utc>> {
        match self {
            Value::Date(d) => Ok(*d),
            Value::Str(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| Failure::conversion(Type::String, Type::Date)),
            Value::Integer(n) => Utc
                .timestamp_opt(*n, 0)
                .single()
                .ok_or_else(|| Failure::conversion(Type::Integer, Type::Date)),
            Value::Dynamic(d) => d.read()?.to_date(),
            other => Err(Failure::conversion(other.type_of(), Type::Date)),
        }
    }

    /// List form. Maps become lists of pairs, ranges expand, pairs split,
    /// void and nulls are empty, and any scalar wraps as a singleton.
    pub fn into_list(&self) -> ValueResult<Vec<Value>> {
        match self {
            Value::List(items) => Ok(items.clone()),
            Value::Map(entries) => Ok(entries
                .iter()
                .map(|(k, v)| Value::pair(k.clone(), v.clone()))
                .collect()),
            Value::Pair(kv) => Ok(vec![kv.0.clone(), kv.1.clone()]),
            Value::Range(r) => r.expand(),
            Value::Void | Value::Null(_) => Ok(Vec::new()),
            Value::Dynamic(d) => d.read()?.into_list(),
            other => Ok(vec![other.clone()]),
        }
    }

    /// Map form. Pairs become one-entry maps; objects expose their
    /// fields keyed by name.
    pub fn into_map(&self) -> ValueResult<IndexMap<Value, Value>> {
        match self {
            Value::Map(entries) => Ok(entries.clone()),
            Value::Pair(kv) => {
                let mut m = IndexMap::new();
                m.insert(kv.0.clone(), kv.1.clone());
                Ok(m)
            }
            Value::Object(o) => {
                let mut m = IndexMap::new();
                for (name, value, _) in o.snapshot() {
                    m.insert(Value::Str(name), value);
                }
                Ok(m)
            }
            Value::Dynamic(d) => d.read()?.into_map(),
            other => Err(Failure::conversion(other.type_of(), Type::Map)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_coercions() {
        assert_eq!(Value::from("42").to_integer().unwrap(), 42);
        assert_eq!(Value::from(" 42 ").to_integer().unwrap(), 42);
        assert_eq!(Value::from("2.5").to_decimal().unwrap(), 2.5);
        assert!(Value::from("forty-two").to_integer().is_err());
    }

    #[test]
    fn boolean_coercions() {
        assert!(Value::from(1).to_boolean().unwrap());
        assert!(!Value::Void.to_boolean().unwrap());
        assert!(Value::from("maybe").to_boolean().is_err());
    }

    #[test]
    fn date_round_trips_through_text() {
        let d = Utc.with_ymd_and_hms(2014, 9, 11, 7, 30, 0).unwrap();
        let v = Value::Date(d);
        assert_eq!(Value::from(v.to_text()).to_date().unwrap(), d);
    }

    #[test]
    fn scalar_wraps_as_singleton_list() {
        assert_eq!(Value::from(7).into_list().unwrap(), vec![Value::from(7)]);
        assert!(Value::Void.into_list().unwrap().is_empty());
    }

    #[test]
    fn map_from_pair() {
        let m = Value::pair("k", 1).into_map().unwrap();
        assert_eq!(m.get(&Value::from("k")), Some(&Value::from(1)));
    }

    #[test]
    fn map_conversion_rejected_for_scalars() {
        assert!(Value::from(1).into_map().is_err());
    }
}
