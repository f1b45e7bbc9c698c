//! Textual serialization.
//!
//! Values encode to JSON text. Variants with a natural JSON shape
//! (Integer, Decimal, String, Boolean, List, Map) encode plainly;
//! everything else uses a `$type`-tagged envelope so the round trip
//! preserves the variant. A Map whose keys are not all textual scalars
//! also takes an envelope, carrying its entries as an explicit list.
//! `deserialize(serialize(v)) == v` holds for every representable value.

use crate::error::{ErrorKind, Failure, ValueResult};
use crate::object::ObjectValue;
use crate::range::RangeValue;
use crate::ty::Type;
use crate::uri::Uri;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde_json::{json, Map as JsonMap, Number};

const TYPE_KEY: &str = "$type";
const VALUE_KEY: &str = "value";
const TEXT_KEY: &str = "text";
const LOWER_KEY: &str = "lower";
const UPPER_KEY: &str = "upper";

/// Encode a value as JSON text.
pub fn serialize(value: &Value) -> String {
    to_json(value).to_string()
}

/// Decode JSON text produced by [`serialize`].
pub fn deserialize(text: &str) -> ValueResult<Value> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Failure::new(ErrorKind::TypeConversion, format!("could not deserialize: {e}")))?;
    from_json(&json)
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Integer(n) => json!(n),
        Value::Decimal(n) => match Number::from_f64(*n) {
            Some(num) => serde_json::Value::Number(num),
            // Non-finite decimals need the envelope.
            None => json!({ TYPE_KEY: "DECIMAL", TEXT_KEY: n.to_string() }),
        },
        Value::Str(s) => json!(s),
        Value::Boolean(b) => json!(b),
        Value::List(items) => {
            serde_json::Value::Array(items.iter().map(to_json).collect())
        }
        Value::Map(entries) => {
            // Plain JSON objects can only carry textual keys. Scalar
            // keys survive that flattening through cross-type equality;
            // anything else needs the entry-list envelope.
            if entries.keys().all(Value::coercible) {
                let mut obj = JsonMap::new();
                for (k, v) in entries {
                    obj.insert(k.to_text(), to_json(v));
                }
                serde_json::Value::Object(obj)
            } else {
                let pairs: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| json!({ "key": to_json(k), VALUE_KEY: to_json(v) }))
                    .collect();
                json!({ TYPE_KEY: "MAP", VALUE_KEY: pairs })
            }
        }
        Value::Pair(kv) => json!({
            TYPE_KEY: "PAIR",
            "key": to_json(&kv.0),
            VALUE_KEY: to_json(&kv.1),
        }),
        Value::Range(r) => json!({
            TYPE_KEY: "RANGE",
            LOWER_KEY: to_json(&r.lower),
            UPPER_KEY: to_json(&r.upper),
        }),
        Value::Date(d) => json!({ TYPE_KEY: "DATE", TEXT_KEY: d.to_rfc3339() }),
        Value::Uri(u) => json!({ TYPE_KEY: "URI", VALUE_KEY: u.as_str() }),
        Value::Void => json!({ TYPE_KEY: "VOID" }),
        Value::Null(expected) => json!({ TYPE_KEY: "NULL", "of": expected.name() }),
        Value::Failure(f) => json!({
            TYPE_KEY: "ERROR",
            "kind": f.kind.to_string(),
            VALUE_KEY: f.message,
            "fatal": f.fatal,
        }),
        // Dynamics serialize as the value they produce.
        Value::Dynamic(d) => match d.read() {
            Ok(v) => to_json(&v),
            Err(f) => to_json(&Value::Failure(Box::new(f))),
        },
        Value::Object(o) => {
            let mut fields = JsonMap::new();
            let mut readonly = Vec::new();
            for (name, v, ro) in o.snapshot() {
                if ro {
                    readonly.push(json!(name));
                }
                fields.insert(name, to_json(&v));
            }
            json!({
                TYPE_KEY: "OBJECT",
                "name": o.name,
                "mutable": o.mutable,
                VALUE_KEY: serde_json::Value::Object(fields),
                "readonly": readonly,
            })
        }
    }
}

fn from_json(json: &serde_json::Value) -> ValueResult<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null(Type::Any)),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Decimal(f))
            } else {
                Err(bad("unrepresentable number"))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_json(item)?);
            }
            Ok(Value::List(out))
        }
        serde_json::Value::Object(obj) => match obj.get(TYPE_KEY).and_then(|t| t.as_str()) {
            None => {
                let mut entries = indexmap::IndexMap::new();
                for (k, v) in obj {
                    entries.insert(Value::Str(k.clone()), from_json(v)?);
                }
                Ok(Value::Map(entries))
            }
            Some(tag) => from_envelope(tag, obj),
        },
    }
}

fn from_envelope(tag: &str, obj: &JsonMap<String, serde_json::Value>) -> ValueResult<Value> {
    match tag {
        "VOID" => Ok(Value::Void),
        "NULL" => {
            let of = obj
                .get("of")
                .and_then(|v| v.as_str())
                .and_then(Type::of)
                .unwrap_or(Type::Any);
            Ok(Value::Null(of))
        }
        "DECIMAL" => {
            let text = text_field(obj, TEXT_KEY)?;
            text.parse::<f64>()
                .map(Value::Decimal)
                .map_err(|_| bad("bad decimal text"))
        }
        "DATE" => {
            let text = text_field(obj, TEXT_KEY)?;
            DateTime::parse_from_rfc3339(text)
                .map(|d| Value::Date(d.with_timezone(&Utc)))
                .map_err(|_| bad("bad date text"))
        }
        "URI" => Uri::parse(text_field(obj, VALUE_KEY)?).map(Value::Uri),
        "MAP" => {
            let pairs = obj
                .get(VALUE_KEY)
                .and_then(|v| v.as_array())
                .ok_or_else(|| bad("map without entries"))?;
            let mut entries = indexmap::IndexMap::new();
            for pair in pairs {
                let entry = pair.as_object().ok_or_else(|| bad("malformed map entry"))?;
                let key = from_json(entry.get("key").ok_or_else(|| bad("map entry without key"))?)?;
                let value = from_json(
                    entry
                        .get(VALUE_KEY)
                        .ok_or_else(|| bad("map entry without value"))?,
                )?;
                entries.insert(key, value);
            }
            Ok(Value::Map(entries))
        }
        "PAIR" => {
            let key = from_json(obj.get("key").ok_or_else(|| bad("pair without key"))?)?;
            let value =
                from_json(obj.get(VALUE_KEY).ok_or_else(|| bad("pair without value"))?)?;
            Ok(Value::Pair(Box::new((key, value))))
        }
        "RANGE" => {
            let lower =
                from_json(obj.get(LOWER_KEY).ok_or_else(|| bad("range without lower"))?)?;
            let upper =
                from_json(obj.get(UPPER_KEY).ok_or_else(|| bad("range without upper"))?)?;
            RangeValue::new(lower, upper).map(|r| Value::Range(Box::new(r)))
        }
        "ERROR" => {
            let kind = obj
                .get("kind")
                .and_then(|v| v.as_str())
                .and_then(ErrorKind::of)
                .unwrap_or(ErrorKind::Script);
            let message = text_field(obj, VALUE_KEY)?.to_string();
            let fatal = obj.get("fatal").and_then(|v| v.as_bool()).unwrap_or(false);
            let mut f = Failure::new(kind, message);
            f.fatal = fatal;
            Ok(Value::Failure(Box::new(f)))
        }
        "OBJECT" => {
            let name = text_field(obj, "name")?.to_string();
            let mutable = obj.get("mutable").and_then(|v| v.as_bool()).unwrap_or(false);
            let readonly: Vec<&str> = obj
                .get("readonly")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                .unwrap_or_default();
            let fields = obj
                .get(VALUE_KEY)
                .and_then(|v| v.as_object())
                .ok_or_else(|| bad("object without fields"))?;
            let mut out = ObjectValue::new(name, mutable);
            for (field, v) in fields {
                let ro = readonly.contains(&field.as_str());
                out = out.with_field(field, from_json(v)?, ro);
            }
            Ok(Value::Object(Box::new(out)))
        }
        other => Err(bad(&format!("unknown type tag '{other}'"))),
    }
}

fn text_field<'a>(
    obj: &'a JsonMap<String, serde_json::Value>,
    key: &str,
) -> ValueResult<&'a str> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| bad(&format!("missing '{key}' field")))
}

fn bad(message: &str) -> Failure {
    Failure::new(ErrorKind::TypeConversion, format!("could not deserialize: {message}"))
}
