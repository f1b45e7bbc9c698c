//! The polymorphic runtime value.
//!
//! [`Value`] is a closed tagged union over every kind of datum a Rill
//! program can produce. Values are immutable: every operator returns a
//! new value. The only exception is [`ObjectValue`] instances explicitly
//! marked mutable, whose field slots may be replaced (never mutated in
//! place) subject to per-field readonly flags.

use crate::dynamic::Dynamic;
use crate::error::{ErrorKind, Failure};
use crate::object::ObjectValue;
use crate::range::RangeValue;
use crate::ty::Type;
use crate::uri::Uri;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use std::fmt;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Decimal(f64),
    Str(String),
    Boolean(bool),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Ordered mapping; insertion order is preserved.
    Map(IndexMap<Value, Value>),
    /// A single key/value.
    Pair(Box<(Value, Value)>),
    Range(Box<RangeValue>),
    Date(DateTime<Utc>),
    Uri(Uri),
    /// Explicit "no value".
    Void,
    /// Absence carrying the expected type.
    Null(Type),
    /// A captured error, usable like any other value.
    Failure(Box<Failure>),
    /// A wrapped computation, re-evaluated on every read.
    Dynamic(Dynamic),
    /// A named record instance.
    Object(Box<ObjectValue>),
}

impl Value {
    /// An empty map value; chain [`Value::set`] to populate it.
    pub fn map() -> Value {
        Value::Map(IndexMap::new())
    }

    /// An empty list value.
    pub fn list() -> Value {
        Value::List(Vec::new())
    }

    /// A pair value.
    pub fn pair(key: impl Into<Value>, value: impl Into<Value>) -> Value {
        Value::Pair(Box::new((key.into(), value.into())))
    }

    /// A range value; fails for bound types that cannot form a range.
    pub fn range(lower: impl Into<Value>, upper: impl Into<Value>) -> Value {
        match RangeValue::new(lower.into(), upper.into()) {
            Ok(r) => Value::Range(Box::new(r)),
            Err(f) => Value::Failure(Box::new(f)),
        }
    }

    /// A typed null.
    pub fn null(expected: Type) -> Value {
        Value::Null(expected)
    }

    /// Insert into a map value, preserving insertion order.
    ///
    /// On any other variant the result is an `UnsupportedOperation`
    /// failure value.
    pub fn set(self, key: impl Into<Value>, value: impl Into<Value>) -> Value {
        match self {
            Value::Map(mut entries) => {
                entries.insert(key.into(), value.into());
                Value::Map(entries)
            }
            other => Value::Failure(Box::new(Failure::unsupported("set", other.type_of()))),
        }
    }

    /// The runtime type tag.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Integer(_) => Type::Integer,
            Value::Decimal(_) => Type::Decimal,
            Value::Str(_) => Type::String,
            Value::Boolean(_) => Type::Boolean,
            Value::List(_) => Type::List,
            Value::Map(_) => Type::Map,
            Value::Pair(_) => Type::Pair,
            Value::Range(_) => Type::Range,
            Value::Date(_) => Type::Date,
            Value::Uri(_) => Type::Uri,
            Value::Void => Type::Void,
            // A typed null reports the type it stands in for.
            Value::Null(expected) => *expected,
            Value::Failure(_) => Type::Error,
            Value::Dynamic(_) => Type::Dynamic,
            Value::Object(_) => Type::Object,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Value::Failure(_))
    }

    /// The failure payload, if this value is one.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Value::Failure(f) => Some(f),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.kind)
    }

    /// Truthiness: void, nulls, failures, `false`, zero, and empty
    /// collections are falsy; everything else is truthy. A dynamic value
    /// is read and its product tested.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Decimal(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::List(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Pair(_) | Value::Range(_) | Value::Date(_) | Value::Uri(_) => true,
            Value::Void | Value::Null(_) | Value::Failure(_) => false,
            Value::Dynamic(d) => d.read().map(|v| v.is_truthy()).unwrap_or(false),
            Value::Object(o) => !o.is_empty(),
        }
    }

    /// Human/string form. Bare for strings; JSON form for containers.
    pub fn to_text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
            Value::Uri(u) => u.to_string(),
            Value::Void => "void".to_string(),
            Value::Null(_) => "null".to_string(),
            Value::Failure(f) => f.to_string(),
            Value::Dynamic(d) => match d.read() {
                Ok(v) => v.to_text(),
                Err(f) => f.to_string(),
            },
            other => {
                let mut out = String::new();
                other.write_json_text(&mut out);
                out
            }
        }
    }

    /// JSON-flavored text, used when this value appears inside a
    /// container: strings quoted, dates/URIs quoted, nulls as `null`.
    pub(crate) fn write_json_text(&self, out: &mut String) {
        match self {
            Value::Integer(n) => out.push_str(&n.to_string()),
            Value::Decimal(n) => write_decimal(*n, out),
            Value::Str(s) => write_quoted(s, out),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json_text(out);
                }
                out.push(']');
            }
            Value::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    k.write_json_text(out);
                    out.push(':');
                    v.write_json_text(out);
                }
                out.push('}');
            }
            Value::Pair(kv) => {
                out.push('{');
                kv.0.write_json_text(out);
                out.push(':');
                kv.1.write_json_text(out);
                out.push('}');
            }
            Value::Range(r) => {
                r.lower.write_json_text(out);
                out.push_str("..");
                r.upper.write_json_text(out);
            }
            Value::Date(d) => {
                write_quoted(&d.to_rfc3339_opts(SecondsFormat::Secs, true), out)
            }
            Value::Uri(u) => write_quoted(u.as_str(), out),
            Value::Void | Value::Null(_) => out.push_str("null"),
            Value::Failure(f) => write_quoted(&f.to_string(), out),
            Value::Dynamic(d) => match d.read() {
                Ok(v) => v.write_json_text(out),
                Err(f) => write_quoted(&f.to_string(), out),
            },
            Value::Object(o) => {
                out.push('{');
                for (i, (name, value, _)) in o.snapshot().into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_quoted(&name, out);
                    out.push(':');
                    value.write_json_text(out);
                }
                out.push('}');
            }
        }
    }
}

/// Decimals with no fractional part print in integral form, so that
/// `2.0` and `2` share one textual identity.
fn write_decimal(n: f64, out: &mut String) {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9e15 {
        out.push_str(&format!("{}", n as i64));
    } else {
        out.push_str(&format!("{n}"));
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ── Conversions from host values ─────────────────────────────────────

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Value {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Decimal(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Boolean(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(items)
    }
}

impl From<IndexMap<Value, Value>> for Value {
    fn from(entries: IndexMap<Value, Value>) -> Value {
        Value::Map(entries)
    }
}

impl From<Failure> for Value {
    fn from(f: Failure) -> Value {
        Value::Failure(Box::new(f))
    }
}

impl From<Uri> for Value {
    fn from(u: Uri) -> Value {
        Value::Uri(u)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Value {
        Value::Date(d)
    }
}

impl From<RangeValue> for Value {
    fn from(r: RangeValue) -> Value {
        Value::Range(Box::new(r))
    }
}

impl From<ObjectValue> for Value {
    fn from(o: ObjectValue) -> Value {
        Value::Object(Box::new(o))
    }
}

impl From<Dynamic> for Value {
    fn from(d: Dynamic) -> Value {
        Value::Dynamic(d)
    }
}
