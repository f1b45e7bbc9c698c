//! Equality, hashing, and total ordering for values.
//!
//! Equality is structural within a variant and textual across variants:
//! `1 == "1"` holds because both reduce to the canonical text `1`.
//! Void and typed nulls never equal anything but themselves, and a
//! dynamic value compares by the value it produces. Hashing is defined
//! over the same canonical text, so equal values always hash equally and
//! any value can key a map.

use crate::ty::Type;
use crate::value::Value;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

impl Value {
    /// Canonical text: the identity used for cross-type equality and
    /// hashing. Scalars render bare (no quotes); containers render over
    /// their children's canonical text.
    pub(crate) fn canonical_text(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_canonical(out);
                }
                out.push(']');
            }
            Value::Map(entries) => {
                out.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    k.write_canonical(out);
                    out.push(':');
                    v.write_canonical(out);
                }
                out.push('}');
            }
            Value::Pair(kv) => {
                out.push('{');
                kv.0.write_canonical(out);
                out.push(':');
                kv.1.write_canonical(out);
                out.push('}');
            }
            Value::Range(r) => {
                r.lower.write_canonical(out);
                out.push_str("..");
                r.upper.write_canonical(out);
            }
            Value::Null(expected) => {
                out.push_str("null:");
                out.push_str(expected.name());
            }
            Value::Dynamic(d) => match d.read() {
                Ok(v) => v.write_canonical(out),
                Err(_) => out.push_str("<dynamic>"),
            },
            Value::Object(o) => {
                out.push_str(&o.name);
                out.push('{');
                for (i, (name, value, _)) in o.snapshot().into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&name);
                    out.push(':');
                    value.write_canonical(out);
                }
                out.push('}');
            }
            other => out.push_str(&other.to_text()),
        }
    }

    /// True for the variants that take part in textual cross-type
    /// equality. Void, nulls, failures, and objects keep their identity.
    pub(crate) fn coercible(&self) -> bool {
        matches!(
            self,
            Value::Integer(_)
                | Value::Decimal(_)
                | Value::Str(_)
                | Value::Boolean(_)
                | Value::Date(_)
                | Value::Uri(_)
        )
    }

    /// Total ordering: numbers compare numerically, strings
    /// lexicographically, containers element-wise, ranges by bounds, and
    /// everything else falls back to canonical-text comparison.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (
                a @ (Value::Integer(_) | Value::Decimal(_)),
                b @ (Value::Integer(_) | Value::Decimal(_)),
            ) => {
                let (x, y) = (numeric(a), numeric(b));
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => compare_slices(a, b),
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let k = ka.compare(kb);
                    if k != Ordering::Equal {
                        return k;
                    }
                    let v = va.compare(vb);
                    if v != Ordering::Equal {
                        return v;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Pair(a), Value::Pair(b)) => {
                a.0.compare(&b.0).then_with(|| a.1.compare(&b.1))
            }
            (Value::Range(a), Value::Range(b)) => a
                .lower
                .compare(&b.lower)
                .then_with(|| a.upper.compare(&b.upper)),
            (Value::Dynamic(d), b) => match d.read() {
                Ok(v) => v.compare(b),
                Err(_) => Ordering::Less,
            },
            (a, Value::Dynamic(d)) => match d.read() {
                Ok(v) => a.compare(&v),
                Err(_) => Ordering::Greater,
            },
            (a, b) => a.canonical_text().cmp(&b.canonical_text()),
        }
    }
}

fn numeric(v: &Value) -> f64 {
    match v {
        Value::Integer(n) => *n as f64,
        Value::Decimal(n) => *n,
        _ => f64::NAN,
    }
}

fn compare_slices(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let c = x.compare(y);
        if c != Ordering::Equal {
            return c;
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            // Dynamics compare by produced value; a failed read never equals.
            (Value::Dynamic(d), b) => match d.read() {
                Ok(v) => &v == b,
                Err(_) => false,
            },
            (a, Value::Dynamic(d)) => match d.read() {
                Ok(v) => a == &v,
                Err(_) => false,
            },

            (Value::Integer(a), Value::Integer(b)) => a == b,
            // NaN equals NaN here so that equality stays reflexive for
            // map keys; ordinary comparisons go through `compare`.
            (Value::Decimal(a), Value::Decimal(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Pair(a), Value::Pair(b)) => a == b,
            (Value::Range(a), Value::Range(b)) => {
                a.lower == b.lower && a.upper == b.upper
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Uri(a), Value::Uri(b)) => a == b,
            (Value::Void, Value::Void) => true,
            (Value::Null(a), Value::Null(b)) => a == b,
            (Value::Failure(a), Value::Failure(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,

            // Cross-type: textual conversion for the scalar family only.
            (a, b) if a.coercible() && b.coercible() => {
                a.canonical_text() == b.canonical_text()
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write(self.canonical_text().as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    #[test]
    fn integer_equals_its_string_form() {
        assert_eq!(Value::from(1), Value::from("1"));
        assert_eq!(Value::from("1"), Value::from(1));
        assert_eq!(hash_of(&Value::from(1)), hash_of(&Value::from("1")));
    }

    #[test]
    fn typed_null_never_equals_the_text_null() {
        assert_ne!(Value::null(Type::String), Value::from("null"));
        assert_ne!(Value::null(Type::String), Value::null(Type::Integer));
        assert_eq!(Value::null(Type::String), Value::null(Type::String));
    }

    #[test]
    fn void_is_only_void() {
        assert_eq!(Value::Void, Value::Void);
        assert_ne!(Value::Void, Value::null(Type::Void));
        assert_ne!(Value::Void, Value::from("void"));
    }

    #[test]
    fn integer_equals_whole_decimal() {
        assert_eq!(Value::from(2), Value::from(2.0));
        assert_eq!(hash_of(&Value::from(2)), hash_of(&Value::from(2.0)));
    }

    #[test]
    fn lists_compare_elementwise_across_types() {
        let a = Value::List(vec![1.into(), 2.into()]);
        let b = Value::List(vec!["1".into(), "2".into()]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn ordering_is_numeric_then_textual() {
        assert_eq!(Value::from(2).compare(&Value::from(10)), Ordering::Less);
        assert_eq!(
            Value::from("2").compare(&Value::from("10")),
            Ordering::Greater
        );
        assert_eq!(Value::from(1.5).compare(&Value::from(2)), Ordering::Less);
    }

    #[test]
    fn dynamic_equals_its_product() {
        use crate::dynamic::Dynamic;
        let d = Value::Dynamic(Dynamic::from_fn(|_| Ok(Value::from("Hello World"))));
        assert_eq!(d, Value::from("Hello World"));
    }
}
