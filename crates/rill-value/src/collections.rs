//! Collection operators for List, Map, Pair, and Range values.
//!
//! Every operator returns a new value; the receiver is never mutated.
//! Non-collection variants reject these operators with an
//! `UnsupportedOperation` failure.

use crate::error::{Failure, ValueResult};
use crate::value::Value;
use indexmap::IndexMap;

impl Value {
    /// Append an element (List) or an entry (Map, from a Pair).
    pub fn append(&self, value: Value) -> ValueResult<Value> {
        match self {
            Value::List(items) => {
                let mut items = items.clone();
                items.push(value);
                Ok(Value::List(items))
            }
            Value::Map(entries) => {
                let mut entries = entries.clone();
                let (k, v) = into_entry(value)?;
                entries.insert(k, v);
                Ok(Value::Map(entries))
            }
            Value::Pair(kv) => {
                // A pair grows into a map.
                let mut entries = IndexMap::new();
                entries.insert(kv.0.clone(), kv.1.clone());
                let (k, v) = into_entry(value)?;
                entries.insert(k, v);
                Ok(Value::Map(entries))
            }
            Value::Range(r) => {
                let mut items = r.expand()?;
                items.push(value);
                Ok(Value::List(items))
            }
            other => Err(Failure::unsupported("append", other.type_of())),
        }
    }

    /// Prepend an element.
    pub fn prepend(&self, value: Value) -> ValueResult<Value> {
        match self {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len() + 1);
                out.push(value);
                out.extend_from_slice(items);
                Ok(Value::List(out))
            }
            Value::Range(r) => {
                let mut out = vec![value];
                out.extend(r.expand()?);
                Ok(Value::List(out))
            }
            other => Err(Failure::unsupported("prepend", other.type_of())),
        }
    }

    /// Insert an element at an index (List only). Out-of-range clamps
    /// to the end.
    pub fn insert_at(&self, index: usize, value: Value) -> ValueResult<Value> {
        match self {
            Value::List(items) => {
                let mut items = items.clone();
                let at = index.min(items.len());
                items.insert(at, value);
                Ok(Value::List(items))
            }
            other => Err(Failure::unsupported("insert", other.type_of())),
        }
    }

    /// Remove by value (List: every equal element; Map: the key).
    pub fn remove(&self, value: &Value) -> ValueResult<Value> {
        match self {
            Value::List(items) => Ok(Value::List(
                items.iter().filter(|i| *i != value).cloned().collect(),
            )),
            Value::Map(entries) => {
                let mut entries = entries.clone();
                entries.shift_remove(value);
                Ok(Value::Map(entries))
            }
            other => Err(Failure::unsupported("remove", other.type_of())),
        }
    }

    /// Membership: Map by key, Pair by key, List by element, Range by
    /// bound inclusion.
    pub fn contains_key(&self, key: &Value) -> ValueResult<bool> {
        match self {
            Value::Map(entries) => Ok(entries.contains_key(key)),
            Value::Pair(kv) => Ok(&kv.0 == key),
            Value::List(items) => Ok(items.contains(key)),
            Value::Range(r) => Ok(r.contains(key)),
            other => Err(Failure::unsupported("contains", other.type_of())),
        }
    }

    /// Element count. Strings count characters.
    pub fn size(&self) -> ValueResult<usize> {
        match self {
            Value::List(items) => Ok(items.len()),
            Value::Map(entries) => Ok(entries.len()),
            Value::Pair(_) => Ok(1),
            Value::Range(r) => r.size(),
            Value::Str(s) => Ok(s.chars().count()),
            other => Err(Failure::unsupported("size", other.type_of())),
        }
    }

    /// Map lookup by key; Void when absent.
    pub fn get(&self, key: &Value) -> ValueResult<Value> {
        match self {
            Value::Map(entries) => Ok(entries.get(key).cloned().unwrap_or(Value::Void)),
            Value::Pair(kv) if &kv.0 == key => Ok(kv.1.clone()),
            Value::Pair(_) => Ok(Value::Void),
            Value::List(items) => {
                let idx = key.to_integer()?;
                Ok(items.get(idx as usize).cloned().unwrap_or(Value::Void))
            }
            other => Err(Failure::unsupported("get", other.type_of())),
        }
    }
}

/// An entry for map insertion: a pair splits, anything else keys itself
/// mapped to void.
fn into_entry(value: Value) -> ValueResult<(Value, Value)> {
    match value {
        Value::Pair(kv) => Ok((kv.0, kv.1)),
        other => Ok((other, Value::Void)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn three_appends_equal_the_literal() {
        let built = Value::list()
            .append("Neil".into())
            .and_then(|l| l.append("Dimple".into()))
            .and_then(|l| l.append("Charlie".into()))
            .unwrap();
        let literal = Value::List(vec!["Neil".into(), "Dimple".into(), "Charlie".into()]);
        assert_eq!(built, literal);
    }

    #[test]
    fn remove_by_value() {
        let l = Value::List(vec!["Neil".into(), "Dimple".into(), "Charlie".into()]);
        let removed = l.remove(&"Dimple".into()).unwrap();
        assert_eq!(
            removed,
            Value::List(vec!["Neil".into(), "Charlie".into()])
        );
    }

    #[test]
    fn map_append_takes_pairs() {
        let m = Value::map().append(Value::pair("a", 1)).unwrap();
        assert_eq!(m.get(&"a".into()).unwrap(), Value::from(1));
        assert!(m.contains_key(&"a".into()).unwrap());
    }

    #[test]
    fn insert_at_clamps() {
        let l = Value::List(vec![1.into(), 3.into()]);
        assert_eq!(
            l.insert_at(1, 2.into()).unwrap(),
            Value::List(vec![1.into(), 2.into(), 3.into()])
        );
        assert_eq!(
            l.insert_at(99, 4.into()).unwrap(),
            Value::List(vec![1.into(), 3.into(), 4.into()])
        );
    }

    #[test]
    fn range_membership_and_size() {
        let r = Value::range(1, 5);
        assert!(r.contains_key(&3.into()).unwrap());
        assert!(!r.contains_key(&9.into()).unwrap());
        assert_eq!(r.size().unwrap(), 5);
    }

    #[test]
    fn scalars_reject_collection_ops() {
        let err = Value::from(3).append(1.into()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperation);
    }
}
