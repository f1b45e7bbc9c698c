//! Object values: named records with per-field mutability.
//!
//! An object is an ordered mapping of field name to slot. The value held
//! by a slot is immutable like any other value; mutating a field replaces
//! the slot's value. Mutation is only allowed on objects marked mutable,
//! and only for fields not marked readonly. Clones of a mutable object
//! share their slots, so a mutation is visible through every handle.

use crate::dynamic::Pipeable;
use crate::error::{ErrorKind, Failure, ValueResult};
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A single field slot.
#[derive(Clone)]
pub struct ObjectField {
    slot: Arc<RwLock<Value>>,
    pub readonly: bool,
}

impl ObjectField {
    fn new(value: Value, readonly: bool) -> ObjectField {
        ObjectField {
            slot: Arc::new(RwLock::new(value)),
            readonly,
        }
    }

    /// Snapshot of the current field value.
    pub fn value(&self) -> Value {
        self.slot.read().expect("object field lock poisoned").clone()
    }

    fn replace(&self, value: Value) {
        *self.slot.write().expect("object field lock poisoned") = value;
    }
}

/// A named record instance.
#[derive(Clone)]
pub struct ObjectValue {
    pub name: String,
    pub mutable: bool,
    fields: IndexMap<String, ObjectField>,
    constructor: Option<Arc<dyn Pipeable>>,
}

impl ObjectValue {
    pub fn new(name: impl Into<String>, mutable: bool) -> ObjectValue {
        ObjectValue {
            name: name.into(),
            mutable,
            fields: IndexMap::new(),
            constructor: None,
        }
    }

    /// Attach the constructor reference used to build further instances.
    pub fn with_constructor(mut self, constructor: Arc<dyn Pipeable>) -> ObjectValue {
        self.constructor = Some(constructor);
        self
    }

    pub fn constructor(&self) -> Option<&Arc<dyn Pipeable>> {
        self.constructor.as_ref()
    }

    /// Add a field during construction. Insertion order is preserved.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: Value,
        readonly: bool,
    ) -> ObjectValue {
        self.fields
            .insert(name.into(), ObjectField::new(value, readonly));
        self
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(ObjectField::value)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Replace a field's value. Fails unless the object is mutable and
    /// the field is not readonly.
    pub fn set_field(&self, name: &str, value: Value) -> ValueResult<()> {
        if !self.mutable {
            return Err(Failure::new(
                ErrorKind::Immutability,
                format!("object '{}' is immutable", self.name),
            ));
        }
        match self.fields.get(name) {
            Some(field) if field.readonly => Err(Failure::immutability(name)),
            Some(field) => {
                field.replace(value);
                Ok(())
            }
            None => Err(Failure::new(
                ErrorKind::Script,
                format!("object '{}' has no field '{name}'", self.name),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in insertion order, as (name, value, readonly) snapshots.
    pub fn snapshot(&self) -> Vec<(String, Value, bool)> {
        self.fields
            .iter()
            .map(|(k, f)| (k.clone(), f.value(), f.readonly))
            .collect()
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &ObjectValue) -> bool {
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(other.fields.iter())
                .all(|((ka, fa), (kb, fb))| ka == kb && fa.value() == fb.value())
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ObjectValue");
        d.field("name", &self.name).field("mutable", &self.mutable);
        for (k, field) in &self.fields {
            d.field(k, &field.value());
        }
        d.finish()
    }
}
