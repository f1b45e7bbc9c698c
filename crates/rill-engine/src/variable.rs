//! Variable bindings.
//!
//! A [`Variable`] is a named slot held by a scope. The slot itself is
//! interior-mutable; whether a write is permitted is decided by the
//! binding flags and any attached constraint, both checked by
//! [`Scope::bind`](crate::Scope::bind) before the slot changes.

use crate::node::Node;
use rill_value::Value;
use std::sync::{Arc, RwLock};

/// Binding flags, fixed at declaration time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarFlags {
    /// Writes after declaration are rejected.
    pub readonly: bool,
    /// Shared by reference when the owning scope is copied.
    pub volatile: bool,
    /// The value was fully fixed at bind time and never re-evaluates.
    pub fixed: bool,
    /// Declared inside a pure expression.
    pub pure: bool,
    /// Bound positionally by a caller rather than declared.
    pub parameter: bool,
}

impl VarFlags {
    pub fn readonly() -> VarFlags {
        VarFlags {
            readonly: true,
            ..VarFlags::default()
        }
    }

    pub fn volatile() -> VarFlags {
        VarFlags {
            volatile: true,
            ..VarFlags::default()
        }
    }
}

/// A named binding: current value, flags, and an optional constraint
/// predicate with the source text it was written as.
pub struct Variable {
    slot: RwLock<Value>,
    flags: VarFlags,
    constraint: Option<Arc<Node>>,
    constraint_source: Option<String>,
    /// Id of the evaluation context that created the binding.
    owner: u64,
}

impl Variable {
    pub(crate) fn new(
        value: Value,
        flags: VarFlags,
        constraint: Option<Arc<Node>>,
        constraint_source: Option<String>,
        owner: u64,
    ) -> Variable {
        Variable {
            slot: RwLock::new(value),
            flags,
            constraint,
            constraint_source,
            owner,
        }
    }

    /// Snapshot of the current value.
    pub fn value(&self) -> Value {
        self.slot.read().expect("variable slot poisoned").clone()
    }

    /// Unchecked write. Callers go through `Scope::bind`, which enforces
    /// the readonly flag and the constraint first.
    pub(crate) fn set_value(&self, value: Value) {
        *self.slot.write().expect("variable slot poisoned") = value;
    }

    pub fn flags(&self) -> VarFlags {
        self.flags
    }

    pub fn is_readonly(&self) -> bool {
        self.flags.readonly || self.flags.fixed
    }

    pub fn is_volatile(&self) -> bool {
        self.flags.volatile
    }

    pub fn is_pure(&self) -> bool {
        self.flags.pure
    }

    pub fn constraint(&self) -> Option<&Arc<Node>> {
        self.constraint.as_ref()
    }

    pub fn constraint_source(&self) -> Option<&str> {
        self.constraint_source.as_deref()
    }

    pub fn owner(&self) -> u64 {
        self.owner
    }

    /// A detached copy of the binding with the same flags and constraint.
    pub(crate) fn duplicate(&self) -> Variable {
        Variable {
            slot: RwLock::new(self.value()),
            flags: self.flags,
            constraint: self.constraint.clone(),
            constraint_source: self.constraint_source.clone(),
            owner: self.owner,
        }
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("value", &self.value())
            .field("flags", &self.flags)
            .field("constrained", &self.constraint.is_some())
            .finish()
    }
}
