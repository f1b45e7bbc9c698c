//! Runtime failure values.
//!
//! A [`Failure`] is both the `Err` side of every fallible runtime
//! operation and, boxed into [`Value::Failure`](crate::Value::Failure),
//! an ordinary value a script can inspect and recover from under the
//! tolerant execution policy.

use crate::ty::Type;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A value cannot satisfy a requested conversion accessor.
    TypeConversion,
    /// An assignment failed a bound constraint predicate.
    ConstraintViolation,
    /// A write to a readonly or fixed binding.
    Immutability,
    /// An operator invalid for a value's type.
    UnsupportedOperation,
    /// An external collaborator I/O error.
    Io,
    /// A general execution error from a compute function.
    Script,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeConversion => "TYPE_CONVERSION",
            ErrorKind::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ErrorKind::Immutability => "IMMUTABILITY",
            ErrorKind::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorKind::Io => "IO",
            ErrorKind::Script => "SCRIPT",
        };
        f.write_str(name)
    }
}

impl ErrorKind {
    /// Parse a kind from its wire name.
    pub fn of(name: &str) -> Option<ErrorKind> {
        match name {
            "TYPE_CONVERSION" => Some(ErrorKind::TypeConversion),
            "CONSTRAINT_VIOLATION" => Some(ErrorKind::ConstraintViolation),
            "IMMUTABILITY" => Some(ErrorKind::Immutability),
            "UNSUPPORTED_OPERATION" => Some(ErrorKind::UnsupportedOperation),
            "IO" => Some(ErrorKind::Io),
            "SCRIPT" => Some(ErrorKind::Script),
            _ => None,
        }
    }
}

/// A captured runtime error: kind, message, and whether it is fatal.
///
/// Non-fatal failures can be substituted for a node's result under the
/// tolerant policy; fatal failures always abort the enclosing evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("{message} ({kind})")]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
    pub fatal: bool,
}

impl Failure {
    /// A non-fatal failure.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Failure {
        Failure {
            kind,
            message: message.into(),
            fatal: false,
        }
    }

    /// Mark this failure fatal: it propagates even under the tolerant policy.
    pub fn fatal(mut self) -> Failure {
        self.fatal = true;
        self
    }

    /// A conversion accessor could not produce the requested type.
    pub fn conversion(from: Type, to: Type) -> Failure {
        Failure::new(
            ErrorKind::TypeConversion,
            format!("cannot convert {from} to {to}"),
        )
    }

    /// An operator is not defined for a value's type.
    pub fn unsupported(op: &str, ty: Type) -> Failure {
        Failure::new(
            ErrorKind::UnsupportedOperation,
            format!("'{op}' is not supported for {ty}"),
        )
    }

    /// A write to a readonly binding.
    pub fn immutability(name: &str) -> Failure {
        Failure::new(
            ErrorKind::Immutability,
            format!("cannot change the value of '{name}', it is readonly"),
        )
    }

    /// A constraint predicate rejected an assignment.
    ///
    /// `source` is the constraint's source text, kept for diagnostics.
    pub fn constraint(name: &str, source: &str) -> Failure {
        Failure::new(
            ErrorKind::ConstraintViolation,
            format!("value for '{name}' violates constraint: {source}"),
        )
    }

    /// A general execution error.
    pub fn script(message: impl Into<String>) -> Failure {
        Failure::new(ErrorKind::Script, message)
    }

    /// An external I/O error.
    pub fn io(message: impl Into<String>) -> Failure {
        Failure::new(ErrorKind::Io, message)
    }
}

/// Result alias used throughout the runtime.
pub type ValueResult<T> = Result<T, Failure>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_kind() {
        let f = Failure::script("boom");
        assert_eq!(f.to_string(), "boom (SCRIPT)");
    }

    #[test]
    fn fatal_flag() {
        assert!(!Failure::io("gone").fatal);
        assert!(Failure::io("gone").fatal().fatal);
    }

    #[test]
    fn kind_round_trip() {
        for k in [
            ErrorKind::TypeConversion,
            ErrorKind::ConstraintViolation,
            ErrorKind::Immutability,
            ErrorKind::UnsupportedOperation,
            ErrorKind::Io,
            ErrorKind::Script,
        ] {
            assert_eq!(ErrorKind::of(&k.to_string()), Some(k));
        }
    }
}
