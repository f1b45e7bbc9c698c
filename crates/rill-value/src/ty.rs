//! Runtime type tags for Rill values.
//!
//! [`Type`] is the closed set of value kinds the runtime knows about.
//! It is carried by typed nulls, failures, and type predictions, and is
//! the unit the advisory type learner works in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Type {
    Integer,
    Decimal,
    String,
    Boolean,
    List,
    Map,
    Pair,
    Range,
    Date,
    Uri,
    Void,
    /// Failure values.
    Error,
    /// A wrapped computation, re-evaluated on read.
    Dynamic,
    /// A named record instance.
    Object,
    /// Unknown or unconstrained.
    Any,
}

impl Type {
    /// Parse a type tag from its wire name (e.g. `"INTEGER"`).
    pub fn of(name: &str) -> Option<Type> {
        match name {
            "INTEGER" => Some(Type::Integer),
            "DECIMAL" => Some(Type::Decimal),
            "STRING" => Some(Type::String),
            "BOOLEAN" => Some(Type::Boolean),
            "LIST" => Some(Type::List),
            "MAP" => Some(Type::Map),
            "PAIR" => Some(Type::Pair),
            "RANGE" => Some(Type::Range),
            "DATE" => Some(Type::Date),
            "URI" => Some(Type::Uri),
            "VOID" => Some(Type::Void),
            "ERROR" => Some(Type::Error),
            "DYNAMIC" => Some(Type::Dynamic),
            "OBJECT" => Some(Type::Object),
            "ANY" => Some(Type::Any),
            _ => None,
        }
    }

    /// The wire name of this tag.
    pub fn name(self) -> &'static str {
        match self {
            Type::Integer => "INTEGER",
            Type::Decimal => "DECIMAL",
            Type::String => "STRING",
            Type::Boolean => "BOOLEAN",
            Type::List => "LIST",
            Type::Map => "MAP",
            Type::Pair => "PAIR",
            Type::Range => "RANGE",
            Type::Date => "DATE",
            Type::Uri => "URI",
            Type::Void => "VOID",
            Type::Error => "ERROR",
            Type::Dynamic => "DYNAMIC",
            Type::Object => "OBJECT",
            Type::Any => "ANY",
        }
    }

    /// True for the numeric tags.
    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Integer | Type::Decimal)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for t in [
            Type::Integer,
            Type::Decimal,
            Type::String,
            Type::Boolean,
            Type::List,
            Type::Map,
            Type::Pair,
            Type::Range,
            Type::Date,
            Type::Uri,
            Type::Void,
            Type::Error,
            Type::Dynamic,
            Type::Object,
            Type::Any,
        ] {
            assert_eq!(Type::of(t.name()), Some(t));
        }
    }

    #[test]
    fn unknown_name() {
        assert_eq!(Type::of("QUATERNION"), None);
    }
}
