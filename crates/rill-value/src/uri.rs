//! URI values.
//!
//! The runtime only cares about the scheme (it selects a handler) and
//! the remainder; full syntax validation belongs to the handlers.

use crate::error::{ErrorKind, Failure, ValueResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `scheme:remainder` reference to an external resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uri {
    text: String,
    scheme_len: usize,
}

impl Uri {
    /// Parse a URI. Requires a non-empty scheme followed by `:`.
    pub fn parse(text: impl Into<String>) -> ValueResult<Uri> {
        let text = text.into();
        match text.find(':') {
            Some(0) | None => Err(Failure::new(
                ErrorKind::TypeConversion,
                format!("'{text}' is not a valid URI"),
            )),
            Some(i) => Ok(Uri {
                text,
                scheme_len: i,
            }),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.text[..self.scheme_len]
    }

    /// Everything after the scheme separator.
    pub fn path(&self) -> &str {
        &self.text[self.scheme_len + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_scheme() {
        let u = Uri::parse("kv://queues/inbox").unwrap();
        assert_eq!(u.scheme(), "kv");
        assert_eq!(u.path(), "//queues/inbox");
        assert_eq!(u.to_string(), "kv://queues/inbox");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(Uri::parse("no-scheme-here").is_err());
        assert!(Uri::parse(":path").is_err());
    }
}
