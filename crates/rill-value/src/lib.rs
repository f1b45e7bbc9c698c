//! The Rill runtime value model.
//!
//! This crate defines [`Value`] — the polymorphic, immutable runtime
//! datum of the Rill language — together with its type tags, conversion
//! accessors, operators, failure values, and the textual serialization
//! round trip. The evaluation engine lives in `rill-engine` and builds
//! on the [`Pipeable`] contract defined here.

mod collections;
mod convert;
mod dynamic;
mod eq;
mod error;
mod object;
mod ops;
mod range;
mod serial;
mod ty;
mod uri;
mod value;

pub use dynamic::{Dynamic, Pipeable};
pub use error::{ErrorKind, Failure, ValueResult};
pub use object::{ObjectField, ObjectValue};
pub use range::RangeValue;
pub use serial::{deserialize, serialize};
pub use ty::Type;
pub use uri::Uri;
pub use value::Value;
