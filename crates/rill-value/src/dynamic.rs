//! Dynamic values: computations wrapped as values.
//!
//! A [`Dynamic`] holds a [`Pipeable`] compute and re-invokes it on every
//! read unless `memoize` is set. Equality of a dynamic value is defined
//! over the value it produces, not its identity, so `lambda == "Hello
//! World"` holds once evaluated.

use crate::error::ValueResult;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A unit of computation: takes argument values, produces a value.
///
/// Nodes in the expression graph, listener callbacks, and object
/// constructors all speak this contract.
pub trait Pipeable: Send + Sync {
    fn pipe(&self, args: &[Value]) -> ValueResult<Value>;
}

impl<F> Pipeable for F
where
    F: Fn(&[Value]) -> ValueResult<Value> + Send + Sync,
{
    fn pipe(&self, args: &[Value]) -> ValueResult<Value> {
        self(args)
    }
}

/// A compute wrapped as a value.
#[derive(Clone)]
pub struct Dynamic {
    compute: Arc<dyn Pipeable>,
    /// When set, the produced value may be cached by the holder.
    /// The `Dynamic` itself never caches.
    pub memoize: bool,
}

impl Dynamic {
    pub fn new(compute: Arc<dyn Pipeable>) -> Dynamic {
        Dynamic {
            compute,
            memoize: false,
        }
    }

    /// Wrap a plain closure.
    pub fn from_fn<F>(f: F) -> Dynamic
    where
        F: Fn(&[Value]) -> ValueResult<Value> + Send + Sync + 'static,
    {
        Dynamic::new(Arc::new(f))
    }

    pub fn with_memoize(mut self, memoize: bool) -> Dynamic {
        self.memoize = memoize;
        self
    }

    /// Re-invoke the underlying compute with no arguments.
    pub fn read(&self) -> ValueResult<Value> {
        self.compute.pipe(&[])
    }

    /// Invoke the underlying compute with arguments.
    pub fn call(&self, args: &[Value]) -> ValueResult<Value> {
        self.compute.pipe(args)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("memoize", &self.memoize)
            .finish_non_exhaustive()
    }
}
