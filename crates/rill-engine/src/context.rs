//! The evaluation context.
//!
//! The context is threaded explicitly through `fix` and every compute
//! function: the current scope, the failure policy, and the parallelism
//! request all travel with it. There is no thread-local "current scope".

use crate::scope::Scope;
use rill_value::{Value, ValueResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Evaluation settings and the current scope, passed through the fix
/// call chain.
#[derive(Clone)]
pub struct EvalContext {
    id: u64,
    scope: Arc<Scope>,
    /// When set, any failure aborts the enclosing evaluation. When
    /// clear (tolerant mode), non-fatal failures are substituted as
    /// failure values and sibling nodes keep evaluating.
    pub fail_fast: bool,
    /// Request concurrent fixing of a node's mutually independent
    /// inputs. The graph builder must guarantee that no two parallel
    /// inputs write the same mutable variable; the engine does not
    /// detect violations.
    pub parallel: bool,
}

impl EvalContext {
    pub fn new(scope: Arc<Scope>) -> EvalContext {
        EvalContext {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            scope,
            fail_fast: true,
            parallel: false,
        }
    }

    /// Switch to the tolerant failure policy.
    pub fn tolerant(mut self) -> EvalContext {
        self.fail_fast = false;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> EvalContext {
        self.parallel = parallel;
        self
    }

    /// The same context, evaluating in a different scope.
    pub fn with_scope(&self, scope: Arc<Scope>) -> EvalContext {
        EvalContext {
            id: self.id,
            scope,
            fail_fast: self.fail_fast,
            parallel: self.parallel,
        }
    }

    /// The owning context id, recorded on variables bound through it.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn scope(&self) -> &Arc<Scope> {
        &self.scope
    }

    /// Apply the failure policy: under the tolerant policy a non-fatal
    /// failure becomes a failure value; everything else passes through.
    pub fn capture(&self, result: ValueResult<Value>) -> ValueResult<Value> {
        match result {
            Err(failure) if !self.fail_fast && !failure.fatal => Ok(Value::from(failure)),
            other => other,
        }
    }
}
