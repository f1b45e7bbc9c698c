//! Concurrent fixing.
//!
//! Scoped fan-out over a node's inputs, and a cancellable background
//! fix. Correctness under the parallel policy is the graph builder's
//! promise: no two concurrently fixed inputs may write the same
//! mutable variable.

use crate::context::EvalContext;
use crate::node::{Depth, Node};
use rill_value::{Failure, Value, ValueResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Fix every input concurrently and collect results in input order.
/// The context's failure policy applies to each result exactly as it
/// would sequentially.
pub(crate) fn fix_all(
    ctx: &EvalContext,
    inputs: &[Arc<Node>],
    depth: Depth,
) -> ValueResult<Vec<Value>> {
    std::thread::scope(|s| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let ctx = ctx.clone();
                let input = Arc::clone(input);
                s.spawn(move || input.fix(&ctx, depth))
            })
            .collect();
        let mut fixed = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = handle
                .join()
                .map_err(|_| Failure::script("parallel fix worker panicked").fatal())?;
            fixed.push(ctx.capture(result)?);
        }
        Ok(fixed)
    })
}

/// A fix running on its own thread.
pub struct FixTask {
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<ValueResult<Value>>>,
}

impl FixTask {
    /// Request cancellation. The running fix is not interrupted, but
    /// its result will be discarded by [`FixTask::join`].
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for the fix. Returns `None` if the task was cancelled.
    pub fn join(mut self) -> Option<ValueResult<Value>> {
        let handle = self.handle.take()?;
        let result = handle
            .join()
            .unwrap_or_else(|_| Err(Failure::script("background fix panicked").fatal()));
        if self.is_cancelled() {
            None
        } else {
            Some(result)
        }
    }
}

impl Drop for FixTask {
    fn drop(&mut self) {
        // Detach; the background thread finishes on its own.
        self.handle.take();
    }
}

/// Fix a node on a background thread.
pub fn fix_in_background(node: Arc<Node>, ctx: EvalContext, depth: Depth) -> FixTask {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let handle = std::thread::spawn(move || {
        let result = node.fix(&ctx, depth);
        if flag.load(Ordering::SeqCst) {
            tracing::debug!(name = %node.name(), "discarding cancelled background fix");
        }
        result
    });
    FixTask {
        cancelled,
        handle: Some(handle),
    }
}
