//! The expression graph.
//!
//! A [`Node`] is one deferred computation: an operation tag, input
//! nodes, a compute function, and a purity flag. Nothing runs until
//! [`Node::fix`] is called with an [`EvalContext`] and a [`Depth`].
//! Pure nodes memoize their fixed value; impure nodes recompute on
//! every fix. A node can subscribe to scope variables with
//! [`Node::listen_to`], which re-fixes it on every update and pushes
//! the fresh value to its observers.

use crate::context::EvalContext;
use crate::listen::Subscription;
use crate::parallel;
use crate::predict::{TypeLearner, TypePrediction};
use rill_value::{Dynamic, Pipeable, Value, ValueResult};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Structural role of a node, carried for diagnostics and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Literal,
    VariableRead,
    Assignment,
    Definition,
    Operator,
    FunctionCall,
    Builtin,
    Block,
    Collection,
    Constraint,
    Listen,
    Pipe,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Op::Literal => "literal",
            Op::VariableRead => "variable-read",
            Op::Assignment => "assignment",
            Op::Definition => "definition",
            Op::Operator => "operator",
            Op::FunctionCall => "function-call",
            Op::Builtin => "builtin",
            Op::Block => "block",
            Op::Collection => "collection",
            Op::Constraint => "constraint",
            Op::Listen => "listen",
            Op::Pipe => "pipe",
        };
        f.write_str(name)
    }
}

/// How far to evaluate: all the way down, or a bounded number of
/// levels, below which nodes are handed back as dynamic values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    Deep,
    Limit(u32),
}

impl Depth {
    fn is_surface(self) -> bool {
        matches!(self, Depth::Limit(0))
    }

    fn next(self) -> Depth {
        match self {
            Depth::Deep => Depth::Deep,
            Depth::Limit(n) => Depth::Limit(n.saturating_sub(1)),
        }
    }
}

/// Where a node came from in the source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceToken {
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

impl SourceToken {
    pub fn new(file: &str, line: u32, column: u32, text: &str) -> SourceToken {
        SourceToken {
            file: file.to_string(),
            line,
            column,
            text: text.to_string(),
        }
    }
}

impl fmt::Display for SourceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            f.write_str("<unknown source>")
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

pub type Compute = dyn Fn(&EvalContext, &[Value]) -> ValueResult<Value> + Send + Sync;

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

struct Observer {
    id: u64,
    callback: Arc<dyn Fn(&Value) + Send + Sync>,
}

/// One deferred computation in the expression graph.
pub struct Node {
    op: Op,
    name: String,
    pure: bool,
    inputs: Vec<Arc<Node>>,
    source: SourceToken,
    compute: Arc<Compute>,
    memo: RwLock<Option<Value>>,
    observers: RwLock<Vec<Observer>>,
    prediction: RwLock<Option<TypePrediction>>,
}

impl Node {
    pub fn build(op: Op, name: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            op,
            name: name.into(),
            pure: false,
            inputs: Vec::new(),
            source: SourceToken::default(),
        }
    }

    /// A pure node that always produces `value`.
    pub fn literal(value: Value) -> Arc<Node> {
        Node::build(Op::Literal, "literal")
            .pure(true)
            .compute(move |_, _| Ok(value.clone()))
    }

    /// An impure node that reads `name` from the current scope.
    pub fn variable(name: &str) -> Arc<Node> {
        let key = name.to_string();
        Node::build(Op::VariableRead, name).compute(move |ctx, _| Ok(ctx.scope().get(&key)))
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn source(&self) -> &SourceToken {
        &self.source
    }

    pub fn inputs(&self) -> &[Arc<Node>] {
        &self.inputs
    }

    /// Evaluate this node.
    ///
    /// At `Limit(0)` the node is not computed at all: it is wrapped as
    /// a [`Value::Dynamic`] that re-fixes on every read. Otherwise the
    /// inputs are fixed one level shallower (concurrently when the
    /// context asks for it and the node has more than one input), the
    /// compute function runs on the fixed inputs, and for pure nodes
    /// the result is memoized.
    ///
    /// Input failures follow the context's policy: under fail-fast the
    /// first failure aborts; under the tolerant policy non-fatal
    /// failures flow into the compute function as failure values.
    pub fn fix(self: &Arc<Node>, ctx: &EvalContext, depth: Depth) -> ValueResult<Value> {
        if depth.is_surface() {
            return Ok(self.as_dynamic(ctx));
        }
        if self.pure {
            if let Some(cached) = self.memo.read().expect("node memo poisoned").clone() {
                return Ok(cached);
            }
        }
        tracing::trace!(op = %self.op, name = %self.name, "fixing node");
        let inputs = if ctx.parallel && self.inputs.len() > 1 {
            parallel::fix_all(ctx, &self.inputs, depth.next())?
        } else {
            let mut fixed = Vec::with_capacity(self.inputs.len());
            for input in &self.inputs {
                fixed.push(ctx.capture(input.fix(ctx, depth.next()))?);
            }
            fixed
        };
        let value = ctx.capture((self.compute)(ctx, &inputs))?;
        if self.pure {
            *self.memo.write().expect("node memo poisoned") = Some(value.clone());
        }
        Ok(value)
    }

    /// This node as a value: reading the value re-fixes the node in the
    /// captured context, and calling it with arguments binds them as
    /// positional parameters of a fresh child frame first.
    pub fn as_dynamic(self: &Arc<Node>, ctx: &EvalContext) -> Value {
        let pipe = NodePipe {
            node: Arc::clone(self),
            ctx: ctx.clone(),
        };
        Value::Dynamic(Dynamic::new(Arc::new(pipe)).with_memoize(self.pure))
    }

    /// Drop memoized values here and below.
    pub fn invalidate(&self) {
        *self.memo.write().expect("node memo poisoned") = None;
        for input in &self.inputs {
            input.invalidate();
        }
    }

    /// Re-fix this node whenever `name` changes in the context's scope,
    /// pushing the fresh value to observers before the triggering bind
    /// returns. The subscription token unregisters on drop.
    ///
    /// The listener graph must be acyclic: a node whose re-fix writes a
    /// variable it listens to will recurse until the stack runs out.
    /// No cycle detection is performed.
    pub fn listen_to(self: &Arc<Node>, ctx: &EvalContext, name: &str) -> Subscription {
        let node = Arc::clone(self);
        let ctx = ctx.clone();
        let scope = Arc::clone(ctx.scope());
        scope.listen(name, move |_| {
            node.invalidate();
            match node.fix(&ctx, Depth::Deep) {
                Ok(value) => {
                    node.publish(&value);
                    Ok(value)
                }
                Err(failure) => {
                    // Observers still hear about the failed re-fix.
                    node.publish(&Value::from(failure.clone()));
                    Err(failure)
                }
            }
        })
    }

    /// Observe re-fixed values produced through [`Node::listen_to`].
    pub fn on_update(
        self: &Arc<Node>,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Subscription {
        let id = NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed);
        self.observers
            .write()
            .expect("node observers poisoned")
            .push(Observer {
                id,
                callback: Arc::new(callback),
            });
        let weak = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(node) = weak.upgrade() {
                node.observers
                    .write()
                    .expect("node observers poisoned")
                    .retain(|observer| observer.id != id);
            }
        })
    }

    /// Advisory hint about what type this node is likely to produce.
    pub fn prediction(&self) -> Option<TypePrediction> {
        self.prediction
            .read()
            .expect("node prediction poisoned")
            .clone()
    }

    /// Populate the hint from a learner, keyed by this node's name and
    /// the argument values it is about to be applied to.
    pub fn predict_with(&self, learner: &dyn TypeLearner, inputs: &[Value]) {
        *self.prediction.write().expect("node prediction poisoned") =
            learner.predict(&self.name, inputs);
    }

    fn publish(&self, value: &Value) {
        let callbacks: Vec<_> = self
            .observers
            .read()
            .expect("node observers poisoned")
            .iter()
            .map(|observer| Arc::clone(&observer.callback))
            .collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("op", &self.op)
            .field("name", &self.name)
            .field("pure", &self.pure)
            .field("inputs", &self.inputs.len())
            .finish()
    }
}

struct NodePipe {
    node: Arc<Node>,
    ctx: EvalContext,
}

impl Pipeable for NodePipe {
    fn pipe(&self, args: &[Value]) -> ValueResult<Value> {
        if args.is_empty() {
            return self.node.fix(&self.ctx, Depth::Deep);
        }
        let frame = self.ctx.scope().child(self.node.name());
        for (index, arg) in args.iter().enumerate() {
            frame.set_parameter(index, arg.clone());
        }
        self.node.fix(&self.ctx.with_scope(frame), Depth::Deep)
    }
}

pub struct NodeBuilder {
    op: Op,
    name: String,
    pure: bool,
    inputs: Vec<Arc<Node>>,
    source: SourceToken,
}

impl NodeBuilder {
    /// Declare the node pure: no reads of mutable state, safe to
    /// memoize. Purity is declared by the graph builder, not inferred.
    pub fn pure(mut self, pure: bool) -> NodeBuilder {
        self.pure = pure;
        self
    }

    pub fn input(mut self, input: Arc<Node>) -> NodeBuilder {
        self.inputs.push(input);
        self
    }

    pub fn inputs(mut self, inputs: Vec<Arc<Node>>) -> NodeBuilder {
        self.inputs = inputs;
        self
    }

    pub fn source(mut self, source: SourceToken) -> NodeBuilder {
        self.source = source;
        self
    }

    pub fn compute<F>(self, compute: F) -> Arc<Node>
    where
        F: Fn(&EvalContext, &[Value]) -> ValueResult<Value> + Send + Sync + 'static,
    {
        Arc::new(Node {
            op: self.op,
            name: self.name,
            pure: self.pure,
            inputs: self.inputs,
            source: self.source,
            compute: Arc::new(compute),
            memo: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
            prediction: RwLock::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;

    #[test]
    fn literal_fixes_to_its_value() {
        let ctx = EvalContext::new(Scope::root("test"));
        let node = Node::literal("hello".into());
        assert_eq!(node.fix(&ctx, Depth::Deep).unwrap(), Value::from("hello"));
    }

    #[test]
    fn surface_fix_defers_computation() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let node = Node::build(Op::Builtin, "counter").compute(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from(9))
        });
        let ctx = EvalContext::new(Scope::root("test"));
        let deferred = node.fix(&ctx, Depth::Limit(0)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match deferred {
            Value::Dynamic(d) => {
                assert_eq!(d.read().unwrap(), Value::from(9));
                assert_eq!(d.read().unwrap(), Value::from(9));
                assert_eq!(calls.load(Ordering::SeqCst), 2);
            }
            other => panic!("expected a dynamic value, got {other:?}"),
        }
    }

    #[test]
    fn limited_depth_counts_levels() {
        let leaf = Node::literal(1.into());
        let mid = Node::build(Op::Operator, "+")
            .pure(true)
            .inputs(vec![leaf, Node::literal(2.into())])
            .compute(|_, inputs| inputs[0].add(&inputs[1]));
        let ctx = EvalContext::new(Scope::root("test"));
        // One level: the mid node computes, its inputs were literals.
        assert_eq!(mid.fix(&ctx, Depth::Limit(2)).unwrap(), Value::from(3));
    }

    #[test]
    fn pure_nodes_memoize() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let node = Node::build(Op::Builtin, "pure-counter")
            .pure(true)
            .compute(move |_, _| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(Value::from(5))
            });
        let ctx = EvalContext::new(Scope::root("test"));
        node.fix(&ctx, Depth::Deep).unwrap();
        node.fix(&ctx, Depth::Deep).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        node.invalidate();
        node.fix(&ctx, Depth::Deep).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
