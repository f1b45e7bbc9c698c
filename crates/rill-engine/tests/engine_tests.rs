//! Integration tests for the evaluation engine.
//!
//! Covers the externally observable contracts:
//! - lazy fixing, memoization, and depth-limited evaluation
//! - binding rules: readonly, constraints, volatile sharing
//! - reactive propagation through scope listeners
//! - the fail-fast vs tolerant failure policies
//! - parallel input fixing

use rill_engine::{Depth, EvalContext, Node, Op, Scope, VarFlags};
use rill_value::{ErrorKind, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn ctx(scope: &Arc<Scope>) -> EvalContext {
    EvalContext::new(Arc::clone(scope))
}

// ══════════════════════════════════════════════════════════════════════════════
// Fixing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn impure_nodes_recompute_on_every_fix() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let node = Node::build(Op::Builtin, "tick").compute(move |_, _| {
        Ok(Value::from(c.fetch_add(1, Ordering::SeqCst) as i64))
    });
    let root = Scope::root("root");
    let c = ctx(&root);
    assert_eq!(node.fix(&c, Depth::Deep).unwrap(), Value::from(0));
    assert_eq!(node.fix(&c, Depth::Deep).unwrap(), Value::from(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn pure_nodes_compute_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let node = Node::build(Op::Builtin, "stable")
        .pure(true)
        .compute(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Value::from("constant"))
        });
    let root = Scope::root("root");
    let c = ctx(&root);
    node.fix(&c, Depth::Deep).unwrap();
    node.fix(&c, Depth::Deep).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn depth_zero_wraps_without_evaluating() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let node = Node::build(Op::Builtin, "lazy").compute(move |_, _| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(Value::from("Hello World"))
    });
    let root = Scope::root("root");
    let deferred = node.fix(&ctx(&root), Depth::Limit(0)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0, "nothing ran yet");
    // Equality evaluates the dynamic, so it equals its product.
    assert_eq!(deferred, Value::from("Hello World"));
    assert!(calls.load(Ordering::SeqCst) >= 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Binding rules
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn readonly_rebind_fails_and_value_is_unchanged() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "pi", 3.into(), VarFlags::readonly(), None, None)
        .unwrap();
    let err = root
        .bind(&c, "pi", 4.into(), VarFlags::default(), None, None)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Immutability);
    assert_eq!(root.get("pi"), Value::from(3));
}

#[test]
fn constraint_rejects_and_accepts() {
    let root = Scope::root("root");
    let c = ctx(&root);
    // The candidate arrives as parameter 0 of the constraint's frame.
    let positive = Node::build(Op::Constraint, "value > 0").compute(|ctx, _| {
        let candidate = ctx.scope().parameter(0);
        Ok(Value::Boolean(candidate.to_integer()? > 0))
    });

    let err = root
        .bind(
            &c,
            "count",
            Value::from(-1),
            VarFlags::default(),
            Some(Arc::clone(&positive)),
            Some("value > 0"),
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert!(err.message.contains("value > 0"));
    assert_eq!(root.get("count"), Value::Void, "rejected bind leaves no binding");

    root.bind(
        &c,
        "count",
        1.into(),
        VarFlags::default(),
        Some(positive),
        Some("value > 0"),
    )
    .unwrap();
    assert_eq!(root.get("count"), Value::from(1));

    // The constraint still guards later updates.
    let err = root
        .bind(&c, "count", Value::from(-5), VarFlags::default(), None, None)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConstraintViolation);
    assert_eq!(root.get("count"), Value::from(1));
}

#[test]
fn volatile_bindings_are_shared_across_copy() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "shared", 1.into(), VarFlags::volatile(), None, None)
        .unwrap();
    root.bind(&c, "private", 1.into(), VarFlags::default(), None, None)
        .unwrap();

    let fork = root.copy();
    fork.bind(&c, "shared", 2.into(), VarFlags::default(), None, None)
        .unwrap();
    fork.bind(&c, "private", 2.into(), VarFlags::default(), None, None)
        .unwrap();

    assert_eq!(root.get("shared"), Value::from(2), "volatile is by reference");
    assert_eq!(root.get("private"), Value::from(1), "plain is by value");
}

#[test]
fn pure_frames_evaluate_in_isolation() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "ambient", 100.into(), VarFlags::default(), None, None)
        .unwrap();
    root.bind(&c, "captured", 7.into(), VarFlags::default(), None, None)
        .unwrap();

    let pure = root.pure_child("pure", &["captured"]);
    let pure_ctx = c.with_scope(Arc::clone(&pure));
    let reads = Node::build(Op::Block, "reads")
        .inputs(vec![Node::variable("ambient"), Node::variable("captured")])
        .compute(|_, inputs| Ok(Value::List(inputs.to_vec())));
    assert_eq!(
        reads.fix(&pure_ctx, Depth::Deep).unwrap(),
        Value::List(vec![Value::Void, Value::from(7)])
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Reactive propagation
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn update_refixes_listener_exactly_once() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "a", 1.into(), VarFlags::default(), None, None)
        .unwrap();
    root.bind(&c, "b", 2.into(), VarFlags::default(), None, None)
        .unwrap();

    let computes = Arc::new(AtomicUsize::new(0));
    let n = Arc::clone(&computes);
    let total = Node::build(Op::Operator, "a + b")
        .inputs(vec![Node::variable("a"), Node::variable("b")])
        .compute(move |_, inputs| {
            n.fetch_add(1, Ordering::SeqCst);
            inputs[0].add(&inputs[1])
        });
    assert_eq!(total.fix(&c, Depth::Deep).unwrap(), Value::from(3));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let _observing = total.on_update(move |value| {
        log.lock().unwrap().push(value.clone());
    });
    let _listening_a = total.listen_to(&c, "a");
    let _listening_b = total.listen_to(&c, "b");

    computes.store(0, Ordering::SeqCst);
    root.bind(&c, "a", 10.into(), VarFlags::default(), None, None)
        .unwrap();
    // The observer already saw the fresh value: the cascade completed
    // before bind returned.
    assert_eq!(computes.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().unwrap().as_slice(), &[Value::from(12)]);

    root.bind(&c, "b", 20.into(), VarFlags::default(), None, None)
        .unwrap();
    assert_eq!(computes.load(Ordering::SeqCst), 2);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[Value::from(12), Value::from(30)]
    );
}

#[test]
fn dropping_the_subscription_unregisters() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "x", 0.into(), VarFlags::default(), None, None)
        .unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let n = Arc::clone(&hits);
    let watcher = Node::build(Op::Listen, "watcher")
        .input(Node::variable("x"))
        .compute(move |_, inputs| {
            n.fetch_add(1, Ordering::SeqCst);
            Ok(inputs[0].clone())
        });

    let token = watcher.listen_to(&c, "x");
    root.bind(&c, "x", 1.into(), VarFlags::default(), None, None)
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    drop(token);
    root.bind(&c, "x", 2.into(), VarFlags::default(), None, None)
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1, "no re-fix after drop");
}

#[test]
fn a_failing_listener_does_not_stop_later_listeners() {
    let root = Scope::root("root");
    let c = ctx(&root);
    root.bind(&c, "x", 0.into(), VarFlags::default(), None, None)
        .unwrap();

    let later = Arc::new(AtomicUsize::new(0));
    let n = Arc::clone(&later);
    let _failing = root.listen("x", |_| Err(rill_value::Failure::script("deliberate")));
    let _counting = root.listen("x", move |_| {
        n.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Void)
    });

    root.bind(&c, "x", 1.into(), VarFlags::default(), None, None)
        .unwrap();
    assert_eq!(later.load(Ordering::SeqCst), 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Failure policy
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn fail_fast_aborts_and_tolerant_substitutes() {
    let failing = Node::build(Op::Builtin, "broken")
        .compute(|_, _| Err(rill_value::Failure::io("connection reset")));
    let sibling_ran = Arc::new(AtomicUsize::new(0));
    let n = Arc::clone(&sibling_ran);
    let sibling = Node::build(Op::Builtin, "fine").compute(move |_, _| {
        n.fetch_add(1, Ordering::SeqCst);
        Ok(Value::from("ok"))
    });
    let gather = Node::build(Op::Collection, "gather")
        .inputs(vec![failing, sibling])
        .compute(|_, inputs| Ok(Value::List(inputs.to_vec())));

    let root = Scope::root("root");
    let strict = ctx(&root);
    let err = gather.fix(&strict, Depth::Deep).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
    assert_eq!(sibling_ran.load(Ordering::SeqCst), 0, "aborted before the sibling");

    let tolerant = ctx(&root).tolerant();
    let value = gather.fix(&tolerant, Depth::Deep).unwrap();
    match value {
        Value::List(items) => {
            assert_eq!(items[0].error_kind(), Some(ErrorKind::Io));
            assert_eq!(items[1], Value::from("ok"));
        }
        other => panic!("expected a list, got {other:?}"),
    }
    assert_eq!(sibling_ran.load(Ordering::SeqCst), 1);
}

#[test]
fn fatal_failures_ignore_the_tolerant_policy() {
    let failing = Node::build(Op::Builtin, "broken")
        .compute(|_, _| Err(rill_value::Failure::script("unrecoverable").fatal()));
    let root = Scope::root("root");
    let tolerant = ctx(&root).tolerant();
    assert!(failing.fix(&tolerant, Depth::Deep).is_err());
}

// ══════════════════════════════════════════════════════════════════════════════
// Parallel fixing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn parallel_fix_joins_all_inputs_in_order() {
    let inputs: Vec<_> = (0..4)
        .map(|i| {
            Node::build(Op::Builtin, format!("input-{i}")).compute(move |_, _| {
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(Value::from(i))
            })
        })
        .collect();
    let gather = Node::build(Op::Collection, "gather")
        .inputs(inputs)
        .compute(|_, fixed| Ok(Value::List(fixed.to_vec())));

    let root = Scope::root("root");
    let parallel = ctx(&root).with_parallel(true);
    assert_eq!(
        gather.fix(&parallel, Depth::Deep).unwrap(),
        Value::List(vec![0.into(), 1.into(), 2.into(), 3.into()])
    );
}
