//! Lexical scopes.
//!
//! A [`Scope`] owns named [`Variable`] bindings, positional parameters,
//! and the listener registry that drives reactive updates. Scopes form a
//! chain through weak parent links; name resolution walks the chain
//! outward and stops at a pure frame, which is how pure expressions are
//! denied access to ambient mutable state.
//!
//! All writes go through [`Scope::bind`], which enforces the readonly
//! flag and any attached constraint before the slot changes, then
//! notifies listeners synchronously in registration order.

use crate::context::EvalContext;
use crate::listen::Subscription;
use crate::node::{Depth, Node};
use crate::variable::{VarFlags, Variable};
use dashmap::DashMap;
use rill_value::{Failure, Value, ValueResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

type Listener = Arc<dyn Fn(&Value) -> ValueResult<Value> + Send + Sync>;

struct ListenerEntry {
    id: u64,
    callback: Listener,
}

pub struct Scope {
    id: u64,
    name: String,
    parent: RwLock<Weak<Scope>>,
    pure: bool,
    variables: DashMap<String, Arc<Variable>>,
    parameters: DashMap<usize, Value>,
    listeners: DashMap<String, Vec<ListenerEntry>>,
}

impl Scope {
    fn make(name: &str, parent: Weak<Scope>, pure: bool) -> Arc<Scope> {
        Arc::new(Scope {
            id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            parent: RwLock::new(parent),
            pure,
            variables: DashMap::new(),
            parameters: DashMap::new(),
            listeners: DashMap::new(),
        })
    }

    /// A top-level scope with no parent.
    pub fn root(name: &str) -> Arc<Scope> {
        Scope::make(name, Weak::new(), false)
    }

    /// A nested scope that resolves through `self`.
    pub fn child(self: &Arc<Scope>, name: &str) -> Arc<Scope> {
        Scope::make(name, Arc::downgrade(self), false)
    }

    /// A pure frame. Resolution stops here: only its own bindings and
    /// parameters, plus the explicitly captured names, are visible.
    /// Captures are taken by value and bound readonly.
    pub fn pure_child(self: &Arc<Scope>, name: &str, captured: &[&str]) -> Arc<Scope> {
        let child = Scope::make(name, Arc::downgrade(self), true);
        for &capture in captured {
            if let Some(variable) = self.resolve(capture) {
                let flags = VarFlags {
                    readonly: true,
                    pure: true,
                    ..VarFlags::default()
                };
                child.variables.insert(
                    capture.to_string(),
                    Arc::new(Variable::new(
                        variable.value(),
                        flags,
                        None,
                        None,
                        variable.owner(),
                    )),
                );
            }
        }
        child
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pure(&self) -> bool {
        self.pure
    }

    pub fn is_root(&self) -> bool {
        self.parent
            .read()
            .expect("scope parent poisoned")
            .upgrade()
            .is_none()
    }

    fn parent(&self) -> Option<Arc<Scope>> {
        self.parent
            .read()
            .expect("scope parent poisoned")
            .upgrade()
    }

    /// The frame in which `name` is bound, walking outward from `self`
    /// and stopping at a pure boundary.
    pub fn frame_for(self: &Arc<Scope>, name: &str) -> Option<Arc<Scope>> {
        let mut current = Arc::clone(self);
        loop {
            if current.variables.contains_key(name) {
                return Some(current);
            }
            if current.pure {
                return None;
            }
            current = current.parent()?;
        }
    }

    /// Resolve a binding by name.
    pub fn resolve(self: &Arc<Scope>, name: &str) -> Option<Arc<Variable>> {
        self.frame_for(name)
            .and_then(|frame| frame.variables.get(name).map(|entry| Arc::clone(entry.value())))
    }

    pub fn has(self: &Arc<Scope>, name: &str) -> bool {
        self.frame_for(name).is_some()
    }

    /// The current value of a binding, or Void when unbound.
    pub fn get(self: &Arc<Scope>, name: &str) -> Value {
        self.resolve(name).map(|v| v.value()).unwrap_or(Value::Void)
    }

    /// A positional parameter, resolved like a variable: own frame
    /// first, then outward until a pure boundary.
    pub fn parameter(self: &Arc<Scope>, index: usize) -> Value {
        let mut current = Arc::clone(self);
        loop {
            if let Some(value) = current.parameters.get(&index) {
                return value.clone();
            }
            if current.pure {
                return Value::Void;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return Value::Void,
            }
        }
    }

    pub fn set_parameter(&self, index: usize, value: Value) {
        self.parameters.insert(index, value);
    }

    /// Bind `name` to `value`.
    ///
    /// If the name already resolves, the existing binding is updated in
    /// the frame that owns it: readonly and fixed bindings reject the
    /// write, an attached constraint is re-checked against the new
    /// value, and the constraint itself cannot be replaced. Otherwise a
    /// new binding is created in this frame. Either way the owning
    /// frame's listeners are notified before `bind` returns.
    pub fn bind(
        self: &Arc<Scope>,
        ctx: &EvalContext,
        name: &str,
        value: Value,
        flags: VarFlags,
        constraint: Option<Arc<Node>>,
        constraint_source: Option<&str>,
    ) -> ValueResult<Arc<Variable>> {
        if let Some(owning) = self.frame_for(name) {
            let existing = owning
                .variables
                .get(name)
                .map(|entry| Arc::clone(entry.value()))
                .ok_or_else(|| Failure::script(format!("binding '{name}' vanished")))?;
            if existing.is_readonly() {
                return Err(Failure::immutability(name));
            }
            if constraint.is_some() {
                return Err(Failure::script(format!(
                    "cannot change the constraint on '{name}'"
                )));
            }
            if let Some(node) = existing.constraint() {
                owning.check_constraint(
                    ctx,
                    name,
                    &value,
                    node,
                    existing.constraint_source().unwrap_or("<constraint>"),
                )?;
            }
            existing.set_value(value);
            tracing::debug!(scope = %owning.name, variable = name, "binding updated");
            owning.notify(name);
            return Ok(existing);
        }

        if flags.volatile && self.pure {
            return Err(Failure::script(format!(
                "cannot declare volatile variable '{name}' in a pure scope"
            )));
        }
        if let Some(node) = &constraint {
            self.check_constraint(
                ctx,
                name,
                &value,
                node,
                constraint_source.unwrap_or("<constraint>"),
            )?;
        }
        let variable = Arc::new(Variable::new(
            value,
            flags,
            constraint,
            constraint_source.map(str::to_string),
            ctx.id(),
        ));
        self.variables.insert(name.to_string(), Arc::clone(&variable));
        tracing::debug!(scope = %self.name, variable = name, "binding created");
        self.notify(name);
        Ok(variable)
    }

    /// Evaluate a constraint predicate against a candidate value. The
    /// candidate is bound as parameter 0 of a throwaway child frame;
    /// anything but `true` rejects the write.
    fn check_constraint(
        self: &Arc<Scope>,
        ctx: &EvalContext,
        name: &str,
        candidate: &Value,
        constraint: &Arc<Node>,
        source: &str,
    ) -> ValueResult<()> {
        let frame = self.child("constraint");
        frame.set_parameter(0, candidate.clone());
        let verdict = constraint
            .fix(&ctx.with_scope(frame), Depth::Deep)
            .map_err(|failure| {
                Failure::constraint(name, &format!("{source}: {failure}"))
            })?;
        if matches!(verdict, Value::Boolean(true)) {
            Ok(())
        } else {
            Err(Failure::constraint(name, source))
        }
    }

    /// Register a listener for updates to `name`, on the frame where
    /// the name currently resolves (or this frame if it is unbound).
    /// The returned token unregisters the listener when dropped.
    ///
    /// The registration is never re-targeted: `notify` walks from the
    /// owning frame toward the root, so a listener registered here while
    /// the name was unbound will not fire for a variable later created
    /// in an ancestor frame. Register after the variable exists, or on
    /// the frame that will own it.
    pub fn listen(
        self: &Arc<Scope>,
        name: &str,
        callback: impl Fn(&Value) -> ValueResult<Value> + Send + Sync + 'static,
    ) -> Subscription {
        let target = self.frame_for(name).unwrap_or_else(|| Arc::clone(self));
        let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
        target
            .listeners
            .entry(name.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                callback: Arc::new(callback),
            });
        tracing::debug!(scope = %target.name, variable = name, listener = id, "listener registered");
        let weak = Arc::downgrade(&target);
        let key = name.to_string();
        Subscription::new(move || {
            if let Some(scope) = weak.upgrade() {
                if let Some(mut entries) = scope.listeners.get_mut(&key) {
                    entries.retain(|entry| entry.id != id);
                }
            }
        })
    }

    /// Invoke the listeners registered for `name` in this frame and its
    /// ancestors, in registration order, with the current value. A
    /// failing listener is logged and does not stop the rest.
    pub fn notify(self: &Arc<Scope>, name: &str) -> Value {
        let value = self.get(name);
        // Snapshot the callbacks first so a listener can rebind
        // variables without deadlocking against the registry.
        let mut callbacks: Vec<Listener> = Vec::new();
        let mut current = Some(Arc::clone(self));
        while let Some(scope) = current {
            if let Some(entries) = scope.listeners.get(name) {
                callbacks.extend(entries.iter().map(|entry| Arc::clone(&entry.callback)));
            }
            current = scope.parent();
        }
        for callback in callbacks {
            if let Err(failure) = callback(&value) {
                tracing::warn!(variable = name, error = %failure, "listener failed during notify");
            }
        }
        value
    }

    /// A detached copy of this frame: same parent, same purity, values
    /// duplicated except for volatile bindings, which stay shared by
    /// reference. Listeners are not copied.
    pub fn copy(self: &Arc<Scope>) -> Arc<Scope> {
        let copy = Scope::make(
            &self.name,
            self.parent.read().expect("scope parent poisoned").clone(),
            self.pure,
        );
        for entry in self.variables.iter() {
            let variable = if entry.value().is_volatile() {
                Arc::clone(entry.value())
            } else {
                Arc::new(entry.value().duplicate())
            };
            copy.variables.insert(entry.key().clone(), variable);
        }
        for entry in self.parameters.iter() {
            copy.parameters.insert(*entry.key(), entry.value().clone());
        }
        copy
    }

    /// Drop everything this frame holds and detach it from its parent.
    pub fn destroy(&self) {
        self.listeners.clear();
        self.variables.clear();
        self.parameters.clear();
        *self.parent.write().expect("scope parent poisoned") = Weak::new();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pure", &self.pure)
            .field("variables", &self.variables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(scope: &Arc<Scope>) -> EvalContext {
        EvalContext::new(Arc::clone(scope))
    }

    #[test]
    fn resolution_walks_outward() {
        let root = Scope::root("root");
        root.bind(&ctx(&root), "a", 1.into(), VarFlags::default(), None, None)
            .unwrap();
        let inner = root.child("inner");
        assert_eq!(inner.get("a"), Value::from(1));
        assert_eq!(inner.get("missing"), Value::Void);
    }

    #[test]
    fn update_lands_in_the_owning_frame() {
        let root = Scope::root("root");
        let c = ctx(&root);
        root.bind(&c, "a", 1.into(), VarFlags::default(), None, None)
            .unwrap();
        let inner = root.child("inner");
        inner
            .bind(&c, "a", 2.into(), VarFlags::default(), None, None)
            .unwrap();
        assert_eq!(root.get("a"), Value::from(2));
        assert!(!inner.variables.contains_key("a"));
    }

    #[test]
    fn pure_frames_stop_resolution() {
        let root = Scope::root("root");
        let c = ctx(&root);
        root.bind(&c, "secret", 42.into(), VarFlags::default(), None, None)
            .unwrap();
        let pure = root.pure_child("pure", &["allowed"]);
        assert_eq!(pure.get("secret"), Value::Void);
    }

    #[test]
    fn captures_are_readonly_snapshots() {
        let root = Scope::root("root");
        let c = ctx(&root);
        root.bind(&c, "n", 10.into(), VarFlags::default(), None, None)
            .unwrap();
        let pure = root.pure_child("pure", &["n"]);
        assert_eq!(pure.get("n"), Value::from(10));
        let err = pure
            .bind(&c, "n", 11.into(), VarFlags::default(), None, None)
            .unwrap_err();
        assert_eq!(err.kind, rill_value::ErrorKind::Immutability);
        // The capture is a snapshot, not a live view.
        root.bind(&c, "n", 20.into(), VarFlags::default(), None, None)
            .unwrap();
        assert_eq!(pure.get("n"), Value::from(10));
    }

    #[test]
    fn volatile_is_rejected_in_pure_frames() {
        let root = Scope::root("root");
        let pure = root.pure_child("pure", &[]);
        let err = pure
            .bind(&ctx(&root), "v", 1.into(), VarFlags::volatile(), None, None)
            .unwrap_err();
        assert_eq!(err.kind, rill_value::ErrorKind::Script);
    }

    #[test]
    fn unbound_registrations_stay_on_their_frame() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let root = Scope::root("root");
        let c = ctx(&root);
        let inner = root.child("inner");

        let early = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&early);
        let _orphan = inner.listen("late", move |_| {
            n.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Void)
        });

        // The variable lands in the root afterwards; notify walks
        // rootward from the owning frame, so the registration left on
        // the inner frame does not fire.
        root.bind(&c, "late", 1.into(), VarFlags::default(), None, None)
            .unwrap();
        assert_eq!(early.load(Ordering::SeqCst), 0);

        // Once the name resolves, a new registration lands on the
        // owning frame and fires.
        let after = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&after);
        let _live = inner.listen("late", move |_| {
            n.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Void)
        });
        root.bind(&c, "late", 2.into(), VarFlags::default(), None, None)
            .unwrap();
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_detaches_the_frame() {
        let root = Scope::root("root");
        let c = ctx(&root);
        root.bind(&c, "a", 1.into(), VarFlags::default(), None, None)
            .unwrap();
        let inner = root.child("inner");
        inner.destroy();
        assert_eq!(inner.get("a"), Value::Void);
    }
}
