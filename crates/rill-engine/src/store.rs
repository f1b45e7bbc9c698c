//! External collaborators behind URIs.
//!
//! A [`UriHandler`] adapts one URI scheme (a key-value store, a queue,
//! a socket) to the value model. Every operation has a Void-returning
//! or no-op default so a handler implements only what its scheme
//! supports; callers treat Void as "not provided".

use crate::listen::Subscription;
use rill_value::{Pipeable, Uri, Value, ValueResult};
use std::sync::Arc;

/// Adapter for a single URI scheme.
pub trait UriHandler: Send + Sync {
    /// The URI this handler was mounted for.
    fn uri(&self) -> &Uri;

    // ── value transfer ──

    /// Read the current value. `blocking` asks to wait for one to be
    /// available; `mutate` asks to consume it.
    fn read(&self, _blocking: bool, _mutate: bool) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Write a value. `blocking` asks to wait for capacity; `mutate`
    /// asks to replace rather than append.
    fn write(&self, _value: &Value, _blocking: bool, _mutate: bool) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Every value currently held.
    fn all(&self) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Remove and return every value currently held.
    fn drain(&self) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    // ── keyed access ──

    fn get(&self, _key: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    fn set(&self, _key: &Value, _value: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Remove a value by key, returning what was removed.
    fn remove(&self, _key: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Remove every occurrence of a value, returning what was removed.
    fn remove_value(&self, _value: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    // ── sequence access ──

    fn append(&self, _value: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    fn prepend(&self, _value: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    fn size(&self) -> ValueResult<usize> {
        Ok(0)
    }

    // ── events ──

    /// Broadcast a value to current subscribers.
    fn publish(&self, _value: &Value) -> ValueResult<Value> {
        Ok(Value::Void)
    }

    /// Deliver each arriving value to `consumer`. The returned token
    /// unsubscribes on drop.
    fn subscribe(&self, _consumer: Arc<dyn Pipeable>) -> ValueResult<Subscription> {
        Ok(Subscription::new(|| {}))
    }

    // ── lifecycle ──

    fn init(&self) -> ValueResult<()> {
        Ok(())
    }

    fn start(&self) -> ValueResult<()> {
        Ok(())
    }

    fn pause(&self) -> ValueResult<()> {
        Ok(())
    }

    fn unpause(&self) -> ValueResult<()> {
        Ok(())
    }

    fn stop(&self) -> ValueResult<()> {
        Ok(())
    }

    fn destroy(&self) -> ValueResult<()> {
        Ok(())
    }
}
