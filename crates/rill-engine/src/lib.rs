//! The Rill evaluation engine.
//!
//! Builds on the value model from `rill-value`: lexical [`Scope`]s
//! holding [`Variable`] bindings, the lazy/reactive expression graph of
//! [`Node`]s driven by [`Node::fix`], and the [`EvalContext`] that
//! carries the current scope and the failure/parallelism policies.
//! External collaborators plug in behind the [`UriHandler`] and
//! [`TypeLearner`] traits.

mod context;
mod listen;
mod node;
mod parallel;
mod predict;
mod scope;
mod store;
mod variable;

pub use context::EvalContext;
pub use listen::Subscription;
pub use node::{Compute, Depth, Node, NodeBuilder, Op, SourceToken};
pub use parallel::{fix_in_background, FixTask};
pub use predict::{CountBasedTypeLearner, TypeLearner, TypePrediction};
pub use scope::Scope;
pub use store::UriHandler;
pub use variable::{VarFlags, Variable};
