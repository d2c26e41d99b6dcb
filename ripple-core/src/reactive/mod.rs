//! Reactive Primitives
//!
//! This module implements computations and the tracking that connects them
//! to reactive sources.
//!
//! # Concepts
//!
//! ## Computations
//!
//! A [`Computation`] wraps a callable. While the callable runs, the
//! computation is installed as the *current computation* for the thread.
//!
//! ## Sources
//!
//! A source is anything that holds a value computations read. When read, it
//! looks up the current computation and remembers it; when changed, it
//! invalidates everything it remembered. [`Dependency`] implements that
//! bookkeeping and [`Signal`] is a ready-made source built on it.
//!
//! ## Invalidation
//!
//! Invalidating a computation fires its `on_invalidate` callbacks and queues
//! it on its [`Scheduler`](crate::Scheduler). The next flush re-runs it,
//! and the re-run establishes a fresh set of dependencies.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded: handles are `Rc`-based and the
//! current computation lives in a thread-local slot.

mod computation;
mod context;
mod dependency;
mod signal;
mod watch;

pub use computation::{Computation, ComputationId, ComputationState, WeakComputation};
pub use context::{current, run_in_scope, untracked, ReactiveContext};
pub use dependency::Dependency;
pub use signal::Signal;
