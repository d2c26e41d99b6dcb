//! Flush Scheduler
//!
//! This module batches invalidated computations and re-runs them.
//!
//! # Overview
//!
//! When a computation is invalidated it appends itself to its scheduler's
//! flush queue. A flush then:
//!
//! 1. Swaps the queue for an empty one, capturing a point-in-time snapshot.
//! 2. Calls `compute` on each captured computation, in the order they were
//!    queued.
//!
//! Computations invalidated while the flush is running land in the fresh
//! queue and wait for the next flush. Each flush therefore does bounded work,
//! and a computation that re-queues itself on every run cannot spin forever
//! inside a single pass.
//!
//! # Hosts
//!
//! Whether anything flushes automatically depends on the [`Host`]. An
//! interactive host (an event loop) gets one deferred flush armed per tick
//! as soon as something is queued. A batch host never flushes on its own;
//! callers drive [`Scheduler::flush`] themselves.

mod flush;
mod host;

pub use flush::{FlushReport, Scheduler};
pub use host::{BatchHost, DeferredTask, Host, TickHost, TokioHost};

pub(crate) use flush::WeakScheduler;
