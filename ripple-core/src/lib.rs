//! Ripple Core
//!
//! This crate provides the propagation core for the Ripple reactive engine.
//! It implements:
//!
//! - Computations that re-run when something they read changes
//! - Implicit dependency registration through the current computation
//! - A flush scheduler that batches re-runs, deferring them to the next tick
//!   when running inside an event loop
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: computations, the current-computation context, and the
//!   `Dependency`/`Signal` sources
//! - `scheduler`: the flush queue and the `Host` abstraction over the
//!   environment's deferred-task primitive
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ripple_core::{Scheduler, Signal};
//!
//! let scheduler = Scheduler::batch();
//! let count = Signal::new(0);
//! let doubled = Rc::new(Cell::new(0));
//!
//! let (reader, out) = (count.clone(), doubled.clone());
//! let _doubler = scheduler.watch(move || out.set(reader.get() * 2)).unwrap();
//!
//! count.set(5);
//! scheduler.flush().unwrap();
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod reactive;
pub mod scheduler;

mod config;
mod error;

pub use config::{ErrorPolicy, SchedulerConfig};
pub use error::{ComputeError, ConfigError, FlushError};
pub use reactive::{Computation, ComputationId, ComputationState, Dependency, Signal};
pub use scheduler::{BatchHost, FlushReport, Host, Scheduler, TickHost, TokioHost};
