//! Computation Implementation
//!
//! A Computation is a unit of reactive work: it wraps a callable and re-runs
//! it whenever something the callable read has changed.
//!
//! # Lifecycle
//!
//! ```text
//!            compute()                 return
//!   Idle ─────────────────> Running ─────────────> Idle
//!    │                        │
//!    │ invalidate()           │ invalidate()  (not re-enqueued)
//!    v                        v
//!   Invalidated <─────────────┘
//!    │
//!    │ stop()  (from any state)
//!    v
//!   Stopped  (terminal)
//! ```
//!
//! 1. `compute` clears the invalidated flag, installs the computation as the
//!    current one and runs the callable. Sources read during the run register
//!    themselves against it.
//!
//! 2. When a source changes it calls `invalidate`. The computation is queued
//!    on its scheduler for the next flush and its invalidation callbacks fire
//!    right away, in registration order.
//!
//! 3. The scheduler's flush calls `compute` again, which re-establishes
//!    dependencies from scratch.
//!
//! A computation that is invalidated while it is running is only marked; it
//! is not queued, since re-running it mid-run would corrupt the current
//! scope.
//!
//! # Ownership
//!
//! `Computation` is a cheap handle around shared state. The scheduler's queue
//! holds strong handles while a computation waits for a flush; sources keep
//! [`WeakComputation`]s. A computation only holds a weak reference back to
//! its scheduler.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::context::{self, ReactiveContext};
use crate::error::ComputeError;
use crate::scheduler::{Scheduler, WeakScheduler};

/// Unique identifier for a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputationId(u64);

impl ComputationId {
    /// Generate a new unique computation ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ComputationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Observable lifecycle state of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationState {
    /// Up to date and waiting.
    Idle,
    /// The callable is executing.
    Running,
    /// The last run has been superseded.
    Invalidated,
    /// Permanently retired.
    Stopped,
}

type InvalidationCallback = Box<dyn FnOnce()>;

enum Callable {
    Plain(Box<dyn FnMut()>),
    WithHandle(Box<dyn FnMut(&Computation)>),
}

impl Callable {
    fn invoke(&mut self, handle: &Computation) {
        match self {
            Callable::Plain(f) => f(),
            Callable::WithHandle(f) => f(handle),
        }
    }
}

struct ComputationInner {
    id: ComputationId,
    scheduler: WeakScheduler,

    /// Checked out for the duration of a run, and released on stop.
    callable: RefCell<Option<Callable>>,

    invalidated: Cell<bool>,
    stopped: Cell<bool>,
    running: Cell<bool>,

    callbacks: RefCell<SmallVec<[InvalidationCallback; 2]>>,
    run_count: Cell<u64>,
}

/// A unit of reactive work.
///
/// # Example
///
/// ```rust
/// use ripple_core::{Computation, Scheduler, Signal};
///
/// let scheduler = Scheduler::batch();
/// let count = Signal::new(1);
///
/// let reader = count.clone();
/// let computation = Computation::new(&scheduler, move || {
///     println!("count is {}", reader.get());
/// });
/// computation.compute().unwrap();
///
/// count.set(2);
/// assert_eq!(scheduler.pending(), 1);
/// scheduler.flush().unwrap();
/// assert_eq!(computation.run_count(), 2);
/// ```
///
/// Sources only hold weak handles, so a computation stops reacting once
/// the last `Computation` handle to it is dropped.
#[derive(Clone)]
#[must_use = "a computation stops reacting once its last handle is dropped"]
pub struct Computation {
    inner: Rc<ComputationInner>,
}

/// A non-owning handle to a computation, held by sources.
#[derive(Clone)]
pub struct WeakComputation {
    id: ComputationId,
    inner: Weak<ComputationInner>,
}

impl Computation {
    /// Create a computation that re-runs `f`. It does not run until
    /// [`compute`](Self::compute) is called.
    pub fn new<F>(scheduler: &Scheduler, f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        Self::from_callable(scheduler, Callable::Plain(Box::new(f)))
    }

    /// Create a computation whose callable receives the computation itself,
    /// so it can stop itself or register invalidation callbacks.
    pub fn with_handle<F>(scheduler: &Scheduler, f: F) -> Self
    where
        F: FnMut(&Computation) + 'static,
    {
        Self::from_callable(scheduler, Callable::WithHandle(Box::new(f)))
    }

    fn from_callable(scheduler: &Scheduler, callable: Callable) -> Self {
        Self {
            inner: Rc::new(ComputationInner {
                id: ComputationId::new(),
                scheduler: scheduler.downgrade(),
                callable: RefCell::new(Some(callable)),
                invalidated: Cell::new(false),
                stopped: Cell::new(false),
                running: Cell::new(false),
                callbacks: RefCell::new(SmallVec::new()),
                run_count: Cell::new(0),
            }),
        }
    }

    /// The computation currently running on this thread, if any.
    pub fn current() -> Option<Computation> {
        context::current()
    }

    /// Run `f` without a current computation.
    pub fn run_without_tracking<R>(f: impl FnOnce() -> R) -> R {
        context::untracked(f)
    }

    /// The computation's unique ID.
    pub fn id(&self) -> ComputationId {
        self.inner.id
    }

    /// Run the callable with this computation installed as current.
    ///
    /// Does nothing if the computation is stopped, or if it is already
    /// running further up the stack. A panic in the callable is caught after
    /// the current scope and running flag have been restored, and returned
    /// as a [`ComputeError`]; the computation stays usable.
    pub fn compute(&self) -> Result<(), ComputeError> {
        let inner = &self.inner;
        if inner.stopped.get() {
            tracing::trace!(id = %inner.id, "skipping compute of stopped computation");
            return Ok(());
        }

        let Some(mut callable) = inner.callable.borrow_mut().take() else {
            tracing::warn!(
                id = %inner.id,
                "compute called while computation is already running"
            );
            return Ok(());
        };

        inner.invalidated.set(false);
        inner.running.set(true);
        tracing::trace!(id = %inner.id, run = inner.run_count.get() + 1, "computing");

        let outcome = {
            let _ctx = ReactiveContext::enter(Some(self.clone()));
            panic::catch_unwind(AssertUnwindSafe(|| callable.invoke(self)))
        };

        inner.running.set(false);
        inner.run_count.set(inner.run_count.get() + 1);
        if !inner.stopped.get() {
            *inner.callable.borrow_mut() = Some(callable);
        }

        outcome.map_err(|payload| {
            let err = ComputeError::from_panic(inner.id, payload);
            tracing::debug!(error = %err, "computation failed");
            err
        })
    }

    /// Mark this run as superseded.
    ///
    /// The first call after a run queues the computation on its scheduler
    /// (unless it is stopped or running) and fires every pending
    /// invalidation callback, in registration order, with tracking
    /// suppressed. Further calls are no-ops until the next `compute`.
    pub fn invalidate(&self) {
        let inner = &self.inner;
        if inner.invalidated.replace(true) {
            return;
        }
        tracing::trace!(id = %inner.id, "invalidated");

        if !inner.stopped.get() && !inner.running.get() {
            match inner.scheduler.upgrade() {
                Some(scheduler) => scheduler.enqueue(self.clone()),
                None => tracing::trace!(id = %inner.id, "scheduler dropped, not queueing"),
            }
        }

        let callbacks = std::mem::take(&mut *inner.callbacks.borrow_mut());
        for callback in callbacks {
            context::untracked(callback);
        }
    }

    /// Register `callback` to run once when this computation is next
    /// invalidated. If it already is, `callback` runs immediately.
    pub fn on_invalidate<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        if self.inner.invalidated.get() {
            context::untracked(callback);
        } else {
            self.inner.callbacks.borrow_mut().push(Box::new(callback));
        }
    }

    /// Retire the computation for good.
    ///
    /// Invalidates it, so pending callbacks still fire exactly once, and
    /// drops the callable. Calling `stop` again does nothing.
    pub fn stop(&self) {
        if self.inner.stopped.replace(true) {
            return;
        }
        tracing::debug!(id = %self.inner.id, "stopping computation");

        let released = self.inner.callable.borrow_mut().take();
        drop(released);

        self.invalidate();
    }

    /// Run `f` with this computation installed as current.
    pub fn run_in<R>(&self, f: impl FnOnce() -> R) -> R {
        context::run_in_scope(Some(self.clone()), f)
    }

    /// Current lifecycle state. A stopped computation reports `Stopped`
    /// even while its last run is still unwinding.
    pub fn state(&self) -> ComputationState {
        if self.inner.stopped.get() {
            ComputationState::Stopped
        } else if self.inner.running.get() {
            ComputationState::Running
        } else if self.inner.invalidated.get() {
            ComputationState::Invalidated
        } else {
            ComputationState::Idle
        }
    }

    /// Whether the last run has been superseded.
    pub fn is_invalidated(&self) -> bool {
        self.inner.invalidated.get()
    }

    /// Whether `stop` has been called.
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.get()
    }

    /// Whether the callable is executing right now.
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Number of times the callable has been invoked.
    pub fn run_count(&self) -> u64 {
        self.inner.run_count.get()
    }

    /// The scheduler this computation queues itself on, if it is still alive.
    pub fn scheduler(&self) -> Option<Scheduler> {
        self.inner.scheduler.upgrade()
    }

    /// A weak handle, as held by sources.
    pub fn downgrade(&self) -> WeakComputation {
        WeakComputation {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of invalidation callbacks waiting for the next invalidation.
    pub(crate) fn pending_callbacks(&self) -> usize {
        self.inner.callbacks.borrow().len()
    }

    /// Whether two handles refer to the same computation.
    pub fn ptr_eq(&self, other: &Computation) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl WeakComputation {
    /// ID of the computation this handle points at.
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// The computation, if any strong handle to it is still alive.
    pub fn upgrade(&self) -> Option<Computation> {
        self.inner.upgrade().map(|inner| Computation { inner })
    }
}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("run_count", &self.run_count())
            .field("pending_callbacks", &self.pending_callbacks())
            .finish()
    }
}

impl fmt::Debug for WeakComputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakComputation").field(&self.id).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
