//! The flush queue and the scheduler that drains it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::host::{BatchHost, Host};
use crate::config::{ErrorPolicy, SchedulerConfig};
use crate::error::{ComputeError, FlushError};
use crate::reactive::Computation;

/// What a single flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Computations whose callable ran to completion.
    pub computed: usize,
    /// Computations that were stopped after being queued.
    pub skipped: usize,
    /// Failures recorded under [`ErrorPolicy::Isolate`].
    pub failures: Vec<ComputeError>,
}

impl FlushReport {
    /// Whether no computation failed during the flush.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

struct SchedulerInner {
    queue: RefCell<Vec<Computation>>,
    flushing: Cell<bool>,
    deferred_pending: Cell<bool>,
    host: Rc<dyn Host>,
    config: SchedulerConfig,
}

/// Batches invalidated computations and re-runs them.
///
/// Cloning a `Scheduler` creates a new handle to the same queue.
///
/// # Example
///
/// ```rust
/// use ripple_core::{Scheduler, Signal};
///
/// let scheduler = Scheduler::batch();
/// let name = Signal::new("ada");
///
/// let reader = name.clone();
/// let greeter = scheduler.watch(move || println!("hello, {}", reader.get())).unwrap();
///
/// name.set("grace");
/// let report = scheduler.flush().unwrap();
/// assert_eq!(report.computed, 1);
/// assert_eq!(greeter.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

/// Non-owning scheduler handle held by computations.
#[derive(Clone)]
pub(crate) struct WeakScheduler {
    inner: Weak<SchedulerInner>,
}

impl WeakScheduler {
    pub(crate) fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

/// Clears the flushing flag when dropped.
struct FlushGuard<'a> {
    flushing: &'a Cell<bool>,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flushing.set(false);
    }
}

impl Scheduler {
    /// Create a scheduler that defers flushes through `host`.
    pub fn new(host: Rc<dyn Host>, config: SchedulerConfig) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(Vec::new()),
                flushing: Cell::new(false),
                deferred_pending: Cell::new(false),
                host,
                config,
            }),
        }
    }

    /// A scheduler for batch or server use, flushed explicitly.
    pub fn batch() -> Self {
        Self::new(Rc::new(BatchHost), SchedulerConfig::default())
    }

    /// The configuration this scheduler was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Number of computations waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Whether a flush is running right now.
    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.get()
    }

    /// Whether a deferred flush has been armed and has not started yet.
    pub fn is_deferred_pending(&self) -> bool {
        self.inner.deferred_pending.get()
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Append an invalidated computation to the flush queue.
    pub(crate) fn enqueue(&self, computation: Computation) {
        let queued = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.push(computation);
            queue.len()
        };
        tracing::trace!(queued, "computation queued for flush");

        if self.inner.config.queue_warn_threshold == Some(queued) {
            tracing::warn!(
                queued,
                "flush queue reached its warning threshold; is anything flushing it?"
            );
        }

        if self.inner.host.is_interactive() {
            self.queue_deferred_flush();
        }
    }

    /// Arm a flush to run on the host's next tick. Does nothing if one is
    /// already armed.
    pub fn queue_deferred_flush(&self) {
        if self.inner.deferred_pending.replace(true) {
            return;
        }
        tracing::trace!("arming deferred flush");

        let weak = Rc::downgrade(&self.inner);
        self.inner.host.defer(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                let scheduler = Scheduler { inner };
                scheduler.run_deferred();
            }
        }));
    }

    /// Body of an armed deferred flush.
    ///
    /// A tick can be driven from inside a running flush. The flush is not
    /// re-entered then; the task hands itself to the next tick instead, so
    /// the pending flag always has a live host task behind it.
    fn run_deferred(&self) {
        if self.is_flushing() {
            tracing::debug!("deferred flush fired during a flush, moving it to the next tick");
            self.inner.deferred_pending.set(false);
            self.queue_deferred_flush();
            return;
        }

        if let Err(err) = self.flush() {
            tracing::error!(error = %err, "deferred flush failed");
        }
    }

    /// Re-run every computation queued before this call, in queue order.
    ///
    /// Computations invalidated while the flush runs are left for the next
    /// flush. Calling `flush` from inside a flush is a programming error and
    /// returns [`FlushError::Reentrant`].
    pub fn flush(&self) -> Result<FlushReport, FlushError> {
        if self.inner.flushing.replace(true) {
            tracing::error!("flush called while a flush is already in progress");
            return Err(FlushError::Reentrant);
        }
        let _guard = FlushGuard {
            flushing: &self.inner.flushing,
        };
        self.inner.deferred_pending.set(false);

        let batch = std::mem::take(&mut *self.inner.queue.borrow_mut());
        tracing::debug!(batch = batch.len(), "flushing computations");

        let mut report = FlushReport::default();
        let mut batch = batch.into_iter();
        while let Some(computation) = batch.next() {
            if computation.is_stopped() {
                report.skipped += 1;
                continue;
            }

            match computation.compute() {
                Ok(()) => report.computed += 1,
                Err(err) => match self.inner.config.error_policy {
                    ErrorPolicy::Isolate => {
                        tracing::error!(
                            error = %err,
                            "computation failed during flush, continuing"
                        );
                        report.failures.push(err);
                    }
                    ErrorPolicy::Propagate => {
                        self.requeue_front(batch.collect());
                        return Err(err.into());
                    }
                },
            }
        }

        tracing::debug!(
            computed = report.computed,
            skipped = report.skipped,
            failed = report.failures.len(),
            "flush complete"
        );
        Ok(report)
    }

    /// Put computations a failed pass never reached ahead of anything queued
    /// since the pass started.
    fn requeue_front(&self, unreached: Vec<Computation>) {
        if unreached.is_empty() {
            return;
        }
        tracing::debug!(unreached = unreached.len(), "requeueing computations after failed flush");

        {
            let mut queue = self.inner.queue.borrow_mut();
            let newer = std::mem::replace(&mut *queue, unreached);
            queue.extend(newer);
        }

        if self.inner.host.is_interactive() {
            self.queue_deferred_flush();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::batch()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("flushing", &self.is_flushing())
            .field("deferred_pending", &self.is_deferred_pending())
            .field("config", &self.inner.config)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
