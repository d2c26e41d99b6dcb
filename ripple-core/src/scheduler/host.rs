//! Host integration.
//!
//! The scheduler needs two things from its environment: whether it is
//! interactive, and a way to run a task "as soon as possible after the
//! current synchronous work". [`Host`] captures both.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// A task handed to [`Host::defer`].
pub type DeferredTask = Box<dyn FnOnce()>;

/// The environment a [`Scheduler`](super::Scheduler) runs in.
pub trait Host {
    /// Whether a flush should be armed automatically when a computation is
    /// queued. Read once per enqueue.
    fn is_interactive(&self) -> bool;

    /// Run `task` once, after the current synchronous work has finished.
    fn defer(&self, task: DeferredTask);
}

/// Batch or server mode: nothing flushes unless the caller asks.
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchHost;

impl Host for BatchHost {
    fn is_interactive(&self) -> bool {
        false
    }

    fn defer(&self, task: DeferredTask) {
        tracing::warn!("deferred flush requested on a batch host; call flush explicitly");
        drop(task);
    }
}

/// An interactive host driven by hand.
///
/// Deferred tasks are collected until [`run_pending`](Self::run_pending) is
/// called, which plays the role of one event-loop tick. Useful for embedding
/// the scheduler in a custom loop, and for tests.
pub struct TickHost {
    interactive: Cell<bool>,
    tasks: RefCell<VecDeque<DeferredTask>>,
}

impl TickHost {
    pub fn new() -> Self {
        Self {
            interactive: Cell::new(true),
            tasks: RefCell::new(VecDeque::new()),
        }
    }

    /// Switch between interactive and batch behaviour.
    pub fn set_interactive(&self, interactive: bool) {
        self.interactive.set(interactive);
    }

    /// Number of deferred tasks waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Run the tasks that were deferred before this call. Tasks deferred
    /// while they run wait for the next tick. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        let ran = tasks.len();
        for task in tasks {
            task();
        }
        ran
    }
}

impl Default for TickHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for TickHost {
    fn is_interactive(&self) -> bool {
        self.interactive.get()
    }

    fn defer(&self, task: DeferredTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}

impl fmt::Debug for TickHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHost")
            .field("interactive", &self.interactive.get())
            .field("pending", &self.pending())
            .finish()
    }
}

/// An interactive host backed by tokio.
///
/// Deferred tasks are spawned with [`tokio::task::spawn_local`], so the
/// scheduler must be used from inside a [`tokio::task::LocalSet`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioHost;

impl Host for TokioHost {
    fn is_interactive(&self) -> bool {
        true
    }

    fn defer(&self, task: DeferredTask) {
        tokio::task::spawn_local(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn tick_host_runs_one_tick_at_a_time() {
        let host = Rc::new(TickHost::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let (inner_host, inner_log) = (host.clone(), log.clone());
        let log_first = log.clone();
        host.defer(Box::new(move || {
            log_first.borrow_mut().push("first");
            inner_host.defer(Box::new(move || inner_log.borrow_mut().push("second")));
        }));

        assert_eq!(host.pending(), 1);
        assert_eq!(host.run_pending(), 1);
        assert_eq!(*log.borrow(), vec!["first"]);

        assert_eq!(host.run_pending(), 1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(host.run_pending(), 0);
    }

    #[test]
    fn tick_host_interactivity_toggles() {
        let host = TickHost::default();
        assert!(host.is_interactive());
        host.set_interactive(false);
        assert!(!host.is_interactive());
    }

    #[test]
    fn batch_host_is_not_interactive() {
        let ran = Rc::new(Cell::new(false));
        let ran_clone = ran.clone();

        BatchHost.defer(Box::new(move || ran_clone.set(true)));

        assert!(!BatchHost.is_interactive());
        assert!(!ran.get());
    }
}
