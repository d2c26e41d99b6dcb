//! Reactive Context
//!
//! The reactive context records which computation is currently running.
//! Sources read it to find out "who is reading me right now" without the
//! computation being passed around explicitly.
//!
//! # Implementation
//!
//! Each thread has a single slot holding the current computation. Entering a
//! context swaps the new value into the slot and keeps the old one in a guard;
//! dropping the guard puts the old value back. Because every guard restores
//! the value it displaced, nested contexts unwind in LIFO order through
//! ordinary call/return, and the slot is restored even when the code inside
//! panics.

use std::cell::RefCell;

use super::computation::Computation;

thread_local! {
    static CURRENT: RefCell<Option<Computation>> = const { RefCell::new(None) };
}

/// Guard that restores the previous current computation when dropped.
pub struct ReactiveContext {
    previous: Option<Computation>,
}

impl ReactiveContext {
    /// Install `computation` as current until the returned guard is dropped.
    ///
    /// Passing `None` enters an untracked section.
    pub fn enter(computation: Option<Computation>) -> Self {
        let previous = CURRENT.with(|slot| slot.replace(computation));
        Self { previous }
    }

    /// The computation currently running on this thread, if any.
    pub fn current() -> Option<Computation> {
        CURRENT.with(|slot| slot.borrow().clone())
    }

    /// Check if reads would currently be tracked.
    pub fn is_tracking() -> bool {
        CURRENT.with(|slot| slot.borrow().is_some())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The slot may already be gone during thread teardown.
        let _ = CURRENT.try_with(|slot| {
            slot.replace(previous);
        });
    }
}

/// Run `f` with `computation` installed as current, then restore whatever
/// was current before.
pub fn run_in_scope<R>(computation: Option<Computation>, f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter(computation);
    f()
}

/// Run `f` with no current computation, so nothing it reads registers a
/// dependency.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    run_in_scope(None, f)
}

/// The computation currently running on this thread, if any.
pub fn current() -> Option<Computation> {
    ReactiveContext::current()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;

    #[test]
    fn context_tracks_computation() {
        let scheduler = Scheduler::batch();
        let computation = Computation::new(&scheduler, || {});

        assert!(!ReactiveContext::is_tracking());
        assert!(current().is_none());

        {
            let _ctx = ReactiveContext::enter(Some(computation.clone()));

            assert!(ReactiveContext::is_tracking());
            assert_eq!(current().map(|c| c.id()), Some(computation.id()));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_tracking());
        assert!(current().is_none());
    }

    #[test]
    fn nested_scopes_restore_in_order() {
        let scheduler = Scheduler::batch();
        let a = Computation::new(&scheduler, || {});
        let b = Computation::new(&scheduler, || {});

        let inner_is_b = run_in_scope(Some(a.clone()), || {
            let inner = run_in_scope(Some(b.clone()), || current().map(|c| c.id()));
            assert_eq!(current().map(|c| c.id()), Some(a.id()));
            inner == Some(b.id())
        });

        assert!(inner_is_b);
        assert!(current().is_none());
    }

    #[test]
    fn untracked_clears_and_restores() {
        let scheduler = Scheduler::batch();
        let a = Computation::new(&scheduler, || {});

        run_in_scope(Some(a.clone()), || {
            untracked(|| assert!(current().is_none()));
            assert_eq!(current().map(|c| c.id()), Some(a.id()));
        });
    }

    #[test]
    fn scope_is_restored_after_panic() {
        let scheduler = Scheduler::batch();
        let a = Computation::new(&scheduler, || {});

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            run_in_scope(Some(a.clone()), || panic!("inside scope"));
        }));

        assert!(result.is_err());
        assert!(current().is_none());
    }
}
