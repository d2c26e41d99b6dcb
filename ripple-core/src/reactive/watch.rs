//! Convenience wrappers that create a computation and run it right away.

use super::computation::Computation;
use crate::error::ComputeError;
use crate::scheduler::Scheduler;

impl Scheduler {
    /// Create a computation for `f` and run it immediately.
    ///
    /// If the first run fails the computation is stopped and the error
    /// returned.
    pub fn watch<F>(&self, f: F) -> Result<Computation, ComputeError>
    where
        F: FnMut() + 'static,
    {
        start(Computation::new(self, f))
    }

    /// Like [`watch`](Self::watch), but `f` receives its own computation so
    /// it can stop itself.
    pub fn watch_with<F>(&self, f: F) -> Result<Computation, ComputeError>
    where
        F: FnMut(&Computation) + 'static,
    {
        start(Computation::with_handle(self, f))
    }

    /// Re-run `f` on every invalidation until it returns `value`, then call
    /// `on_match` once and stop.
    pub fn watch_until<T, F, M>(
        &self,
        value: T,
        mut f: F,
        on_match: M,
    ) -> Result<Computation, ComputeError>
    where
        T: PartialEq + 'static,
        F: FnMut() -> T + 'static,
        M: FnOnce() + 'static,
    {
        let mut on_match = Some(on_match);
        self.watch_with(move |computation| {
            if f() == value {
                if let Some(on_match) = on_match.take() {
                    on_match();
                }
                computation.stop();
            }
        })
    }
}

fn start(computation: Computation) -> Result<Computation, ComputeError> {
    match computation.compute() {
        Ok(()) => Ok(computation),
        Err(err) => {
            computation.stop();
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::reactive::Signal;
    use crate::scheduler::Scheduler;

    #[test]
    fn watch_runs_immediately_and_tracks() {
        let scheduler = Scheduler::batch();
        let signal = Signal::new(1);
        let seen = Rc::new(Cell::new(0));

        let (reader, seen_clone) = (signal.clone(), seen.clone());
        let computation = scheduler.watch(move || seen_clone.set(reader.get())).unwrap();
        assert_eq!(seen.get(), 1);

        signal.set(2);
        scheduler.flush().unwrap();
        assert_eq!(seen.get(), 2);
        assert_eq!(computation.run_count(), 2);
    }

    #[test]
    fn watch_with_can_cancel_from_inside() {
        let scheduler = Scheduler::batch();
        let signal = Signal::new(0);

        let reader = signal.clone();
        let computation = scheduler
            .watch_with(move |me| {
                if reader.get() > 1 {
                    me.stop();
                }
            })
            .unwrap();

        signal.set(2);
        scheduler.flush().unwrap();
        assert!(computation.is_stopped());

        signal.set(3);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(computation.run_count(), 2);
    }

    #[test]
    fn watch_stops_computation_when_first_run_fails() {
        let scheduler = Scheduler::batch();
        let err = scheduler.watch(|| panic!("bad start")).unwrap_err();
        assert!(err.to_string().contains("bad start"));
    }

    #[test]
    fn watch_until_matching_on_first_run() {
        let scheduler = Scheduler::batch();
        let matched = Rc::new(Cell::new(0));
        let matched_clone = matched.clone();

        let computation = scheduler
            .watch_until("ready", || "ready", move || matched_clone.set(matched_clone.get() + 1))
            .unwrap();

        assert_eq!(matched.get(), 1);
        assert!(computation.is_stopped());
        assert_eq!(scheduler.pending(), 0);
    }
}
