//! Dependency tracking for reactive sources.
//!
//! A [`Dependency`] is the piece a source embeds to take part in tracking.
//! The source calls [`depend`](Dependency::depend) whenever its value is
//! read and [`changed`](Dependency::changed) whenever its value changes.
//!
//! Dependents are held weakly, keyed by computation ID so each computation
//! registers at most once per run. A registration removes itself when the
//! computation is invalidated; the next run registers again if it still
//! reads the source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::computation::{Computation, ComputationId, WeakComputation};

type Dependents = RefCell<IndexMap<ComputationId, WeakComputation>>;

/// The set of computations that read a source during their last run.
#[derive(Clone, Default)]
pub struct Dependency {
    dependents: Rc<Dependents>,
}

impl Dependency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the current computation, if any, as a dependent.
    ///
    /// Returns `true` if a new registration was made.
    pub fn depend(&self) -> bool {
        match Computation::current() {
            Some(computation) => self.depend_on(&computation),
            None => false,
        }
    }

    /// Register `computation` as a dependent.
    pub fn depend_on(&self, computation: &Computation) -> bool {
        let id = computation.id();
        if self.dependents.borrow().contains_key(&id) {
            return false;
        }
        self.dependents
            .borrow_mut()
            .insert(id, computation.downgrade());

        let dependents = Rc::downgrade(&self.dependents);
        computation.on_invalidate(move || {
            if let Some(dependents) = dependents.upgrade() {
                dependents.borrow_mut().shift_remove(&id);
            }
        });
        true
    }

    /// Invalidate every registered computation, in registration order.
    pub fn changed(&self) {
        let dependents: Vec<WeakComputation> =
            self.dependents.borrow().values().cloned().collect();
        tracing::trace!(dependents = dependents.len(), "dependency changed");

        for dependent in dependents {
            if let Some(computation) = dependent.upgrade() {
                computation.invalidate();
            }
        }
    }

    /// Whether any live computation depends on this source.
    pub fn has_dependents(&self) -> bool {
        self.dependents
            .borrow()
            .values()
            .any(|dependent| dependent.upgrade().is_some())
    }

    pub fn dependent_count(&self) -> usize {
        self.dependents.borrow().len()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("dependents", &self.dependents.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
