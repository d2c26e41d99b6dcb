//! Signal Implementation
//!
//! A Signal is the simplest reactive source: a value plus a [`Dependency`].
//!
//! # How Signals Work
//!
//! 1. Reading a signal inside a computation registers that computation as a
//!    dependent.
//!
//! 2. Writing a signal invalidates every dependent, which queues them for
//!    the next flush.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::dependency::Dependency;

/// A reactive value holder.
///
/// # Example
///
/// ```rust
/// use ripple_core::Signal;
///
/// let count = Signal::new(0);
/// count.update(|v| v + 1);
/// assert_eq!(count.get(), 1);
/// ```
pub struct Signal<T> {
    value: Rc<RefCell<T>>,
    dependency: Dependency,
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            dependency: Dependency::new(),
        }
    }

    /// Borrow the value, registering the current computation as a dependent.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.dependency.depend();
        f(&*self.value.borrow())
    }

    /// Borrow the value without registering a dependency.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.value.borrow())
    }

    /// Replace the value and invalidate every dependent.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.dependency.changed();
    }

    /// Compute a new value from the current one and store it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&*self.value.borrow());
        self.set(next);
    }

    /// The dependency backing this signal, for sources built on top of it.
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn subscriber_count(&self) -> usize {
        self.dependency.dependent_count()
    }
}

impl<T: Clone> Signal<T> {
    /// Get the current value, registering the current computation as a
    /// dependent.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            dependency: self.dependency.clone(),
        }
    }
}

impl<T: Debug> Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
