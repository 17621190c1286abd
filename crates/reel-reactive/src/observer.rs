#![forbid(unsafe_code)]

//! Observer registry shared by [`ObservableField`](crate::ObservableField)
//! and [`Neuron`](crate::Neuron).
//!
//! An observer is anything with a single `notify(value)` operation. Closures
//! qualify through a blanket impl, so most call sites just pass `|v| ...`.
//!
//! # Invariants
//!
//! 1. Observers are notified in registration order.
//! 2. Registration never de-duplicates: the same callback registered twice is
//!    called twice per pass.
//! 3. A notification pass runs over a [`Snapshot`] taken when it starts.
//!    Registrations and removals made by an observer during the pass apply
//!    from the next pass on.

use std::fmt;
use std::rc::Rc;

/// Receiver of change notifications.
pub trait Observer<T> {
    /// Called once per notification pass with the new value.
    fn notify(&self, value: T);
}

impl<T, F> Observer<T> for F
where
    F: Fn(T),
{
    fn notify(&self, value: T) {
        self(value)
    }
}

/// Handle returned by registration, used to deregister later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Ordered list of observers.
pub struct ObserverList<T> {
    entries: Vec<(ObserverId, Rc<dyn Observer<T>>)>,
    next_id: u64,
}

impl<T> Default for ObserverList<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> fmt::Debug for ObserverList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<T: Clone> ObserverList<T> {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observer. It will be called after every observer already
    /// registered.
    pub fn register(&mut self, observer: impl Observer<T> + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Rc::new(observer)));
        id
    }

    /// Remove the observer registered under `id`.
    ///
    /// Returns `false` if no such observer is registered.
    pub fn deregister(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capture the current observers for a notification pass.
    ///
    /// Owners that keep the list behind a `RefCell` take the snapshot, drop
    /// the borrow, and only then notify, so observers are free to call back
    /// into the owner.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            observers: self
                .entries
                .iter()
                .map(|(_, observer)| Rc::clone(observer))
                .collect(),
        }
    }

    /// Notify every observer in registration order.
    pub fn notify(&self, value: T) {
        self.snapshot().notify(value);
    }
}

/// Observers captured at the start of a notification pass.
pub struct Snapshot<T> {
    observers: Vec<Rc<dyn Observer<T>>>,
}

impl<T: Clone> Snapshot<T> {
    /// Deliver `value` to each captured observer in order.
    pub fn notify(self, value: T) {
        for observer in &self.observers {
            observer.notify(value.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
