#![forbid(unsafe_code)]

//! A named value that knows whether it has been edited.
//!
//! # Design
//!
//! [`ObservableField<T>`] keeps the value it was opened with (`original`)
//! next to the value being edited (`current`). Every [`set`] recomputes
//! `dirty = current != original` and broadcasts the result to subscribers,
//! whether or not it changed. Downstream neurons rely on this: typing a value
//! and then typing the original back must deliver `false`.
//!
//! Handles are cheap to clone and share one interior, in the same way as the
//! other reactive handles in this crate.
//!
//! [`set`]: ObservableField::set

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::observer::{Observer, ObserverId, ObserverList};

struct FieldInner<T> {
    name: String,
    /// Frozen at construction.
    original: T,
    current: T,
    dirty: bool,
    observers: ObserverList<bool>,
}

/// A form field tracking its edit state relative to its original value.
///
/// Cloning an `ObservableField` creates a new handle to the **same** field.
pub struct ObservableField<T> {
    inner: Rc<RefCell<FieldInner<T>>>,
}

impl<T> Clone for ObservableField<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableField")
            .field("name", &inner.name)
            .field("original", &inner.original)
            .field("current", &inner.current)
            .field("dirty", &inner.dirty)
            .field("subscribers", &inner.observers.len())
            .finish()
    }
}

impl<T: PartialEq + Clone + 'static> ObservableField<T> {
    /// Open a field with its baseline value. The field starts clean.
    pub fn new(name: impl Into<String>, original: T) -> Self {
        let current = original.clone();
        Self {
            inner: Rc::new(RefCell::new(FieldInner {
                name: name.into(),
                original,
                current,
                dirty: false,
                observers: ObserverList::new(),
            })),
        }
    }

    /// The field's key within its form.
    #[must_use]
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// A clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().current.clone()
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls [`set`](Self::set) on the same field.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().current)
    }

    /// A clone of the baseline value.
    #[must_use]
    pub fn original(&self) -> T {
        self.inner.borrow().original.clone()
    }

    /// Replace the current value and broadcast the recomputed dirty flag.
    ///
    /// Subscribers are called on every `set`, including when the new value
    /// equals the old one.
    pub fn set(&self, value: T) {
        let (dirty, snapshot) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            inner.current = value;
            inner.dirty = inner.current != inner.original;
            tracing::trace!(
                message = "field.set",
                field = %inner.name,
                dirty = inner.dirty,
                subscribers = inner.observers.len()
            );
            (inner.dirty, inner.observers.snapshot())
        };
        snapshot.notify(dirty);
    }

    /// Put the original value back. Subscribers see `false`.
    pub fn reset(&self) {
        let original = self.original();
        self.set(original);
    }

    /// Whether the current value differs from the original.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty
    }

    /// Subscribe to dirty-flag broadcasts.
    pub fn subscribe(&self, observer: impl Observer<bool> + 'static) -> ObserverId {
        self.inner.borrow_mut().observers.register(observer)
    }

    /// Remove a subscription. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        self.inner.borrow_mut().observers.deregister(id)
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn collect(field: &ObservableField<String>) -> Rc<RefCell<Vec<bool>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        field.subscribe(move |dirty: bool| sink.borrow_mut().push(dirty));
        seen
    }

    #[test]
    fn new_field_is_clean() {
        let field = ObservableField::new("title", "Hamlet".to_string());
        assert!(!field.is_dirty());
        assert_eq!(field.get(), "Hamlet");
        assert_eq!(field.original(), "Hamlet");
        assert_eq!(field.name(), "title");
    }

    #[test]
    fn edit_then_retype_original() {
        let field = ObservableField::new("title", "Hamlet".to_string());

        field.set("Solaris".to_string());
        assert!(field.is_dirty());

        field.set("Hamlet".to_string());
        assert!(!field.is_dirty());
    }

    #[test]
    fn every_set_notifies_including_falling_edge() {
        let field = ObservableField::new("title", "Hamlet".to_string());
        let seen = collect(&field);

        field.set("Solaris".to_string());
        field.set("Solaris 1972".to_string());
        field.set("Hamlet".to_string());
        field.set("Hamlet".to_string());

        assert_eq!(*seen.borrow(), vec![true, true, false, false]);
    }

    #[test]
    fn original_is_frozen() {
        let field = ObservableField::new("year", 1972);
        field.set(2002);
        assert_eq!(field.original(), 1972);
        assert_eq!(field.get(), 2002);
    }

    #[test]
    fn reset_restores_original_and_notifies() {
        let field = ObservableField::new("notes", String::new());
        let seen = collect(&field);

        field.set("remake".to_string());
        field.reset();

        assert_eq!(field.get(), "");
        assert!(!field.is_dirty());
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let field = ObservableField::new("title", String::new());
        let count = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&count);
        let id = field.subscribe(move |_: bool| *sink.borrow_mut() += 1);

        field.set("a".to_string());
        assert!(field.unsubscribe(id));
        field.set("b".to_string());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(field.subscriber_count(), 0);
        assert!(!field.unsubscribe(id));
    }

    #[test]
    fn clone_shares_state() {
        let a = ObservableField::new("title", String::new());
        let b = a.clone();
        b.set("Stalker".to_string());
        assert!(a.is_dirty());
        assert_eq!(a.with(|v| v.len()), 7);
    }

    #[test]
    fn subscriber_may_read_field_during_notification() {
        let field = ObservableField::new("title", String::new());
        let observed = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&observed);
        let reader = field.clone();
        field.subscribe(move |_: bool| *sink.borrow_mut() = reader.get());

        field.set("Mirror".to_string());
        assert_eq!(*observed.borrow(), "Mirror");
    }

    #[test]
    fn debug_format() {
        let field = ObservableField::new("title", "Hamlet".to_string());
        let dbg = format!("{field:?}");
        assert!(dbg.contains("ObservableField"));
        assert!(dbg.contains("Hamlet"));
    }
}
