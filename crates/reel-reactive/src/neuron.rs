#![forbid(unsafe_code)]

//! Boolean aggregation nodes.
//!
//! # Design
//!
//! A [`Neuron`] holds named boolean inputs and combines them with a
//! [`Combine`] rule. The aggregate is recomputed synchronously on every
//! input change and observers hear about it only when it flips.
//!
//! Like the field handles, a `Neuron` is a cheap, cloneable handle over
//! `Rc<RefCell<..>>` state.
//!
//! # Invariants
//!
//! 1. `state()` always equals the rule applied to the registered inputs.
//!    No inputs means `false` under either rule.
//! 2. Observers are called once per aggregate change, in registration order,
//!    and never for an update that leaves the aggregate unchanged.
//! 3. Inputs exist only through [`register_event`](Neuron::register_event);
//!    re-registering never overwrites a slot.
//!
//! # Failure Modes
//!
//! - **Unregistered input**: [`update`](Neuron::update) returns
//!   [`WiringError::UnknownInput`] without touching state.
//! - **Re-entrant update**: an update issued while this neuron is delivering
//!   notifications is queued and applied once the current pass finishes,
//!   in the order issued. The name is still validated at the call site.
//!   A slot registered during a pass exists at once, but the aggregate it
//!   may change is recomputed in its turn in the same queue.
//! - **Observer panics**: the pass is abandoned, queued updates are dropped
//!   and the neuron accepts updates again. `state()` keeps the new aggregate.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::error::{Result, WiringError};
use crate::observer::{Observer, ObserverId, ObserverList, Snapshot};

/// How a neuron folds its inputs into one boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combine {
    /// True iff every registered input is true.
    And,
    /// True iff at least one registered input is true.
    Or,
}

impl Combine {
    /// Apply the rule. An empty input set yields `false` for both rules.
    pub fn combine(self, mut inputs: impl Iterator<Item = bool>) -> bool {
        match self {
            Self::And => match inputs.next() {
                Some(first) => first && inputs.all(|v| v),
                None => false,
            },
            Self::Or => inputs.any(|v| v),
        }
    }
}

struct NeuronInner {
    rule: Combine,
    inputs: BTreeMap<String, bool>,
    observers: ObserverList<bool>,
    /// Last computed aggregate.
    state: bool,
    /// True while an update pass (including its notifications) is running.
    in_pass: bool,
    pending: VecDeque<Step>,
}

/// One unit of work in an update pass.
enum Step {
    Update { name: String, value: bool },
    /// A slot was added; only the aggregate needs recomputing.
    Recompute,
}

/// A boolean node aggregating named inputs and notifying observers on change.
///
/// Cloning a `Neuron` creates a new handle to the **same** node.
pub struct Neuron {
    inner: Rc<RefCell<NeuronInner>>,
}

impl Clone for Neuron {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Neuron")
            .field("rule", &inner.rule)
            .field("inputs", &inner.inputs)
            .field("state", &inner.state)
            .field("observers", &inner.observers.len())
            .finish()
    }
}

/// Clears the pass flag even if an observer unwinds.
struct PassGuard<'a> {
    inner: &'a RefCell<NeuronInner>,
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.in_pass = false;
        inner.pending.clear();
    }
}

impl Neuron {
    /// Create a neuron with no inputs and no observers.
    #[must_use]
    pub fn new(rule: Combine) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NeuronInner {
                rule,
                inputs: BTreeMap::new(),
                observers: ObserverList::new(),
                state: false,
                in_pass: false,
                pending: VecDeque::new(),
            })),
        }
    }

    #[must_use]
    pub fn and() -> Self {
        Self::new(Combine::And)
    }

    #[must_use]
    pub fn or() -> Self {
        Self::new(Combine::Or)
    }

    /// Add an input slot defaulting to `false`.
    ///
    /// Returns `false` and leaves the existing slot alone if `name` is
    /// already registered.
    pub fn register_event(&self, name: impl Into<String>) -> bool {
        self.register_event_with(name, false)
    }

    /// Add an input slot with an initial value.
    ///
    /// If the new slot changes the aggregate (e.g. a `false` slot joining a
    /// true AND), observers are notified.
    /// During a notification pass the slot is added immediately and the
    /// recompute is queued behind any pending updates.
    pub fn register_event_with(&self, name: impl Into<String>, initial: bool) -> bool {
        let name = name.into();
        {
            let mut inner = self.inner.borrow_mut();
            if inner.inputs.contains_key(&name) {
                tracing::trace!(message = "neuron.register_event.duplicate", input = %name);
                return false;
            }
            tracing::trace!(message = "neuron.register_event", input = %name, initial);
            inner.inputs.insert(name, initial);
            if inner.in_pass {
                inner.pending.push_back(Step::Recompute);
                return true;
            }
            inner.in_pass = true;
        }
        self.run_pass(Step::Recompute);
        true
    }

    /// Set input `name` to `value` and notify observers if the aggregate flips.
    ///
    /// # Errors
    ///
    /// [`WiringError::UnknownInput`] if `name` was never registered.
    pub fn update(&self, name: &str, value: bool) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if !inner.inputs.contains_key(name) {
                tracing::warn!(message = "neuron.update.unknown_input", input = %name);
                return Err(WiringError::unknown_input(name));
            }
            if inner.in_pass {
                tracing::trace!(message = "neuron.update.queued", input = %name, value);
                inner.pending.push_back(Step::Update {
                    name: name.to_owned(),
                    value,
                });
                return Ok(());
            }
            inner.in_pass = true;
        }

        self.run_pass(Step::Update {
            name: name.to_owned(),
            value,
        });
        Ok(())
    }

    /// The functor form of [`update`](Self::update): a callable taking
    /// `(name, value)` bound to this neuron.
    pub fn notifier(&self) -> impl Fn(&str, bool) -> Result<()> + 'static {
        let neuron = self.clone();
        move |name, value| neuron.update(name, value)
    }

    /// Append an observer of aggregate changes.
    pub fn register(&self, observer: impl Observer<bool> + 'static) -> ObserverId {
        self.inner.borrow_mut().observers.register(observer)
    }

    /// Remove an observer. Returns `false` if `id` is not registered.
    pub fn deregister(&self, id: ObserverId) -> bool {
        self.inner.borrow_mut().observers.deregister(id)
    }

    /// The current aggregate.
    #[must_use]
    pub fn state(&self) -> bool {
        self.inner.borrow().state
    }

    #[must_use]
    pub fn rule(&self) -> Combine {
        self.inner.borrow().rule
    }

    /// Current value of one input, or `None` if not registered.
    #[must_use]
    pub fn input(&self, name: &str) -> Option<bool> {
        self.inner.borrow().inputs.get(name).copied()
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inner.borrow().inputs.len()
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Run `first` and then everything queued behind it. The caller has
    /// already set `in_pass`.
    fn run_pass(&self, first: Step) {
        let _guard = PassGuard { inner: &self.inner };
        self.apply(first);
        loop {
            let next = self.inner.borrow_mut().pending.pop_front();
            match next {
                Some(step) => self.apply(step),
                None => break,
            }
        }
    }

    fn apply(&self, step: Step) {
        let change = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            if let Step::Update { name, value } = step {
                if let Some(slot) = inner.inputs.get_mut(&name) {
                    *slot = value;
                }
                tracing::trace!(message = "neuron.update", input = %name, value);
            }
            Self::recompute(inner)
        };
        if let Some((aggregate, snapshot)) = change {
            snapshot.notify(aggregate);
        }
    }

    /// Recompute the aggregate; on a flip, return it with the observers to
    /// notify once the borrow is released.
    fn recompute(inner: &mut NeuronInner) -> Option<(bool, Snapshot<bool>)> {
        let aggregate = inner.rule.combine(inner.inputs.values().copied());
        if aggregate == inner.state {
            return None;
        }
        inner.state = aggregate;
        tracing::debug!(
            message = "neuron.aggregate",
            rule = ?inner.rule,
            state = aggregate,
            observers = inner.observers.len()
        );
        Some((aggregate, inner.observers.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn recorded(neuron: &Neuron) -> Rc<RefCell<Vec<bool>>> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        neuron.register(move |state: bool| sink.borrow_mut().push(state));
        calls
    }

    #[test]
    fn combine_rules() {
        assert!(!Combine::And.combine(std::iter::empty()));
        assert!(!Combine::Or.combine(std::iter::empty()));
        assert!(Combine::And.combine([true, true].into_iter()));
        assert!(!Combine::And.combine([true, false].into_iter()));
        assert!(Combine::Or.combine([false, true].into_iter()));
        assert!(!Combine::Or.combine([false, false].into_iter()));
    }

    #[test]
    fn event_registered_defaults_false() {
        let neuron = Neuron::and();
        assert!(neuron.register_event("event"));
        assert_eq!(neuron.input("event"), Some(false));
        assert_eq!(neuron.input_count(), 1);
        assert!(!neuron.state());
    }

    #[test]
    fn duplicate_registration_keeps_state() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        neuron.update("a", true).unwrap();

        assert!(!neuron.register_event("a"));
        assert_eq!(neuron.input("a"), Some(true));
        assert!(neuron.state());
    }

    #[test]
    fn or_neuron_invocation() {
        let neuron = Neuron::or();
        neuron.register_event_with("event1", false);
        neuron.register_event_with("event2", false);
        let calls = recorded(&neuron);

        let call = neuron.notifier();
        call("event2", true).unwrap();
        assert_eq!(*calls.borrow(), vec![true]);
    }

    #[test]
    fn and_title_year_scenario() {
        let neuron = Neuron::and();
        neuron.register_event("title");
        neuron.register_event("year");
        let calls = recorded(&neuron);

        neuron.update("title", true).unwrap();
        assert!(!neuron.state());
        assert!(calls.borrow().is_empty());

        neuron.update("year", true).unwrap();
        assert!(neuron.state());
        assert_eq!(*calls.borrow(), vec![true]);

        neuron.update("title", false).unwrap();
        assert!(!neuron.state());
        assert_eq!(*calls.borrow(), vec![true, false]);
    }

    #[test]
    fn or_false_only_when_all_false() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        neuron.register_event("b");

        neuron.update("a", true).unwrap();
        neuron.update("b", true).unwrap();
        neuron.update("a", false).unwrap();
        assert!(neuron.state());
        neuron.update("b", false).unwrap();
        assert!(!neuron.state());
    }

    #[test]
    fn no_notification_on_noop_update() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let calls = recorded(&neuron);

        neuron.update("a", true).unwrap();
        neuron.update("a", true).unwrap();
        neuron.update("a", false).unwrap();
        neuron.update("a", false).unwrap();

        assert_eq!(*calls.borrow(), vec![true, false]);
    }

    #[test]
    fn observers_called_in_registration_order() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            neuron.register(move |state: bool| order.borrow_mut().push((tag, state)));
        }

        neuron.update("a", true).unwrap();
        assert_eq!(
            *order.borrow(),
            vec![("first", true), ("second", true), ("third", true)]
        );
    }

    #[test]
    fn unknown_input_fails_fast() {
        let neuron = Neuron::or();
        let calls = recorded(&neuron);

        let err = neuron.update("ghost", true).unwrap_err();
        assert_eq!(err, WiringError::unknown_input("ghost"));
        assert_eq!(neuron.input("ghost"), None);
        assert!(!neuron.state());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn registering_false_slot_into_true_and_notifies() {
        let neuron = Neuron::and();
        neuron.register_event("a");
        let calls = recorded(&neuron);
        neuron.update("a", true).unwrap();

        neuron.register_event("b");
        assert!(!neuron.state());
        assert_eq!(*calls.borrow(), vec![true, false]);
    }

    #[test]
    fn deregistered_observer_stops_firing() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let hits = Rc::new(Cell::new(0u32));
        let sink = Rc::clone(&hits);
        let id = neuron.register(move |_: bool| sink.set(sink.get() + 1));

        neuron.update("a", true).unwrap();
        assert!(neuron.deregister(id));
        neuron.update("a", false).unwrap();

        assert_eq!(hits.get(), 1);
        assert_eq!(neuron.observer_count(), 0);
    }

    #[test]
    fn reentrant_update_is_applied_after_pass() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        neuron.register_event("b");
        let log = Rc::new(RefCell::new(Vec::new()));

        // First observer turns `a` back off as soon as the aggregate rises.
        let feedback = neuron.clone();
        let first_log = Rc::clone(&log);
        neuron.register(move |state: bool| {
            first_log.borrow_mut().push(format!("first:{state}"));
            if state {
                feedback.update("a", false).unwrap();
            }
        });
        let second_log = Rc::clone(&log);
        neuron.register(move |state: bool| second_log.borrow_mut().push(format!("second:{state}")));

        neuron.update("a", true).unwrap();

        // The queued update runs only after both observers saw `true`.
        assert_eq!(
            *log.borrow(),
            vec!["first:true", "second:true", "first:false", "second:false"]
        );
        assert!(!neuron.state());
    }

    #[test]
    fn reentrant_unknown_input_still_errors() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let feedback = neuron.clone();
        neuron.register(move |_: bool| {
            *sink.borrow_mut() = Some(feedback.update("ghost", true));
        });

        neuron.update("a", true).unwrap();
        assert_eq!(
            *seen.borrow(),
            Some(Err(WiringError::unknown_input("ghost")))
        );
    }

    #[test]
    fn registration_during_pass_notifies_after_it() {
        let neuron = Neuron::and();
        neuron.register_event("a");
        let log = Rc::new(RefCell::new(Vec::new()));

        // Adding a `false` slot to a true AND turns it off, but only once
        // every observer has seen the `true`.
        let late = neuron.clone();
        let first_log = Rc::clone(&log);
        neuron.register(move |state: bool| {
            first_log.borrow_mut().push(format!("first:{state}"));
            if state {
                assert!(late.register_event_with("b", false));
                assert_eq!(late.input("b"), Some(false));
            }
        });
        let second_log = Rc::clone(&log);
        neuron.register(move |state: bool| second_log.borrow_mut().push(format!("second:{state}")));

        neuron.update("a", true).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["first:true", "second:true", "first:false", "second:false"]
        );
        assert!(!neuron.state());
        assert_eq!(neuron.input_count(), 2);
    }

    #[test]
    fn slot_registered_during_pass_accepts_updates() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let feedback = neuron.clone();
        neuron.register(move |state: bool| {
            if state && feedback.register_event("b") {
                feedback.update("b", true).unwrap();
                feedback.update("a", false).unwrap();
            }
        });

        neuron.update("a", true).unwrap();
        assert_eq!(neuron.input("a"), Some(false));
        assert_eq!(neuron.input("b"), Some(true));
        assert!(neuron.state());
    }

    #[test]
    fn pass_flag_cleared_after_observer_panic() {
        let neuron = Neuron::or();
        neuron.register_event("a");
        let armed = Rc::new(Cell::new(true));
        let trigger = Rc::clone(&armed);
        neuron.register(move |_: bool| {
            if trigger.get() {
                panic!("observer failure");
            }
        });

        let n = neuron.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            n.update("a", true).unwrap();
        }));
        assert!(result.is_err());
        assert!(neuron.state());

        armed.set(false);
        neuron.update("a", false).unwrap();
        assert!(!neuron.state());
    }

    #[test]
    fn debug_format() {
        let neuron = Neuron::and();
        neuron.register_event("title");
        let dbg = format!("{neuron:?}");
        assert!(dbg.contains("And"));
        assert!(dbg.contains("title"));
    }
}
