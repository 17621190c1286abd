#![forbid(unsafe_code)]

//! Wiring between fields, neurons and actions.
//!
//! A form links each of its fields into a commit neuron, then links the
//! neuron to whatever enables the Commit button:
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use reel_reactive::{ObservableField, link_field_to_neuron, or_neuron_for_action};
//!
//! let enabled = Rc::new(Cell::new(false));
//! let button = Rc::clone(&enabled);
//! let neuron = or_neuron_for_action(move |state: bool| button.set(state));
//!
//! let tag = ObservableField::new("tag", String::new());
//! link_field_to_neuron(&tag, &neuron);
//!
//! tag.set("noir".to_string());
//! assert!(enabled.get());
//! tag.set(String::new());
//! assert!(!enabled.get());
//! ```

use crate::field::ObservableField;
use crate::neuron::{Combine, Neuron};
use crate::observer::{Observer, ObserverId};

/// Feed a field's dirty flag into `neuron` under the field's name.
///
/// The input slot is registered with the field's current dirty state, so a
/// field that was edited before linking is accounted for immediately. If the
/// neuron already has an input with this name it is left untouched.
///
/// Returns the field subscription, which can be passed to
/// [`ObservableField::unsubscribe`] to cut the link.
pub fn link_field_to_neuron<T>(field: &ObservableField<T>, neuron: &Neuron) -> ObserverId
where
    T: PartialEq + Clone + 'static,
{
    let name = field.name();
    neuron.register_event_with(name.clone(), field.is_dirty());
    let target = neuron.clone();
    field.subscribe(move |dirty: bool| {
        // The slot was registered above and inputs are never removed.
        if let Err(err) = target.update(&name, dirty) {
            tracing::error!(message = "link.field_to_neuron", error = %err);
        }
    })
}

/// Register `action` to receive the neuron's aggregate on every change.
pub fn link_neuron_to_action(neuron: &Neuron, action: impl Observer<bool> + 'static) -> ObserverId {
    neuron.register(action)
}

/// Create an OR neuron already linked to `action`.
pub fn or_neuron_for_action(action: impl Observer<bool> + 'static) -> Neuron {
    neuron_for_action(Combine::Or, action)
}

/// Create an AND neuron already linked to `action`.
pub fn and_neuron_for_action(action: impl Observer<bool> + 'static) -> Neuron {
    neuron_for_action(Combine::And, action)
}

fn neuron_for_action(rule: Combine, action: impl Observer<bool> + 'static) -> Neuron {
    let neuron = Neuron::new(rule);
    link_neuron_to_action(&neuron, action);
    neuron
}
