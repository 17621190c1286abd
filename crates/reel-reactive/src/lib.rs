#![forbid(unsafe_code)]

//! Change propagation for reel entry forms.
//!
//! This crate provides the primitives that decide whether a form may be
//! committed:
//!
//! - [`ObservableField`]: a named value that remembers its original and
//!   broadcasts a dirty flag on every edit.
//! - [`Neuron`]: a boolean node combining named inputs with AND or OR and
//!   notifying observers when the aggregate flips.
//! - [`link_field_to_neuron`] / [`link_neuron_to_action`]: the wiring between
//!   the two and the consumer (typically a Commit button).
//! - [`Observer`]: the one-operation callback contract used throughout.
//!
//! # Architecture
//!
//! Everything here is single-threaded and synchronous. Handles share state
//! through `Rc<RefCell<..>>` and are `!Send`; they belong to the thread that
//! owns the form. Notifications run after interior borrows are released, so
//! observers may query or mutate the graph.
//!
//! # Invariants
//!
//! 1. `field.is_dirty() == (current != original)` after every `set`.
//! 2. `neuron.state()` equals its rule applied to its registered inputs.
//! 3. Neuron observers fire once per aggregate change, in registration order.
//! 4. Updating an unregistered neuron input is an error, never an implicit
//!    registration.

pub mod error;
pub mod field;
pub mod link;
pub mod neuron;
pub mod observer;

pub use error::{Result, WiringError};
pub use field::ObservableField;
pub use link::{
    and_neuron_for_action, link_field_to_neuron, link_neuron_to_action, or_neuron_for_action,
};
pub use neuron::{Combine, Neuron};
pub use observer::{Observer, ObserverId, ObserverList, Snapshot};
