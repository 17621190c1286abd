use thiserror::Error;

pub type Result<T> = std::result::Result<T, WiringError>;

/// Contract violations between fields, neurons, and their callers.
///
/// These indicate a wiring bug in the enclosing form, not a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiringError {
    #[error("neuron input not registered: {name}")]
    UnknownInput { name: String },
}

impl WiringError {
    #[must_use]
    pub fn unknown_input(name: impl Into<String>) -> Self {
        Self::UnknownInput { name: name.into() }
    }
}
