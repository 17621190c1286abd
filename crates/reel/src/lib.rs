#![forbid(unsafe_code)]

//! Movie catalogue entry forms, CSV import, and metadata lookup.
//!
//! - [`form`]: headless entry forms whose Commit state is driven by a
//!   [`reel_reactive::Neuron`].
//! - [`movie`] and [`store`]: the movie record, its validation, and the
//!   catalogue boundary.
//! - [`import`]: bulk CSV import with a reject file.
//! - [`lookup`]: background search of an external metadata source.
//! - [`config`]: the [`AppContext`] built once at startup.

pub mod cli;
pub mod config;
pub mod error;
pub mod form;
pub mod import;
pub mod lookup;
pub mod movie;
pub mod store;

pub use cli::{run, run_from_env};
pub use config::AppContext;
pub use error::{ReelError, Result};
pub use form::{EntryForm, FieldSpec, FormAction, FormValues};
pub use import::{ImportReport, import_movies};
pub use lookup::{LookupWorker, MetadataSource};
pub use movie::{Movie, MovieInteger, MovieKey};
pub use store::{MemoryStore, MovieStore};
