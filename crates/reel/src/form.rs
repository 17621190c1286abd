//! Headless entry forms with commit gating.
//!
//! An [`EntryForm`] owns one [`ObservableField`] per declared field and a
//! commit [`Neuron`]. Fields marked as gating are linked into the neuron;
//! the neuron's state is what a GUI would mirror onto its Commit button.
//!
//! The stock forms follow the catalogue's workflows:
//!
//! | form | rule | gating fields |
//! |---|---|---|
//! | add tag | OR | `tag` |
//! | edit tag | OR | `tag` |
//! | add movie | AND | `title`, `year` |
//! | edit movie | OR | every field |
//!
//! The stock forms also know what their commit means for the catalogue;
//! [`EntryForm::save`] carries it out against a [`MovieStore`].

use reel_reactive::{Combine, Neuron, ObservableField, Observer, ObserverId, link_field_to_neuron};

use crate::error::{ReelError, Result};
use crate::movie::{self, Movie, MovieKey};
use crate::store::MovieStore;

pub const TAG: &str = "tag";

/// Declaration of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    /// Value shown when the form opens.
    pub original: String,
    /// Whether edits to this field feed the commit neuron.
    pub gates_commit: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            original: String::new(),
            gates_commit: true,
        }
    }

    #[must_use]
    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = original.into();
        self
    }

    #[must_use]
    pub fn gating(mut self, gates_commit: bool) -> Self {
        self.gates_commit = gates_commit;
        self
    }
}

/// Field values handed to the caller on commit, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: Vec<(String, String)>,
}

impl FormValues {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Interpret the values as a movie record.
    pub fn to_movie(&self) -> Result<Movie> {
        Movie::from_fields(self.iter())
    }
}

/// What saving a committed form does to the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Custom forms: values are only handed back.
    None,
    AddTag,
    EditTag { old: String },
    AddMovie,
    EditMovie { key: MovieKey },
}

struct FormField {
    name: String,
    label: String,
    field: ObservableField<String>,
}

/// A form: fields, the commit neuron, and the commit hand-off.
pub struct EntryForm {
    fields: Vec<FormField>,
    neuron: Neuron,
    action: FormAction,
}

impl std::fmt::Debug for EntryForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryForm")
            .field("fields", &self.fields.iter().map(|ff| &ff.name).collect::<Vec<_>>())
            .field("neuron", &self.neuron)
            .field("action", &self.action)
            .finish()
    }
}

impl EntryForm {
    /// Open a form.
    ///
    /// # Errors
    ///
    /// [`ReelError::DuplicateField`] if two specs share a name.
    pub fn new(rule: Combine, specs: impl IntoIterator<Item = FieldSpec>) -> Result<Self> {
        let specs: Vec<FieldSpec> = specs.into_iter().collect();
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|earlier| earlier.name == spec.name) {
                return Err(ReelError::DuplicateField {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(Self::assemble(rule, specs, FormAction::None))
    }

    fn assemble(rule: Combine, specs: Vec<FieldSpec>, action: FormAction) -> Self {
        let neuron = Neuron::new(rule);
        let fields = specs
            .into_iter()
            .map(|spec| {
                let field = ObservableField::new(spec.name.clone(), spec.original);
                if spec.gates_commit {
                    link_field_to_neuron(&field, &neuron);
                }
                FormField {
                    name: spec.name,
                    label: spec.label,
                    field,
                }
            })
            .collect();
        Self {
            fields,
            neuron,
            action,
        }
    }

    pub fn add_tag() -> Self {
        Self::assemble(
            Combine::Or,
            vec![FieldSpec::new(TAG, "Tag")],
            FormAction::AddTag,
        )
    }

    pub fn edit_tag(old: &str) -> Self {
        Self::assemble(
            Combine::Or,
            vec![FieldSpec::new(TAG, "Tag").with_original(old)],
            FormAction::EditTag {
                old: old.to_string(),
            },
        )
    }

    /// Title and year must both be entered before the movie can be added.
    pub fn add_movie() -> Self {
        let specs = movie_specs()
            .into_iter()
            .map(|spec| {
                let required = spec.name == movie::TITLE || spec.name == movie::YEAR;
                spec.gating(required)
            })
            .collect();
        Self::assemble(Combine::And, specs, FormAction::AddMovie)
    }

    /// Any change to any field enables commit.
    pub fn edit_movie(existing: &Movie) -> Self {
        let originals = existing.to_fields();
        let specs = movie_specs()
            .into_iter()
            .map(|spec| {
                let original = originals
                    .iter()
                    .find(|(name, _)| *name == spec.name)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default();
                spec.with_original(original)
            })
            .collect();
        Self::assemble(
            Combine::Or,
            specs,
            FormAction::EditMovie {
                key: existing.key.clone(),
            },
        )
    }

    fn lookup(&self, name: &str) -> Result<&FormField> {
        self.fields
            .iter()
            .find(|ff| ff.name == name)
            .ok_or_else(|| ReelError::UnknownField {
                name: name.to_string(),
            })
    }

    /// Record a user edit.
    pub fn set(&self, name: &str, value: impl Into<String>) -> Result<()> {
        self.lookup(name)?.field.set(value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<String> {
        Ok(self.lookup(name)?.field.get())
    }

    pub fn label(&self, name: &str) -> Result<&str> {
        Ok(self.lookup(name)?.label.as_str())
    }

    pub fn is_dirty(&self, name: &str) -> Result<bool> {
        Ok(self.lookup(name)?.field.is_dirty())
    }

    /// Put every field back to its original value.
    pub fn revert(&self) {
        for ff in &self.fields {
            ff.field.reset();
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|ff| ff.name.as_str())
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ObservableField<String>> {
        self.lookup(name).ok().map(|ff| &ff.field)
    }

    #[must_use]
    pub fn commit_enabled(&self) -> bool {
        self.neuron.state()
    }

    /// Observe the commit neuron, e.g. to enable or disable a button.
    pub fn on_commit_enabled(&self, action: impl Observer<bool> + 'static) -> ObserverId {
        self.neuron.register(action)
    }

    #[must_use]
    pub fn neuron(&self) -> &Neuron {
        &self.neuron
    }

    /// Hand back the current values of every field.
    ///
    /// # Errors
    ///
    /// [`ReelError::CommitDisabled`] while the commit neuron is off.
    pub fn commit(&self) -> Result<FormValues> {
        if !self.commit_enabled() {
            return Err(ReelError::CommitDisabled);
        }
        let values = FormValues {
            values: self
                .fields
                .iter()
                .map(|ff| (ff.name.clone(), ff.field.get()))
                .collect(),
        };
        tracing::debug!(message = "form.commit", fields = values.len());
        Ok(values)
    }

    #[must_use]
    pub fn action(&self) -> &FormAction {
        &self.action
    }

    /// Commit the form and apply it to `store`.
    ///
    /// # Errors
    ///
    /// Whatever [`commit`](Self::commit), [`FormValues::to_movie`] or the
    /// store reports, or [`ReelError::NoCatalogueAction`] for a custom form.
    pub fn save(&self, store: &mut impl MovieStore) -> Result<FormValues> {
        let values = self.commit()?;
        match &self.action {
            FormAction::None => return Err(ReelError::NoCatalogueAction),
            FormAction::AddTag => store.add_tag(values.get(TAG).unwrap_or_default())?,
            FormAction::EditTag { old } => store.edit_tag(old, values.get(TAG).unwrap_or_default())?,
            FormAction::AddMovie => store.add_movie(values.to_movie()?)?,
            FormAction::EditMovie { key } => store.edit_movie(key, values.to_movie()?)?,
        }
        Ok(values)
    }
}

fn movie_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(movie::TITLE, "Title"),
        FieldSpec::new(movie::YEAR, "Year"),
        FieldSpec::new(movie::DIRECTOR, "Director"),
        FieldSpec::new(movie::DURATION, "Length (minutes)"),
        FieldSpec::new(movie::NOTES, "Notes"),
        FieldSpec::new(movie::MOVIE_TAGS, "Tags"),
    ]
}
