use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReelError>;

#[derive(Debug, Error)]
pub enum ReelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config file not found: {path}")]
    MissingConfig { path: PathBuf },

    #[error("the header row is bad: {message}")]
    InvalidHeader { message: String },

    #[error("invalid movie: {message}")]
    InvalidMovie { message: String },

    #[error("year {year} is outside {min}..={max}")]
    YearOutOfRange { year: i64, min: i64, max: i64 },

    #[error("movie already catalogued: {title} ({year})")]
    DuplicateMovie { title: String, year: i64 },

    #[error("movie not in the catalogue: {title} ({year})")]
    MovieNotFound { title: String, year: i64 },

    #[error("tag not in the catalogue: {tag}")]
    TagNotFound { tag: String },

    #[error("tag already exists: {tag}")]
    DuplicateTag { tag: String },

    #[error("no such field on this form: {name}")]
    UnknownField { name: String },

    #[error("field declared twice on one form: {name}")]
    DuplicateField { name: String },

    #[error("commit is not enabled for this form")]
    CommitDisabled,

    #[error("this form has no catalogue action")]
    NoCatalogueAction,

    #[error("metadata lookup failed: {message}")]
    Lookup { message: String },

    #[error("metadata lookup queue is full")]
    LookupBusy,

    #[error("metadata lookup worker has stopped")]
    LookupWorkerGone,
}

impl ReelError {
    /// Process exit code: 2 for bad input files and configuration, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidHeader { .. } | Self::MissingConfig { .. } | Self::Toml(_) => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid_movie(message: impl Into<String>) -> Self {
        Self::InvalidMovie {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    pub(crate) fn movie_not_found(key: &crate::movie::MovieKey) -> Self {
        Self::MovieNotFound {
            title: key.title.clone(),
            year: key.year,
        }
    }

    pub(crate) fn tag_not_found(tag: &str) -> Self {
        Self::TagNotFound {
            tag: tag.to_string(),
        }
    }
}
