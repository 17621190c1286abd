//! Movie records and the integer sets used for years and durations.
//!
//! # Invariants
//!
//! - A [`Movie`] always has a non-empty title and a year in
//!   `MUYBRIDGE < year <= MAX_YEAR`.
//! - [`MovieKey`] (title, year) identifies a movie in a catalogue.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, Result};

pub const TITLE: &str = "title";
pub const YEAR: &str = "year";
pub const DIRECTOR: &str = "director";
pub const DURATION: &str = "minutes";
pub const NOTES: &str = "notes";
pub const MOVIE_TAGS: &str = "tags";

/// No motion picture predates Muybridge's 1878 sequence.
pub const MUYBRIDGE: i64 = 1878;
pub const MAX_YEAR: i64 = 10_000;

/// Widest range a single `low-high` element may expand to.
const MAX_RANGE_SPAN: i64 = 100_000;

/// Separator for multi-valued text fields (directors, tags).
const LIST_SEPARATOR: &str = ", ";

/// A set of integers written as `"1960"`, `"1960-1965"` or
/// `"2020-2022, 2029"`.
///
/// A single value is used when adding or editing a record; a set is used
/// as a search pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MovieInteger {
    values: BTreeSet<i64>,
}

impl MovieInteger {
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        self.values.contains(&value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.values.iter().copied()
    }

    /// The value of a singleton set.
    ///
    /// # Errors
    ///
    /// [`ReelError::InvalidMovie`] if the set holds zero or several values.
    pub fn single(&self) -> Result<i64> {
        let mut iter = self.values.iter();
        match (iter.next(), iter.next()) {
            (Some(value), None) => Ok(*value),
            _ => Err(ReelError::invalid_movie(format!(
                "not a single integer value: {self}"
            ))),
        }
    }
}

impl From<i64> for MovieInteger {
    fn from(value: i64) -> Self {
        Self {
            values: BTreeSet::from([value]),
        }
    }
}

impl FromStr for MovieInteger {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        let mut values = BTreeSet::new();
        for element in s.split(',').map(str::trim) {
            match element.split_once('-') {
                Some((low, high)) => {
                    let a = parse_int(low)?;
                    let b = parse_int(high)?;
                    let (low, high) = if a <= b { (a, b) } else { (b, a) };
                    if high - low > MAX_RANGE_SPAN {
                        return Err(ReelError::invalid_movie(format!(
                            "range is too wide: {element}"
                        )));
                    }
                    values.extend(low..=high);
                }
                None => {
                    values.insert(parse_int(element)?);
                }
            }
        }
        Ok(Self { values })
    }
}

fn parse_int(text: &str) -> Result<i64> {
    let text = text.trim();
    text.parse::<i64>().map_err(|_| {
        ReelError::invalid_movie(format!(
            "expected an integer or a range '<low>-<high>', got '{text}'"
        ))
    })
}

impl fmt::Display for MovieInteger {
    /// Renders runs of consecutive values as ranges: `2020-2022, 2029`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(i64, i64)> = Vec::new();
        for value in self.iter() {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == value => *end = value,
                _ => runs.push((value, value)),
            }
        }
        let parts: Vec<String> = runs
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{start}-{end}")
                }
            })
            .collect();
        f.write_str(&parts.join(LIST_SEPARATOR))
    }
}

/// Check a year against the catalogue bounds.
pub fn validate_year(year: i64) -> Result<i64> {
    if year > MUYBRIDGE && year <= MAX_YEAR {
        Ok(year)
    } else {
        Err(ReelError::YearOutOfRange {
            year,
            min: MUYBRIDGE + 1,
            max: MAX_YEAR,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MovieKey {
    pub title: String,
    pub year: i64,
}

impl fmt::Display for MovieKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub key: MovieKey,
    pub directors: BTreeSet<String>,
    /// Running time in minutes.
    pub duration: Option<u32>,
    pub notes: String,
    pub tags: BTreeSet<String>,
}

impl Movie {
    pub fn new(title: impl Into<String>, year: i64) -> Result<Self> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ReelError::invalid_movie("title must not be empty"));
        }
        Ok(Self {
            key: MovieKey {
                title,
                year: validate_year(year)?,
            },
            directors: BTreeSet::new(),
            duration: None,
            notes: String::new(),
            tags: BTreeSet::new(),
        })
    }

    /// Build a movie from named text values, as produced by a form commit or
    /// a CSV row.
    ///
    /// `title` and `year` are required. `director` and `tags` are
    /// comma-separated lists; `minutes` is a whole number.
    pub fn from_fields<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut title = None;
        let mut year = None;
        let mut directors = BTreeSet::new();
        let mut duration = None;
        let mut notes = String::new();
        let mut tags = BTreeSet::new();

        for (name, value) in fields {
            match name {
                TITLE => title = Some(value),
                YEAR => year = Some(value.parse::<MovieInteger>()?.single()?),
                DIRECTOR => directors = split_list(value),
                DURATION => {
                    let value = value.trim();
                    if !value.is_empty() {
                        duration = Some(value.parse::<u32>().map_err(|_| {
                            ReelError::invalid_movie(format!(
                                "minutes must be a whole number, got '{value}'"
                            ))
                        })?);
                    }
                }
                NOTES => notes = value.to_string(),
                MOVIE_TAGS => tags = split_list(value),
                other => {
                    return Err(ReelError::invalid_movie(format!("unknown field '{other}'")));
                }
            }
        }

        let title = title.ok_or_else(|| ReelError::invalid_movie("missing title"))?;
        let year = year.ok_or_else(|| ReelError::invalid_movie("missing year"))?;
        let mut movie = Self::new(title, year)?;
        movie.directors = directors;
        movie.duration = duration;
        movie.notes = notes;
        movie.tags = tags;
        Ok(movie)
    }

    /// The movie as named text values, the inverse of
    /// [`from_fields`](Self::from_fields).
    #[must_use]
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (TITLE, self.key.title.clone()),
            (YEAR, self.key.year.to_string()),
            (DIRECTOR, join_list(&self.directors)),
            (
                DURATION,
                self.duration.map(|d| d.to_string()).unwrap_or_default(),
            ),
            (NOTES, self.notes.clone()),
            (MOVIE_TAGS, join_list(&self.tags)),
        ]
    }
}

/// Split on commas with or without a following space; `join_list` writes
/// `", "`.
fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_list(items: &BTreeSet<String>) -> String {
    items
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}
