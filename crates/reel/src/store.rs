//! The catalogue boundary.
//!
//! Forms and the importer hand finished [`Movie`]s to a [`MovieStore`].
//! [`MemoryStore`] enforces the catalogue's rules and backs the CLI and
//! tests.
//!
//! # Invariants
//!
//! - `(title, year)` is unique across movies.
//! - Every tag on a movie is also in the tag list. Adding or editing a
//!   movie registers its tags; deleting or renaming a tag updates every
//!   movie carrying it.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ReelError, Result};
use crate::movie::{Movie, MovieInteger, MovieKey};

pub trait MovieStore {
    /// Add a movie.
    ///
    /// # Errors
    ///
    /// [`ReelError::DuplicateMovie`] if a movie with the same title and year
    /// is already stored.
    fn add_movie(&mut self, movie: Movie) -> Result<()>;

    /// Replace the movie stored under `key`. The replacement may carry a
    /// different key.
    ///
    /// # Errors
    ///
    /// [`ReelError::MovieNotFound`] for an unknown `key`;
    /// [`ReelError::DuplicateMovie`] if the new key belongs to another movie.
    fn edit_movie(&mut self, key: &MovieKey, movie: Movie) -> Result<()>;

    fn delete_movie(&mut self, key: &MovieKey) -> Result<Movie>;

    /// Every tag, sorted.
    fn all_tags(&self) -> Vec<String>;

    fn movie_tags(&self, key: &MovieKey) -> Result<Vec<String>>;

    /// Create a tag. Adding an existing tag is a no-op.
    fn add_tag(&mut self, tag: &str) -> Result<()>;

    /// Attach an existing tag to a movie.
    fn add_movie_tag(&mut self, tag: &str, key: &MovieKey) -> Result<()>;

    /// Rename a tag everywhere it is used.
    fn edit_tag(&mut self, old: &str, new: &str) -> Result<()>;

    /// Replace a movie's tags with `tags`, all of which must exist.
    fn edit_movie_tags(&mut self, key: &MovieKey, tags: BTreeSet<String>) -> Result<()>;

    /// Delete a tag and detach it from every movie.
    fn delete_tag(&mut self, tag: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    movies: BTreeMap<MovieKey, Movie>,
    tags: BTreeSet<String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &MovieKey) -> Option<&Movie> {
        self.movies.get(key)
    }

    /// Movies whose title contains `title` (case-insensitive) and whose year
    /// is in `years`. `None` matches everything.
    #[must_use]
    pub fn find(&self, title: Option<&str>, years: Option<&MovieInteger>) -> Vec<&Movie> {
        let needle = title.map(str::to_lowercase);
        self.movies
            .values()
            .filter(|movie| {
                needle
                    .as_deref()
                    .is_none_or(|n| movie.key.title.to_lowercase().contains(n))
            })
            .filter(|movie| years.is_none_or(|y| y.contains(movie.key.year)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    fn movie_mut(&mut self, key: &MovieKey) -> Result<&mut Movie> {
        self.movies
            .get_mut(key)
            .ok_or_else(|| ReelError::movie_not_found(key))
    }

    fn require_tag(&self, tag: &str) -> Result<()> {
        if self.tags.contains(tag) {
            Ok(())
        } else {
            Err(ReelError::tag_not_found(tag))
        }
    }
}

fn clean_tag(tag: &str) -> Result<String> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(ReelError::invalid_movie("tag must not be empty"));
    }
    Ok(tag.to_string())
}

impl MovieStore for MemoryStore {
    fn add_movie(&mut self, movie: Movie) -> Result<()> {
        if self.movies.contains_key(&movie.key) {
            return Err(ReelError::DuplicateMovie {
                title: movie.key.title,
                year: movie.key.year,
            });
        }
        tracing::debug!(message = "store.add", movie = %movie.key);
        self.tags.extend(movie.tags.iter().cloned());
        self.movies.insert(movie.key.clone(), movie);
        Ok(())
    }

    fn edit_movie(&mut self, key: &MovieKey, movie: Movie) -> Result<()> {
        if !self.movies.contains_key(key) {
            return Err(ReelError::movie_not_found(key));
        }
        if movie.key != *key && self.movies.contains_key(&movie.key) {
            return Err(ReelError::DuplicateMovie {
                title: movie.key.title,
                year: movie.key.year,
            });
        }
        tracing::debug!(message = "store.edit", from = %key, to = %movie.key);
        self.movies.remove(key);
        self.tags.extend(movie.tags.iter().cloned());
        self.movies.insert(movie.key.clone(), movie);
        Ok(())
    }

    fn delete_movie(&mut self, key: &MovieKey) -> Result<Movie> {
        let movie = self
            .movies
            .remove(key)
            .ok_or_else(|| ReelError::movie_not_found(key))?;
        tracing::debug!(message = "store.delete", movie = %key);
        Ok(movie)
    }

    fn all_tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    fn movie_tags(&self, key: &MovieKey) -> Result<Vec<String>> {
        self.movies
            .get(key)
            .map(|movie| movie.tags.iter().cloned().collect())
            .ok_or_else(|| ReelError::movie_not_found(key))
    }

    fn add_tag(&mut self, tag: &str) -> Result<()> {
        let tag = clean_tag(tag)?;
        if self.tags.insert(tag.clone()) {
            tracing::debug!(message = "store.tag.add", tag = %tag);
        }
        Ok(())
    }

    fn add_movie_tag(&mut self, tag: &str, key: &MovieKey) -> Result<()> {
        self.require_tag(tag)?;
        self.movie_mut(key)?.tags.insert(tag.to_string());
        Ok(())
    }

    fn edit_tag(&mut self, old: &str, new: &str) -> Result<()> {
        self.require_tag(old)?;
        let new = clean_tag(new)?;
        if new == old {
            return Ok(());
        }
        if self.tags.contains(&new) {
            return Err(ReelError::DuplicateTag { tag: new });
        }
        self.tags.remove(old);
        self.tags.insert(new.clone());
        for movie in self.movies.values_mut() {
            if movie.tags.remove(old) {
                movie.tags.insert(new.clone());
            }
        }
        tracing::debug!(message = "store.tag.edit", from = %old, to = %new);
        Ok(())
    }

    fn edit_movie_tags(&mut self, key: &MovieKey, tags: BTreeSet<String>) -> Result<()> {
        for tag in &tags {
            self.require_tag(tag)?;
        }
        self.movie_mut(key)?.tags = tags;
        Ok(())
    }

    fn delete_tag(&mut self, tag: &str) -> Result<()> {
        if !self.tags.remove(tag) {
            return Err(ReelError::tag_not_found(tag));
        }
        for movie in self.movies.values_mut() {
            movie.tags.remove(tag);
        }
        tracing::debug!(message = "store.tag.delete", tag = %tag);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, year: i64) -> Movie {
        Movie::new(title, year).unwrap()
    }

    fn key(title: &str, year: i64) -> MovieKey {
        MovieKey {
            title: title.to_string(),
            year,
        }
    }

    #[test]
    fn add_get_delete() {
        let mut store = MemoryStore::new();
        store.add_movie(movie("Ran", 1985)).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get(&key("Ran", 1985)).is_some());

        let removed = store.delete_movie(&key("Ran", 1985)).unwrap();
        assert_eq!(removed.key.title, "Ran");
        assert!(store.is_empty());
        assert!(matches!(
            store.delete_movie(&key("Ran", 1985)),
            Err(ReelError::MovieNotFound { year: 1985, .. })
        ));
    }

    #[test]
    fn duplicate_key_rejected() {
        let mut store = MemoryStore::new();
        store.add_movie(movie("Ran", 1985)).unwrap();
        let err = store.add_movie(movie("Ran", 1985)).unwrap_err();
        assert!(matches!(err, ReelError::DuplicateMovie { year: 1985, .. }));
        // Same title, different year is a different movie.
        store.add_movie(movie("Ran", 1986)).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn edit_movie_may_rekey() {
        let mut store = MemoryStore::new();
        store.add_movie(movie("Solaris", 1971)).unwrap();
        store.add_movie(movie("Stalker", 1979)).unwrap();

        let mut fixed = movie("Solaris", 1972);
        fixed.notes = "year corrected".to_string();
        store.edit_movie(&key("Solaris", 1971), fixed).unwrap();
        assert!(store.get(&key("Solaris", 1971)).is_none());
        assert_eq!(store.get(&key("Solaris", 1972)).unwrap().notes, "year corrected");

        let clash = store.edit_movie(&key("Solaris", 1972), movie("Stalker", 1979));
        assert!(matches!(clash, Err(ReelError::DuplicateMovie { .. })));
        assert!(store.get(&key("Solaris", 1972)).is_some());

        let missing = store.edit_movie(&key("Mirror", 1975), movie("Mirror", 1975));
        assert!(matches!(missing, Err(ReelError::MovieNotFound { .. })));
    }

    #[test]
    fn tag_lifecycle() {
        let mut store = MemoryStore::new();
        store.add_movie(movie("Solaris", 1972)).unwrap();
        store.add_movie(movie("Stalker", 1979)).unwrap();

        store.add_tag("sci-fi").unwrap();
        store.add_tag("sci-fi").unwrap();
        store.add_tag(" slow ").unwrap();
        assert_eq!(store.all_tags(), vec!["sci-fi", "slow"]);
        assert!(store.add_tag("  ").is_err());

        store.add_movie_tag("sci-fi", &key("Solaris", 1972)).unwrap();
        store.add_movie_tag("sci-fi", &key("Stalker", 1979)).unwrap();
        assert!(matches!(
            store.add_movie_tag("noir", &key("Solaris", 1972)),
            Err(ReelError::TagNotFound { .. })
        ));

        store.edit_tag("sci-fi", "science fiction").unwrap();
        assert_eq!(store.all_tags(), vec!["science fiction", "slow"]);
        assert_eq!(
            store.movie_tags(&key("Stalker", 1979)).unwrap(),
            vec!["science fiction"]
        );
        assert!(matches!(
            store.edit_tag("slow", "science fiction"),
            Err(ReelError::DuplicateTag { .. })
        ));

        store.delete_tag("science fiction").unwrap();
        assert_eq!(store.all_tags(), vec!["slow"]);
        assert!(store.movie_tags(&key("Solaris", 1972)).unwrap().is_empty());
        assert!(store.delete_tag("science fiction").is_err());
    }

    #[test]
    fn edit_movie_tags_replaces_set() {
        let mut store = MemoryStore::new();
        let mut solaris = movie("Solaris", 1972);
        solaris.tags = BTreeSet::from(["space".to_string(), "slow".to_string()]);
        store.add_movie(solaris).unwrap();
        store.add_tag("remake").unwrap();
        // Tags carried by an added movie are registered.
        assert_eq!(store.all_tags(), vec!["remake", "slow", "space"]);

        let solaris = key("Solaris", 1972);
        store
            .edit_movie_tags(&solaris, BTreeSet::from(["slow".to_string(), "remake".to_string()]))
            .unwrap();
        assert_eq!(store.movie_tags(&solaris).unwrap(), vec!["remake", "slow"]);

        let err = store
            .edit_movie_tags(&solaris, BTreeSet::from(["ghost".to_string()]))
            .unwrap_err();
        assert!(matches!(err, ReelError::TagNotFound { .. }));
        assert_eq!(store.movie_tags(&solaris).unwrap(), vec!["remake", "slow"]);
    }

    #[test]
    fn find_by_title_and_years() {
        let mut store = MemoryStore::new();
        store.add_movie(movie("Solaris", 1972)).unwrap();
        store.add_movie(movie("Solaris", 2002)).unwrap();
        store.add_movie(movie("Stalker", 1979)).unwrap();

        let seventies: MovieInteger = "1970-1979".parse().unwrap();
        let hits = store.find(Some("sol"), Some(&seventies));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].key.year, 1972);

        assert_eq!(store.find(None, Some(&seventies)).len(), 2);
        assert_eq!(store.find(None, None).len(), 3);
        assert_eq!(store.iter().count(), 3);
    }
}
