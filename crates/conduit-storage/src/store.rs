//! Link history store.
//!
//! The history is a flat JSON array of raw share-link strings,
//! rewritten in full on every save. Loading is best-effort: a missing
//! or unreadable-as-JSON file yields an empty history rather than an
//! error, so a corrupted file never blocks the app from starting.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default file name for the persisted history.
pub const HISTORY_FILE: &str = "links.json";

/// Persisted set of previously used share-links.
#[derive(Debug, Clone)]
pub struct LinkStore {
    path: PathBuf,
}

impl LinkStore {
    /// Creates a store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored links.
    ///
    /// A missing file is an empty history. A file that exists but does
    /// not parse as a JSON string array is logged and treated as empty;
    /// the next save will overwrite it.
    pub fn load(&self) -> Result<Vec<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str(&contents) {
            Ok(links) => Ok(links),
            Err(e) => {
                tracing::warn!(
                    "History file {} is malformed ({}); starting with empty history",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Rewrites the history file with `links`, deduplicated.
    ///
    /// Duplicates collapse to the first occurrence, so display order is
    /// stable across saves.
    pub fn save(&self, links: &[String]) -> Result<()> {
        let mut seen = HashSet::new();
        let deduped: Vec<&String> = links.iter().filter(|l| seen.insert(l.as_str())).collect();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&deduped)?)?;
        tracing::debug!(
            "Saved {} links to {}",
            deduped.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Loads, appends `link`, saves, and returns the stored list.
    pub fn append(&self, link: &str) -> Result<Vec<String>> {
        let mut links = self.load()?;
        links.push(link.to_string());
        self.save(&links)?;
        self.load()
    }
}
