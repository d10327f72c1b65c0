//! Sources of externally observed words.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::wordlist::read_wordlist;

/// Supplies the observed-word sequence when an `Observed` transform activates.
pub trait WordSource {
    fn observed_words(&self) -> Result<Vec<String>>;
}

/// Fixed in-memory word list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticWords(pub Vec<String>);

impl StaticWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(words.into_iter().map(Into::into).collect())
    }
}

impl WordSource for StaticWords {
    fn observed_words(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

/// Wordlist file re-read on every activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWords {
    pub path: PathBuf,
}

impl FileWords {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl WordSource for FileWords {
    fn observed_words(&self) -> Result<Vec<String>> {
        read_wordlist(&self.path).with_context(|| format!("read {}", self.path.display()))
    }
}
