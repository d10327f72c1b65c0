//! Built-in payload corpora described by a manifest.
//!
//! A corpus directory holds `manifest.txt`, one `<keyword>.pay` entry per
//! line, next to the `.pay` wordlists themselves. Resolution is a pure lookup
//! against the loaded manifest; the wordlists are read only when a transform
//! using them is activated.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::error::ValidationError;

pub const MANIFEST_FILE: &str = "manifest.txt";
pub const CORPUS_EXTENSION: &str = "pay";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusManifest {
    root: PathBuf,
    keywords: Vec<String>,
}

impl CorpusManifest {
    /// Load `<dir>/manifest.txt`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let manifest = Self::parse(dir, &contents);
        debug!(root = %dir.display(), keywords = manifest.keywords.len(), "loaded corpus manifest");
        Ok(manifest)
    }

    pub fn parse(root: &Path, contents: &str) -> Self {
        let suffix = format!(".{CORPUS_EXTENSION}");
        let keywords = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.strip_suffix(&suffix).unwrap_or(line).to_string())
            .collect();
        Self {
            root: root.to_path_buf(),
            keywords,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Map a keyword to its wordlist path.
    pub fn resolve(&self, keyword: &str) -> Result<PathBuf, ValidationError> {
        if keyword.is_empty() || !self.keywords.iter().any(|k| k == keyword) {
            return Err(ValidationError::UnknownCorpus {
                keyword: keyword.to_string(),
                valid: self.keywords.clone(),
            });
        }
        Ok(self.root.join(format!("{keyword}.{CORPUS_EXTENSION}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_extension_and_blank_lines() {
        let manifest = CorpusManifest::parse(Path::new("/c"), "dirsearch.pay\n\n3 letter words.pay\n");
        assert_eq!(manifest.keywords(), ["dirsearch", "3 letter words"]);
    }

    #[test]
    fn resolve_joins_root_and_extension() {
        let manifest = CorpusManifest::parse(Path::new("/c"), "dirsearch.pay");
        assert_eq!(
            manifest.resolve("dirsearch").expect("resolve"),
            PathBuf::from("/c/dirsearch.pay")
        );
    }

    #[test]
    fn resolve_unknown_lists_valid_keywords() {
        let manifest = CorpusManifest::parse(Path::new("/c"), "a-z.pay\n0-9.pay");
        let err = manifest.resolve("Usernames").expect_err("unknown");
        assert_eq!(
            err,
            ValidationError::UnknownCorpus {
                keyword: "Usernames".to_string(),
                valid: vec!["a-z".to_string(), "0-9".to_string()],
            }
        );
        assert!(manifest.resolve("").is_err());
    }

    #[test]
    fn load_reads_manifest_from_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(MANIFEST_FILE), "verbs.pay\n").expect("write");
        let manifest = CorpusManifest::load(temp.path()).expect("load");
        assert_eq!(manifest.keywords(), ["verbs"]);
        assert_eq!(manifest.root(), temp.path());
    }
}
