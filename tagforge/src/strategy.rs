//! Iteration strategies: how a step function is turned into a producer.
//!
//! A strategy is attached to an iterative transform at registration time. On
//! each (re)activation it is materialized into a cursor stored in the
//! transform's state; list-based strategies read their elements at that point
//! and may shuffle them once.

use std::fmt;
use std::path::PathBuf;

use rand::RngCore;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::core::state::Cursor;
use crate::error::{EngineError, ValidationError};
use crate::io::corpus::CorpusManifest;
use crate::io::observed::WordSource;
use crate::io::wordlist::read_wordlist;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationStrategy {
    /// Present the region's literal `n` times.
    Counted(usize),
    /// Present `start`, `start + step`, ... until `end` is reached or passed.
    Range { start: i64, end: i64, step: i64 },
    /// Present each element of the concatenated lists.
    List(Vec<String>),
    /// Present each non-blank trimmed line of the files, in order.
    Files(Vec<PathBuf>),
    /// Built-in corpora, resolved to their wordlist files at registration.
    Corpus {
        keywords: Vec<String>,
        files: Vec<PathBuf>,
    },
    /// Present the words supplied by the engine's [`WordSource`].
    Observed,
}

/// Collaborators available while a strategy is materialized.
#[derive(Default)]
pub struct Activation<'a> {
    pub words: Option<&'a dyn WordSource>,
    /// Set when list-based strategies should shuffle their elements.
    pub shuffle: Option<&'a mut dyn RngCore>,
}

impl IterationStrategy {
    pub fn counted(n: usize) -> Self {
        IterationStrategy::Counted(n)
    }

    pub fn range(start: i64, end: i64, step: i64) -> Result<Self, ValidationError> {
        if step == 0 {
            return Err(ValidationError::InvalidRangeStep);
        }
        Ok(IterationStrategy::Range { start, end, step })
    }

    /// Concatenate `lists` in order.
    pub fn list<I, L, S>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IterationStrategy::List(lists.into_iter().flatten().map(Into::into).collect())
    }

    pub fn files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        IterationStrategy::Files(paths.into_iter().map(Into::into).collect())
    }

    /// Resolve every keyword against `manifest`; unknown keywords are rejected.
    pub fn corpus<I, S>(manifest: &CorpusManifest, keywords: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut files = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref();
            files.push(manifest.resolve(keyword)?);
            names.push(keyword.to_string());
        }
        Ok(IterationStrategy::Corpus {
            keywords: names,
            files,
        })
    }

    pub fn observed() -> Self {
        IterationStrategy::Observed
    }

    pub fn is_list_based(&self) -> bool {
        !matches!(
            self,
            IterationStrategy::Counted(_) | IterationStrategy::Range { .. }
        )
    }

    pub(crate) fn cursor(
        &self,
        transform: &str,
        activation: &mut Activation<'_>,
    ) -> Result<Cursor, EngineError> {
        let mut elements = match self {
            IterationStrategy::Counted(limit) => {
                return Ok(Cursor::Counted {
                    emitted: 0,
                    limit: *limit,
                });
            }
            IterationStrategy::Range { start, end, step } => {
                return Ok(Cursor::Range {
                    next: *start,
                    end: *end,
                    step: *step,
                });
            }
            IterationStrategy::List(elements) => elements.clone(),
            IterationStrategy::Files(files) | IterationStrategy::Corpus { files, .. } => {
                read_files(transform, files)?
            }
            IterationStrategy::Observed => {
                let words = activation.words.ok_or_else(|| {
                    EngineError::configuration(transform, "no observed-word source was supplied")
                })?;
                words.observed_words().map_err(|err| {
                    EngineError::configuration(transform, format!("observed words unavailable: {err:#}"))
                })?
            }
        };
        if let Some(rng) = activation.shuffle.as_deref_mut() {
            elements.shuffle(rng);
        }
        debug!(transform, elements = elements.len(), "materialized element list");
        Ok(Cursor::List { elements, index: 0 })
    }
}

fn read_files(transform: &str, files: &[PathBuf]) -> Result<Vec<String>, EngineError> {
    let mut elements = Vec::new();
    for path in files {
        let words = read_wordlist(path).map_err(|source| EngineError::Wordlist {
            transform: transform.to_string(),
            path: path.clone(),
            source,
        })?;
        elements.extend(words);
    }
    Ok(elements)
}

impl fmt::Display for IterationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IterationStrategy::Counted(n) => write!(f, "counted({n})"),
            IterationStrategy::Range { start, end, step } => {
                write!(f, "range({start}, {end}, {step})")
            }
            IterationStrategy::List(elements) => write!(f, "list({} elements)", elements.len()),
            IterationStrategy::Files(files) => {
                let shown: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
                write!(f, "files({})", shown.join(", "))
            }
            IterationStrategy::Corpus { keywords, .. } => write!(f, "corpus({})", keywords.join(", ")),
            IterationStrategy::Observed => f.write_str("observed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::observed::StaticWords;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use std::path::Path;

    fn drain(cursor: &mut Cursor) -> Vec<String> {
        std::iter::from_fn(|| cursor.next_element("lit")).collect()
    }

    #[test]
    fn zero_range_step_is_rejected() {
        assert_eq!(
            IterationStrategy::range(0, 10, 0).expect_err("zero"),
            ValidationError::InvalidRangeStep
        );
    }

    #[test]
    fn list_concatenates_in_order() {
        let strategy = IterationStrategy::list([vec!["a", "b"], vec!["c"]]);
        let mut cursor = strategy
            .cursor("t", &mut Activation::default())
            .expect("cursor");
        assert_eq!(drain(&mut cursor), vec!["a", "b", "c"]);
    }

    #[test]
    fn files_are_read_trimmed_and_concatenated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = temp.path().join("one.txt");
        let second = temp.path().join("two.txt");
        fs::write(&first, " a \n\nb\n").expect("write");
        fs::write(&second, "c\n").expect("write");
        let strategy = IterationStrategy::files([&first, &second]);
        let mut cursor = strategy
            .cursor("t", &mut Activation::default())
            .expect("cursor");
        assert_eq!(drain(&mut cursor), vec!["a", "b", "c"]);
    }

    #[test]
    fn unreadable_file_names_transform_and_path() {
        let strategy = IterationStrategy::files(["/definitely/not/here.txt"]);
        let err = strategy
            .cursor("dirs", &mut Activation::default())
            .expect_err("missing");
        assert!(matches!(err, EngineError::Wordlist { ref transform, .. } if transform == "dirs"));
    }

    #[test]
    fn corpus_resolves_through_manifest() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("verbs.pay"), "GET\nPOST\n").expect("write");
        let manifest = CorpusManifest::parse(temp.path(), "verbs.pay\n");
        let strategy = IterationStrategy::corpus(&manifest, ["verbs"]).expect("corpus");
        let mut cursor = strategy
            .cursor("t", &mut Activation::default())
            .expect("cursor");
        assert_eq!(drain(&mut cursor), vec!["GET", "POST"]);

        let err = IterationStrategy::corpus(&manifest, ["nouns"]).expect_err("unknown");
        assert!(matches!(err, ValidationError::UnknownCorpus { .. }));
    }

    #[test]
    fn observed_requires_a_word_source() {
        let err = IterationStrategy::observed()
            .cursor("seen", &mut Activation::default())
            .expect_err("no source");
        assert!(matches!(err, EngineError::Configuration { ref transform, .. } if transform == "seen"));

        let words = StaticWords::new(["token", "csrf"]);
        let mut activation = Activation {
            words: Some(&words),
            shuffle: None,
        };
        let mut cursor = IterationStrategy::observed()
            .cursor("seen", &mut activation)
            .expect("cursor");
        assert_eq!(drain(&mut cursor), vec!["token", "csrf"]);
    }

    #[test]
    fn shuffle_permutes_without_losing_elements() {
        let values: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let strategy = IterationStrategy::list([values.clone()]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut activation = Activation {
            words: None,
            shuffle: Some(&mut rng),
        };
        let mut cursor = strategy.cursor("t", &mut activation).expect("cursor");
        let mut shuffled = drain(&mut cursor);
        assert_ne!(shuffled, values);
        shuffled.sort();
        let mut expected = values;
        expected.sort();
        assert_eq!(shuffled, expected);
    }

    #[test]
    fn counted_and_range_are_not_list_based() {
        assert!(!IterationStrategy::counted(3).is_list_based());
        assert!(IterationStrategy::observed().is_list_based());
        assert_eq!(
            IterationStrategy::range(1, 4, 1).expect("range").to_string(),
            "range(1, 4, 1)"
        );
        let files = IterationStrategy::files([Path::new("a.txt")]);
        assert_eq!(files.to_string(), "files(a.txt)");
    }
}
