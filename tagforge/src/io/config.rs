//! Generator configuration for the CLI, stored as TOML next to a template.
//!
//! Transforms declared here get declarative bodies from [`crate::builtin`];
//! library callers register closures directly on a [`TransformSet`] instead.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::corpus::CorpusManifest;
use super::observed::FileWords;
use crate::builtin::{DEFAULT_FORMAT, PersistentOp, format_body, persistent_body};
use crate::strategy::IterationStrategy;
use crate::transform::TransformSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Shuffle list-based strategies once per activation.
    pub randomize_lists: bool,

    pub seed: Option<u64>,

    /// Directory holding `manifest.txt` for `corpus` strategies.
    pub corpus_dir: Option<PathBuf>,

    /// Wordlist read by `observed` strategies.
    pub observed_words: Option<PathBuf>,

    pub iterative: BTreeMap<String, IterativeSpec>,

    pub persistent: BTreeMap<String, PersistentSpec>,

    /// `new_name = "source_name"`.
    pub clones: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IterativeSpec {
    #[serde(flatten)]
    pub strategy: StrategySpec,

    /// Body template; see [`crate::builtin::render_format`].
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategySpec {
    Counted {
        count: usize,
    },
    Range {
        start: i64,
        end: i64,
        #[serde(default = "default_step")]
        step: i64,
    },
    List {
        values: Vec<String>,
    },
    Files {
        paths: Vec<PathBuf>,
    },
    Corpus {
        keywords: Vec<String>,
    },
    Observed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistentSpec {
    pub ops: Vec<PersistentOp>,
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

fn default_step() -> i64 {
    1
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.iterative {
            match &spec.strategy {
                StrategySpec::Range { step: 0, .. } => {
                    return Err(anyhow!("iterative.{name}: range step must not be zero"));
                }
                StrategySpec::Corpus { .. } if self.corpus_dir.is_none() => {
                    return Err(anyhow!("iterative.{name}: corpus strategy requires corpus_dir"));
                }
                StrategySpec::Observed if self.observed_words.is_none() => {
                    return Err(anyhow!(
                        "iterative.{name}: observed strategy requires observed_words"
                    ));
                }
                _ => {}
            }
        }
        for (name, spec) in &self.persistent {
            if spec.ops.is_empty() {
                return Err(anyhow!("persistent.{name}: ops must be a non-empty array"));
            }
        }
        for (name, source) in &self.clones {
            if !self.iterative.contains_key(source) {
                return Err(anyhow!(
                    "clones.{name}: source '{source}' is not an iterative transform"
                ));
            }
        }
        Ok(())
    }

    /// Register every declared transform. Relative paths resolve against
    /// `base_dir`.
    pub fn build_transforms(&self, base_dir: &Path) -> Result<TransformSet> {
        self.validate()?;
        let manifest = match &self.corpus_dir {
            Some(dir) if self.uses_corpus() => Some(CorpusManifest::load(&resolve(base_dir, dir))?),
            _ => None,
        };

        let mut set = TransformSet::new();
        for (name, spec) in &self.iterative {
            let strategy = match &spec.strategy {
                StrategySpec::Counted { count } => IterationStrategy::counted(*count),
                StrategySpec::Range { start, end, step } => {
                    IterationStrategy::range(*start, *end, *step)?
                }
                StrategySpec::List { values } => IterationStrategy::list([values.clone()]),
                StrategySpec::Files { paths } => {
                    IterationStrategy::files(paths.iter().map(|p| resolve(base_dir, p)))
                }
                StrategySpec::Corpus { keywords } => {
                    let manifest = manifest
                        .as_ref()
                        .with_context(|| format!("iterative.{name}: corpus manifest not loaded"))?;
                    IterationStrategy::corpus(manifest, keywords)?
                }
                StrategySpec::Observed => IterationStrategy::observed(),
            };
            set.register_iterative(name, strategy, format_body(spec.format.clone()))
                .with_context(|| format!("register iterative.{name}"))?;
        }
        for (name, spec) in &self.persistent {
            set.register_persistent(name, persistent_body(spec.ops.clone()))
                .with_context(|| format!("register persistent.{name}"))?;
        }
        for (name, source) in &self.clones {
            set.clone_iterative(source, name)
                .with_context(|| format!("register clones.{name}"))?;
        }
        debug!(
            iterative = set.iterative_names().len(),
            persistent = set.persistent_names().len(),
            "built transforms from config"
        );
        Ok(set)
    }

    /// Observed-word source, when one is configured.
    pub fn word_source(&self, base_dir: &Path) -> Option<FileWords> {
        self.observed_words
            .as_ref()
            .map(|path| FileWords::new(resolve(base_dir, path)))
    }

    fn uses_corpus(&self) -> bool {
        self.iterative
            .values()
            .any(|spec| matches!(spec.strategy, StrategySpec::Corpus { .. }))
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Directory that relative paths in the config at `path` resolve against.
pub fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GeneratorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
seed = 7

[iterative.method]
strategy = "list"
values = ["GET", "POST"]

[iterative.port]
strategy = "range"
start = 80
end = 83

[iterative.dirs]
strategy = "files"
paths = ["dirs.txt"]
format = "{literal}/{element}"

[persistent.shout]
ops = ["trim", "upper"]

[clones]
method2 = "method"
"#;

    #[test]
    fn parses_tagged_strategies_with_defaults() {
        let cfg: GeneratorConfig = toml::from_str(SAMPLE).expect("parse");
        assert_eq!(cfg.seed, Some(7));
        assert!(!cfg.randomize_lists);
        assert_eq!(
            cfg.iterative["port"].strategy,
            StrategySpec::Range {
                start: 80,
                end: 83,
                step: 1
            }
        );
        assert_eq!(cfg.iterative["method"].format, DEFAULT_FORMAT);
        assert_eq!(
            cfg.persistent["shout"].ops,
            vec![PersistentOp::Trim, PersistentOp::Upper]
        );
        cfg.validate().expect("valid");
    }

    #[test]
    fn validate_rejects_bad_declarations() {
        let bad = [
            "[iterative.r]\nstrategy = \"range\"\nstart = 0\nend = 3\nstep = 0\n",
            "[persistent.p]\nops = []\n",
            "[clones]\nx = \"missing\"\n",
            "[iterative.c]\nstrategy = \"corpus\"\nkeywords = [\"verbs\"]\n",
            "[iterative.o]\nstrategy = \"observed\"\n",
        ];
        for text in bad {
            let cfg: GeneratorConfig = toml::from_str(text).expect("parse");
            assert!(cfg.validate().is_err(), "expected rejection: {text}");
        }
    }

    #[test]
    fn unknown_strategy_fails_to_parse() {
        let err = toml::from_str::<GeneratorConfig>("[iterative.x]\nstrategy = \"bogus\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn builds_transforms_with_relative_paths() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("dirs.txt"), "admin\nlogin\n").expect("write");
        let path = temp.path().join("gen.toml");
        fs::write(&path, SAMPLE).expect("write");

        let cfg = load_config(&path).expect("load");
        let set = cfg.build_transforms(&config_dir(&path)).expect("build");
        assert_eq!(set.iterative_names(), vec!["dirs", "method", "method2", "port"]);
        assert_eq!(set.persistent_names(), vec!["shout"]);
        let dirs = set.iterative("dirs").expect("dirs");
        assert_eq!(
            dirs.strategy(),
            &IterationStrategy::files([temp.path().join("dirs.txt")])
        );
    }

    #[test]
    fn corpus_keywords_resolve_against_manifest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let corpus = temp.path().join("corpus");
        fs::create_dir_all(&corpus).expect("mkdir");
        fs::write(corpus.join("manifest.txt"), "verbs.pay\n").expect("write");
        fs::write(corpus.join("verbs.pay"), "GET\n").expect("write");

        let text = "corpus_dir = \"corpus\"\n[iterative.v]\nstrategy = \"corpus\"\nkeywords = [\"verbs\"]\n";
        let cfg: GeneratorConfig = toml::from_str(text).expect("parse");
        cfg.build_transforms(temp.path()).expect("build");

        let text = "corpus_dir = \"corpus\"\n[iterative.v]\nstrategy = \"corpus\"\nkeywords = [\"nouns\"]\n";
        let cfg: GeneratorConfig = toml::from_str(text).expect("parse");
        let err = cfg.build_transforms(temp.path()).expect_err("unknown keyword");
        assert!(format!("{err:#}").contains("unknown corpus 'nouns' (valid: verbs)"));
    }

    #[test]
    fn config_dir_defaults_to_current_directory() {
        assert_eq!(config_dir(Path::new("gen.toml")), PathBuf::from("."));
        assert_eq!(config_dir(Path::new("a/gen.toml")), PathBuf::from("a"));
    }
}
