//! Error taxonomy for template parsing, transform registration and generation.
//!
//! - [`ValidationError`]: raised once while registering transforms or
//!   constructing an engine. Fatal to engine creation.
//! - [`EngineError`]: everything that can abort a running sequence, including
//!   wrapped validation failures so the public surface has one error type.
//!
//! Exhaustion is not an error. It travels as [`crate::transform::StepError::Exhausted`]
//! inside step functions and as `Ok(None)` out of [`crate::engine::Engine::advance`].

use std::path::PathBuf;

use thiserror::Error;

use crate::core::markup::Family;

/// Malformed markup or an invalid registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing end tag {close} for {open}")]
    MissingEndTag { open: String, close: String },

    #[error("missing start tag terminator ']' for {open}")]
    MissingStartTerminator { open: String },

    #[error("cannot mix iterative families: {first} and {second}")]
    MixedFamilies { first: Family, second: Family },

    #[error("transform '{transform}' is bound more than once in {family} mode")]
    DuplicateBinding { family: Family, transform: String },

    #[error("unknown {family} transform '{name}' in annotation [{annotation}]")]
    UnknownTransform {
        family: Family,
        name: String,
        annotation: String,
    },

    #[error("unknown corpus '{keyword}' (valid: {})", valid.join(", "))]
    UnknownCorpus { keyword: String, valid: Vec<String> },

    #[error("range step must not be zero")]
    InvalidRangeStep,

    #[error("transform '{name}' is already registered")]
    DuplicateTransform { name: String },

    #[error("invalid transform name '{name}': {reason}")]
    InvalidTransformName { name: String, reason: &'static str },

    #[error("cannot clone unknown iterative transform '{source_name}'")]
    UnknownCloneSource { source_name: String },
}

/// Errors surfaced by a running engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A collaborator the transform depends on is missing or unusable.
    #[error("transform '{transform}' is misconfigured: {reason}")]
    Configuration { transform: String, reason: String },

    #[error("transform '{transform}' could not read wordlist {}", path.display())]
    Wordlist {
        transform: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A step function failed with something other than exhaustion.
    #[error("transform '{transform}' failed")]
    Step {
        transform: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no {kind} instance of transform '{transform}'")]
    NoInstance { kind: &'static str, transform: String },

    #[error("transform '{transform}' has {count} instances; lookups need exactly one")]
    MultipleInstances { transform: String, count: usize },

    #[error("transform '{transform}' is persistent and has no cached output")]
    PersistentOutput { transform: String },
}

impl EngineError {
    pub(crate) fn step(transform: &str, source: anyhow::Error) -> Self {
        EngineError::Step {
            transform: transform.to_string(),
            source,
        }
    }

    pub(crate) fn configuration(transform: &str, reason: impl Into<String>) -> Self {
        EngineError::Configuration {
            transform: transform.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_corpus_lists_every_valid_keyword() {
        let err = ValidationError::UnknownCorpus {
            keyword: "nope".to_string(),
            valid: vec!["dirsearch".to_string(), "a-z".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown corpus 'nope' (valid: dirsearch, a-z)"
        );
    }

    #[test]
    fn step_error_keeps_source_chain() {
        let err = EngineError::step("h1", anyhow::anyhow!("bad base64"));
        assert_eq!(format!("{:#}", anyhow::Error::from(err)), "transform 'h1' failed: bad base64");
    }
}
