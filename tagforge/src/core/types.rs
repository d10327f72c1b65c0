//! Shared types produced by the parser and mutated by the orchestrator.

use serde::Serialize;

/// One iterative markup occurrence bound to a transform.
///
/// Cumulative single-target annotations produce several operations that share
/// `alias` and `literal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub transform: String,
    pub alias: String,
    /// Inner text of the region as written in the template.
    pub literal: String,
    /// Last value substituted for this operation, if any step produced one.
    pub cached: Option<String>,
}

impl Operation {
    pub fn new(transform: &str, alias: &str, literal: &str) -> Self {
        Self {
            transform: transform.to_string(),
            alias: alias.to_string(),
            literal: literal.to_string(),
            cached: None,
        }
    }
}

/// One persistent markup occurrence and the chain of transforms it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistentOperation {
    /// Annotation as written, e.g. `upper` or `trim|upper`.
    pub binding: String,
    /// Transform names in application order.
    pub chain: Vec<String>,
    pub alias: String,
    pub literal: String,
}

/// Outcome of asking a transform for its next value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Value(String),
    Exhausted,
}

/// Replacement of one alias by its value for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub alias: String,
    pub value: String,
}

impl Substitution {
    pub fn new(alias: &str, value: &str) -> Self {
        Self {
            alias: alias.to_string(),
            value: value.to_string(),
        }
    }
}

/// Apply substitutions in order. An alias already consumed by an earlier
/// entry is left alone by later ones.
pub fn apply_substitutions(text: &str, substitutions: &[Substitution]) -> String {
    let mut out = text.to_string();
    for sub in substitutions {
        if out.contains(&sub.alias) {
            out = out.replace(&sub.alias, &sub.value);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_substitution_for_an_alias_wins() {
        let subs = vec![
            Substitution::new("AAAA", "active"),
            Substitution::new("AAAA", "literal"),
            Substitution::new("BBBB", "b"),
        ];
        assert_eq!(apply_substitutions("<AAAA|BBBB>", &subs), "<active|b>");
    }
}
