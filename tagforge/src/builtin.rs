//! Declarative step bodies for transforms defined in configuration files.

use serde::{Deserialize, Serialize};

use crate::core::state::IterationState;
use crate::transform::StepResult;

pub const DEFAULT_FORMAT: &str = "{element}";

/// Render an iterative body template.
///
/// Placeholders: `{element}` (value presented by the strategy), `{literal}`
/// (region inner text), `{iteration}` (0-based value count).
///
/// The format is scanned once; substituted text is copied verbatim, so
/// braces inside elements or literals are never expanded. Unknown
/// placeholders are kept as written.
pub fn render_format(format: &str, element: &str, state: &IterationState) -> String {
    let iteration = state.iteration().to_string();
    let placeholders = [
        ("{element}", element),
        ("{literal}", state.inner()),
        ("{iteration}", iteration.as_str()),
    ];
    let mut out = String::with_capacity(format.len() + element.len());
    let mut rest = format;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match placeholders.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Step function body built from a format template.
pub fn format_body(format: String) -> impl Fn(&str, &mut IterationState) -> StepResult + Send + Sync {
    move |element: &str, state: &mut IterationState| Ok(render_format(&format, element, state))
}

/// Built-in persistent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistentOp {
    Upper,
    Lower,
    Trim,
    Reverse,
    Hex,
}

impl PersistentOp {
    pub fn apply(self, input: &str) -> String {
        match self {
            PersistentOp::Upper => input.to_uppercase(),
            PersistentOp::Lower => input.to_lowercase(),
            PersistentOp::Trim => input.trim().to_string(),
            PersistentOp::Reverse => input.chars().rev().collect(),
            PersistentOp::Hex => hex::encode(input),
        }
    }
}

/// Persistent body applying `ops` left to right.
pub fn persistent_body(ops: Vec<PersistentOp>) -> impl Fn(&str) -> anyhow::Result<String> + Send + Sync {
    move |input: &str| Ok(ops.iter().fold(input.to_string(), |acc, op| op.apply(&acc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_substitutes_every_placeholder() {
        let mut state = IterationState::default();
        state.resume("deer");
        let body = format_body("{literal}/{element}#{iteration}".to_string());
        assert_eq!(body("pdf", &mut state).expect("body"), "deer/pdf#0");
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let mut state = IterationState::default();
        state.resume("");
        let body = format_body("{element}".to_string());
        assert_eq!(body("{literal}", &mut state).expect("body"), "{literal}");

        state.resume("{element}");
        assert_eq!(
            render_format("<{literal}|{iteration}>", "x", &state),
            "<{element}|0>"
        );
        assert_eq!(render_format("{unknown} {", "x", &state), "{unknown} {");
    }

    #[test]
    fn persistent_ops_compose_in_order() {
        let body = persistent_body(vec![PersistentOp::Trim, PersistentOp::Reverse, PersistentOp::Upper]);
        assert_eq!(body("  abc ").expect("body"), "CBA");
        assert_eq!(PersistentOp::Hex.apply("ab"), "6162");
    }
}
