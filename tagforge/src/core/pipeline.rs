//! Persistent post-processing applied to every produced payload.

use super::types::{PersistentOperation, Substitution, apply_substitutions};
use crate::error::EngineError;

/// Replace each persistent alias in `payload` with its chained result.
///
/// Each chain is seeded with the operation's literal, after any iterative
/// aliases nested inside it have been resolved through `substitutions`.
/// `apply` runs one named persistent transform on one input.
pub fn apply_persistent<F>(
    payload: &str,
    operations: &[PersistentOperation],
    substitutions: &[Substitution],
    mut apply: F,
) -> Result<String, EngineError>
where
    F: FnMut(&str, &str) -> Result<String, EngineError>,
{
    let mut out = payload.to_string();
    for op in operations {
        let mut current = apply_substitutions(&op.literal, substitutions);
        for name in &op.chain {
            current = apply(name, &current)?;
        }
        out = out.replace(&op.alias, &current);
    }
    Ok(out)
}
