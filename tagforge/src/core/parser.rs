//! Template scanning: locate markup, validate it, and swap regions for aliases.
//!
//! Scanning runs one registered transform name at a time, left to right. An
//! open prefix whose annotation does not name the transform being searched is
//! skipped rather than rejected, because one transform name can be a prefix of
//! another (`[+h` also matches `[+h2]`).

use rand::Rng;
use tracing::{debug, warn};

use super::alias::AliasGenerator;
use super::markup::{CHAIN_SEPARATOR, CUMULATIVE_SEPARATOR, Family, Mode, detect_mode};
use super::types::{Operation, PersistentOperation};
use crate::error::ValidationError;

/// Result of parsing a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// Template with every recognized region replaced by its alias.
    pub template: String,
    pub operations: Vec<Operation>,
    pub persistent: Vec<PersistentOperation>,
    pub mode: Mode,
}

/// Registered names the parser validates annotations against.
#[derive(Debug, Clone, Copy)]
pub struct TransformNames<'a> {
    pub iterative: &'a [&'a str],
    pub persistent: &'a [&'a str],
}

/// A located region: byte offsets into the working template.
struct Region {
    start: usize,
    /// Offset of the close tag.
    end: usize,
    bracket: usize,
}

pub fn parse_template<R: Rng + ?Sized>(
    source: &str,
    names: TransformNames<'_>,
    aliases: &mut AliasGenerator,
    rng: &mut R,
) -> Result<ParsedTemplate, ValidationError> {
    let mode = detect_mode(source)?;
    let mut working = source.to_string();
    let mut operations = Vec::new();

    if let Some(family) = mode.family() {
        for name in names.iterative {
            scan_iterative(
                &mut working,
                source,
                family,
                name,
                names.iterative,
                &mut operations,
                aliases,
                rng,
            )?;
        }
        if operations.is_empty() {
            warn!(%family, "close tags present but no registered transform matched");
        }
    }

    let mut persistent = Vec::new();
    for name in names.persistent {
        scan_persistent(
            &mut working,
            source,
            name,
            names.persistent,
            &mut persistent,
            aliases,
            rng,
        )?;
    }

    debug!(
        ?mode,
        iterative = operations.len(),
        persistent = persistent.len(),
        "parsed template"
    );
    Ok(ParsedTemplate {
        template: working,
        operations,
        persistent,
        mode,
    })
}

/// Find the next region opened by `open` at or after `from`.
fn locate(
    working: &str,
    from: usize,
    open: &str,
    family: Family,
) -> Result<Option<Region>, ValidationError> {
    let close = family.close_tag();
    let mut from = from;
    let start = loop {
        let Some(relative) = working[from..].find(open) else {
            return Ok(None);
        };
        let start = from + relative;
        // Names that prefix `end` also match the close tag itself.
        if !working[start..].starts_with(close) {
            break start;
        }
        from = start + 1;
    };
    let end = working[start..]
        .find(close)
        .map(|i| start + i)
        .ok_or_else(|| ValidationError::MissingEndTag {
            open: open.to_string(),
            close: close.to_string(),
        })?;
    let bracket = working[start..end]
        .find(']')
        .map(|i| start + i)
        .ok_or_else(|| ValidationError::MissingStartTerminator {
            open: open.to_string(),
        })?;
    Ok(Some(Region {
        start,
        end,
        bracket,
    }))
}

/// Split a separator-delimited annotation, dropping blanks, validating names.
fn split_annotation(
    annotation: &str,
    separator: char,
    registered: &[&str],
    family: Family,
) -> Result<Vec<String>, ValidationError> {
    let mut out = Vec::new();
    for part in annotation.split(separator) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if !registered.contains(&part) {
            return Err(ValidationError::UnknownTransform {
                family,
                name: part.to_string(),
                annotation: annotation.to_string(),
            });
        }
        out.push(part.to_string());
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn scan_iterative<R: Rng + ?Sized>(
    working: &mut String,
    source: &str,
    family: Family,
    name: &str,
    registered: &[&str],
    operations: &mut Vec<Operation>,
    aliases: &mut AliasGenerator,
    rng: &mut R,
) -> Result<(), ValidationError> {
    let open = family.open_prefix(name);
    let close_len = family.close_tag().len();
    let mut cursor = 0;

    while let Some(region) = locate(working, cursor, &open, family)? {
        let annotation = &working[region.start + 2..region.bracket];
        let bound = if family == Family::Single && annotation.contains(CUMULATIVE_SEPARATOR) {
            split_annotation(annotation, CUMULATIVE_SEPARATOR, registered, family)?
        } else if annotation.trim() == name {
            vec![name.to_string()]
        } else {
            cursor = region.start + 1;
            continue;
        };

        if family != Family::Single {
            for transform in &bound {
                if operations.iter().any(|op| &op.transform == transform) {
                    return Err(ValidationError::DuplicateBinding {
                        family,
                        transform: transform.clone(),
                    });
                }
            }
        }

        let literal = working[region.bracket + 1..region.end].to_string();
        let alias = aliases.fresh(rng, source);
        operations.extend(
            bound
                .iter()
                .map(|transform| Operation::new(transform, &alias, &literal)),
        );
        working.replace_range(region.start..region.end + close_len, &alias);
        cursor = region.start + alias.len();
    }
    Ok(())
}

fn scan_persistent<R: Rng + ?Sized>(
    working: &mut String,
    source: &str,
    name: &str,
    registered: &[&str],
    persistent: &mut Vec<PersistentOperation>,
    aliases: &mut AliasGenerator,
    rng: &mut R,
) -> Result<(), ValidationError> {
    let family = Family::Persistent;
    let open = family.open_prefix(name);
    let close_len = family.close_tag().len();
    let mut cursor = 0;

    while let Some(region) = locate(working, cursor, &open, family)? {
        let annotation = working[region.start + 2..region.bracket].to_string();
        let chain = if annotation.contains(CHAIN_SEPARATOR) {
            split_annotation(&annotation, CHAIN_SEPARATOR, registered, family)?
        } else if annotation.trim() == name {
            vec![name.to_string()]
        } else {
            cursor = region.start + 1;
            continue;
        };

        let literal = working[region.bracket + 1..region.end].to_string();
        let alias = aliases.fresh(rng, source);
        persistent.push(PersistentOperation {
            binding: annotation.trim().to_string(),
            chain,
            alias: alias.clone(),
            literal,
        });
        working.replace_range(region.start..region.end + close_len, &alias);
        cursor = region.start + alias.len();
    }
    Ok(())
}
