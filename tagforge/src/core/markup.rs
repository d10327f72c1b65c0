//! Markup families and their delimiters.
//!
//! Every family opens with `[<sigil><annotation>]` and closes with
//! `[<sigil>end]`. The three iterative families are mutually exclusive within
//! one template; the persistent family combines with any of them.

use std::fmt;

use serde::Serialize;

use crate::error::ValidationError;

/// Separator for cumulative single-target annotations (`[+a;b]`).
pub const CUMULATIVE_SEPARATOR: char = ';';
/// Separator for chained persistent annotations (`[@a|b]`).
pub const CHAIN_SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Single,
    Lockstep,
    Cross,
    Persistent,
}

impl Family {
    pub const ITERATIVE: [Family; 3] = [Family::Single, Family::Lockstep, Family::Cross];

    pub fn sigil(self) -> char {
        match self {
            Family::Single => '+',
            Family::Lockstep => '#',
            Family::Cross => '%',
            Family::Persistent => '@',
        }
    }

    /// Open delimiter prefix for `name`, without the closing bracket.
    ///
    /// The bracket is located separately so annotations may carry a
    /// separator-delimited list that starts with `name`.
    pub fn open_prefix(self, name: &str) -> String {
        format!("[{}{}", self.sigil(), name)
    }

    pub fn close_tag(self) -> &'static str {
        match self {
            Family::Single => "[+end]",
            Family::Lockstep => "[#end]",
            Family::Cross => "[%end]",
            Family::Persistent => "[@end]",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Family::Single => "single-target",
            Family::Lockstep => "lockstep",
            Family::Cross => "cross-product",
            Family::Persistent => "persistent",
        };
        f.write_str(label)
    }
}

/// Combination strategy detected for a template's iterative operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    None,
    Single,
    Lockstep,
    Cross,
}

impl Mode {
    pub fn family(self) -> Option<Family> {
        match self {
            Mode::None => None,
            Mode::Single => Some(Family::Single),
            Mode::Lockstep => Some(Family::Lockstep),
            Mode::Cross => Some(Family::Cross),
        }
    }

    fn from_family(family: Family) -> Self {
        match family {
            Family::Single => Mode::Single,
            Family::Lockstep => Mode::Lockstep,
            Family::Cross => Mode::Cross,
            Family::Persistent => Mode::None,
        }
    }
}

/// Detect the iterative mode from the close tags present in `source`.
pub fn detect_mode(source: &str) -> Result<Mode, ValidationError> {
    let mut detected: Option<Family> = None;
    for family in Family::ITERATIVE {
        if !source.contains(family.close_tag()) {
            continue;
        }
        if let Some(first) = detected {
            return Err(ValidationError::MixedFamilies {
                first,
                second: family,
            });
        }
        detected = Some(family);
    }
    Ok(detected.map_or(Mode::None, Mode::from_family))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_single_family_from_close_tag() {
        assert_eq!(detect_mode("a [+x]b[+end]").expect("mode"), Mode::Single);
        assert_eq!(detect_mode("[%x]b[%end]").expect("mode"), Mode::Cross);
        assert_eq!(detect_mode("[@x]b[@end]").expect("mode"), Mode::None);
    }

    #[test]
    fn rejects_two_iterative_families() {
        let err = detect_mode("[+a]x[+end] [#b]y[#end]").expect_err("mixed");
        assert_eq!(
            err,
            ValidationError::MixedFamilies {
                first: Family::Single,
                second: Family::Lockstep,
            }
        );
        assert_eq!(
            err.to_string(),
            "cannot mix iterative families: single-target and lockstep"
        );
    }

    #[test]
    fn open_prefix_has_no_bracket() {
        assert_eq!(Family::Lockstep.open_prefix("port"), "[#port");
        assert_eq!(Family::Persistent.close_tag(), "[@end]");
    }
}
