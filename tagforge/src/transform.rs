//! Transform registration and the step-function contracts.
//!
//! A [`TransformSet`] is the caller-supplied set of named transforms. Iterative
//! transforms pair a step function with exactly one [`IterationStrategy`];
//! persistent transforms are stateless `input -> output` functions.
//!
//! Names are kept in sorted order, so templates are scanned one transform name
//! at a time in lexicographic order. That order fixes operation order, and in
//! cross-product mode it decides which region is the fastest-varying digit.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::state::IterationState;
use crate::core::types::Advance;
use crate::error::{EngineError, ValidationError};
use crate::strategy::{Activation, IterationStrategy};

/// Signal returned by a step function instead of a value.
#[derive(Debug)]
pub enum StepError {
    /// No further values: normal termination for this transform.
    Exhausted,
    /// Anything else aborts the whole sequence.
    Fatal(anyhow::Error),
}

impl StepError {
    pub fn fatal(message: impl fmt::Display) -> Self {
        StepError::Fatal(anyhow::anyhow!("{message}"))
    }
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        StepError::Fatal(err)
    }
}

pub type StepResult = Result<String, StepError>;

/// `(literal or element, state) -> substitution | Exhausted | Fatal`.
pub type IterativeFn = Arc<dyn Fn(&str, &mut IterationState) -> StepResult + Send + Sync>;

/// `input -> output`.
pub type PersistentFn = Arc<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Iterative,
    Persistent,
}

#[derive(Clone)]
pub struct IterativeTransform {
    name: String,
    strategy: IterationStrategy,
    step: IterativeFn,
}

impl fmt::Debug for IterativeTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterativeTransform")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

impl IterativeTransform {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &IterationStrategy {
        &self.strategy
    }

    /// Init call: materialize the strategy and let the step function set up.
    ///
    /// The step function's answer is discarded; only fatal errors surface.
    pub(crate) fn activate(
        &self,
        literal: &str,
        state: &mut IterationState,
        activation: &mut Activation<'_>,
    ) -> Result<(), EngineError> {
        let cursor = self.strategy.cursor(&self.name, activation)?;
        let presented = cursor.initial_element(literal);
        state.begin(literal, cursor);
        match (self.step)(&presented, state) {
            Ok(_) | Err(StepError::Exhausted) => Ok(()),
            Err(StepError::Fatal(err)) => Err(EngineError::step(&self.name, err)),
        }
    }

    pub(crate) fn advance(
        &self,
        literal: &str,
        state: &mut IterationState,
    ) -> Result<Advance, EngineError> {
        state.resume(literal);
        let Some(element) = state.cursor.next_element(literal) else {
            return Ok(Advance::Exhausted);
        };
        match (self.step)(&element, state) {
            Ok(value) => {
                state.record_value();
                Ok(Advance::Value(value))
            }
            Err(StepError::Exhausted) => Ok(Advance::Exhausted),
            Err(StepError::Fatal(err)) => Err(EngineError::step(&self.name, err)),
        }
    }
}

#[derive(Clone)]
pub struct PersistentTransform {
    name: String,
    apply: PersistentFn,
}

impl fmt::Debug for PersistentTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentTransform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PersistentTransform {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn apply(&self, input: &str) -> Result<String, EngineError> {
        (self.apply)(input).map_err(|err| EngineError::step(&self.name, err))
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformSet {
    iterative: BTreeMap<String, IterativeTransform>,
    persistent: BTreeMap<String, PersistentTransform>,
}

impl TransformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_iterative<F>(
        &mut self,
        name: &str,
        strategy: IterationStrategy,
        step: F,
    ) -> Result<&mut Self, ValidationError>
    where
        F: Fn(&str, &mut IterationState) -> StepResult + Send + Sync + 'static,
    {
        self.insert_iterative(name, strategy, Arc::new(step))
    }

    pub fn register_persistent<F>(&mut self, name: &str, apply: F) -> Result<&mut Self, ValidationError>
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        validate_name(name)?;
        if self.persistent.contains_key(name) {
            return Err(ValidationError::DuplicateTransform {
                name: name.to_string(),
            });
        }
        self.persistent.insert(
            name.to_string(),
            PersistentTransform {
                name: name.to_string(),
                apply: Arc::new(apply),
            },
        );
        Ok(self)
    }

    /// Register `dest` as a second binding of iterative transform `source`.
    ///
    /// Both names share one step function and strategy; each keeps its own
    /// iteration state.
    pub fn clone_iterative(&mut self, source: &str, dest: &str) -> Result<&mut Self, ValidationError> {
        let original = self
            .iterative
            .get(source)
            .ok_or_else(|| ValidationError::UnknownCloneSource {
                source_name: source.to_string(),
            })?;
        let strategy = original.strategy.clone();
        let step = Arc::clone(&original.step);
        self.insert_iterative(dest, strategy, step)
    }

    fn insert_iterative(
        &mut self,
        name: &str,
        strategy: IterationStrategy,
        step: IterativeFn,
    ) -> Result<&mut Self, ValidationError> {
        validate_name(name)?;
        if let IterationStrategy::Range { step: 0, .. } = strategy {
            return Err(ValidationError::InvalidRangeStep);
        }
        if self.iterative.contains_key(name) {
            return Err(ValidationError::DuplicateTransform {
                name: name.to_string(),
            });
        }
        self.iterative.insert(
            name.to_string(),
            IterativeTransform {
                name: name.to_string(),
                strategy,
                step,
            },
        );
        Ok(self)
    }

    pub fn iterative(&self, name: &str) -> Option<&IterativeTransform> {
        self.iterative.get(name)
    }

    pub fn persistent(&self, name: &str) -> Option<&PersistentTransform> {
        self.persistent.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<TransformKind> {
        if self.iterative.contains_key(name) {
            Some(TransformKind::Iterative)
        } else if self.persistent.contains_key(name) {
            Some(TransformKind::Persistent)
        } else {
            None
        }
    }

    pub fn iterative_names(&self) -> Vec<&str> {
        self.iterative.keys().map(String::as_str).collect()
    }

    pub fn persistent_names(&self) -> Vec<&str> {
        self.persistent.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iterative.is_empty() && self.persistent.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason| {
        Err(ValidationError::InvalidTransformName {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name == "end" {
        return invalid("'end' is reserved for close tags");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | ';' | '|'))
    {
        return invalid("must not contain whitespace or any of []|;");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(element: &str, _state: &mut IterationState) -> StepResult {
        Ok(element.to_string())
    }

    #[test]
    fn names_are_listed_in_sorted_order() {
        let mut set = TransformSet::new();
        set.register_iterative("y", IterationStrategy::counted(1), echo)
            .expect("y")
            .register_iterative("x", IterationStrategy::counted(1), echo)
            .expect("x");
        assert_eq!(set.iterative_names(), vec!["x", "y"]);
    }

    #[test]
    fn duplicate_and_reserved_names_are_rejected() {
        let mut set = TransformSet::new();
        set.register_iterative("h1", IterationStrategy::counted(1), echo)
            .expect("h1");
        assert_eq!(
            set.register_iterative("h1", IterationStrategy::counted(2), echo)
                .expect_err("dup"),
            ValidationError::DuplicateTransform {
                name: "h1".to_string()
            }
        );
        assert!(set.register_persistent("end", |s| Ok(s.to_string())).is_err());
        assert!(set.register_persistent("a|b", |s| Ok(s.to_string())).is_err());
        assert!(set.register_persistent("", |s| Ok(s.to_string())).is_err());
    }

    #[test]
    fn clone_shares_step_function_but_not_identity() {
        let mut set = TransformSet::new();
        set.register_iterative("h3", IterationStrategy::list([["cat", "dog"]]), echo)
            .expect("h3")
            .clone_iterative("h3", "h3c")
            .expect("clone");
        let source = set.iterative("h3").expect("source");
        let clone = set.iterative("h3c").expect("clone");
        assert!(Arc::ptr_eq(&source.step, &clone.step));
        assert_eq!(clone.name(), "h3c");
        assert_eq!(clone.strategy(), source.strategy());

        assert!(matches!(
            set.clone_iterative("missing", "x"),
            Err(ValidationError::UnknownCloneSource { .. })
        ));
    }

    #[test]
    fn zero_step_range_is_rejected_at_registration() {
        let mut set = TransformSet::new();
        let strategy = IterationStrategy::Range {
            start: 5,
            end: 0,
            step: 0,
        };
        assert_eq!(
            set.register_iterative("r", strategy, echo).expect_err("zero step"),
            ValidationError::InvalidRangeStep
        );
        assert!(set.iterative("r").is_none());
    }

    #[test]
    fn kind_of_distinguishes_families() {
        let mut set = TransformSet::new();
        set.register_iterative("h", IterationStrategy::counted(1), echo)
            .expect("h")
            .register_persistent("up", |s| Ok(s.to_uppercase()))
            .expect("up");
        assert_eq!(set.kind_of("h"), Some(TransformKind::Iterative));
        assert_eq!(set.kind_of("up"), Some(TransformKind::Persistent));
        assert_eq!(set.kind_of("zz"), None);
    }

    #[test]
    fn advance_counts_iterations_and_reports_exhaustion() {
        let mut set = TransformSet::new();
        set.register_iterative("h", IterationStrategy::counted(2), |lit, state| {
            Ok(format!("{lit}{}", state.iteration()))
        })
        .expect("h");
        let transform = set.iterative("h").expect("h");
        let mut state = IterationState::default();
        transform
            .activate("x", &mut state, &mut Activation::default())
            .expect("activate");
        assert!(state.init);
        assert_eq!(transform.advance("x", &mut state).expect("1"), Advance::Value("x0".into()));
        assert!(!state.init);
        assert_eq!(transform.advance("x", &mut state).expect("2"), Advance::Value("x1".into()));
        assert_eq!(transform.advance("x", &mut state).expect("3"), Advance::Exhausted);
    }

    #[test]
    fn step_function_may_exhaust_early_or_fail() {
        let mut set = TransformSet::new();
        set.register_iterative("stop", IterationStrategy::counted(5), |_, state| {
            if state.iteration() == 1 {
                return Err(StepError::Exhausted);
            }
            Ok("v".to_string())
        })
        .expect("stop")
        .register_iterative("bad", IterationStrategy::counted(5), |_, state| {
            if state.init {
                return Ok(String::new());
            }
            Err(StepError::fatal("malformed input"))
        })
        .expect("bad");

        let stop = set.iterative("stop").expect("stop");
        let mut state = IterationState::default();
        stop.activate("", &mut state, &mut Activation::default())
            .expect("activate");
        assert_eq!(stop.advance("", &mut state).expect("1"), Advance::Value("v".into()));
        assert_eq!(stop.advance("", &mut state).expect("2"), Advance::Exhausted);

        let bad = set.iterative("bad").expect("bad");
        let mut state = IterationState::default();
        bad.activate("", &mut state, &mut Activation::default())
            .expect("activate");
        let err = bad.advance("", &mut state).expect_err("fatal");
        assert_eq!(format!("{:#}", anyhow::Error::from(err)), "transform 'bad' failed: malformed input");
    }
}
