//! The three combination-mode state machines.
//!
//! The orchestrator never calls step functions itself. It asks an
//! [`OperationDriver`] to (re)initialize or advance one operation at a time and
//! turns the answers into the substitution list for the next payload.
//!
//! - **Single-target**: only `operations[active]` advances; every other
//!   operation shows its literal. Exhaustion moves `active` forward.
//! - **Lockstep**: every operation advances once per round; any exhaustion in
//!   a round discards the round and ends the sequence.
//! - **Cross-product**: an odometer with index 0 as the fastest digit.

use tracing::{debug, trace};

use super::markup::Mode;
use super::types::{Advance, Operation, Substitution};
use crate::error::EngineError;

/// Drives one operation's transform on behalf of the orchestrator.
pub trait OperationDriver {
    /// Init call: reset the transform's bookkeeping for `op`.
    fn init(&mut self, op: &Operation) -> Result<(), EngineError>;
    /// Produce the next value for `op`.
    fn advance(&mut self, op: &Operation) -> Result<Advance, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Running,
    Finished,
}

#[derive(Debug)]
pub struct Orchestrator {
    mode: Mode,
    phase: Phase,
    active: usize,
}

impl Orchestrator {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            phase: Phase::Fresh,
            active: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Index of the operation currently being advanced.
    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// End the sequence early; every later `step` returns `Ok(None)`.
    pub fn finish(&mut self) {
        self.phase = Phase::Finished;
    }

    /// Produce the substitutions for the next payload, or `None` once the
    /// sequence is exhausted. Any error finishes the sequence for good.
    pub fn step<D: OperationDriver>(
        &mut self,
        operations: &mut [Operation],
        driver: &mut D,
    ) -> Result<Option<Vec<Substitution>>, EngineError> {
        if self.phase == Phase::Finished {
            return Ok(None);
        }
        if operations.is_empty() || self.mode == Mode::None {
            self.phase = Phase::Finished;
            return Ok(None);
        }

        let outcome = self.step_inner(operations, driver);
        match &outcome {
            Ok(None) => {
                debug!(mode = ?self.mode, "sequence exhausted");
                self.phase = Phase::Finished;
            }
            Err(_) => self.phase = Phase::Finished,
            Ok(Some(_)) => {}
        }
        outcome
    }

    fn step_inner<D: OperationDriver>(
        &mut self,
        operations: &mut [Operation],
        driver: &mut D,
    ) -> Result<Option<Vec<Substitution>>, EngineError> {
        if self.phase == Phase::Fresh {
            self.start(operations, driver)?;
            self.phase = Phase::Running;
            if self.mode == Mode::Cross && !prime_cross(operations, driver)? {
                return Ok(None);
            }
        }
        match self.mode {
            Mode::Single => self.next_single(operations, driver),
            Mode::Lockstep => next_lockstep(operations, driver),
            Mode::Cross => next_cross(operations, driver),
            Mode::None => Ok(None),
        }
    }

    fn start<D: OperationDriver>(
        &mut self,
        operations: &[Operation],
        driver: &mut D,
    ) -> Result<(), EngineError> {
        self.active = 0;
        if self.mode == Mode::Single {
            return driver.init(&operations[0]);
        }
        for op in operations {
            driver.init(op)?;
        }
        Ok(())
    }

    fn next_single<D: OperationDriver>(
        &mut self,
        operations: &mut [Operation],
        driver: &mut D,
    ) -> Result<Option<Vec<Substitution>>, EngineError> {
        loop {
            let value = match driver.advance(&operations[self.active])? {
                Advance::Value(value) => value,
                Advance::Exhausted => {
                    self.active += 1;
                    if self.active == operations.len() {
                        return Ok(None);
                    }
                    trace!(active = self.active, "single-target moving to next operation");
                    driver.init(&operations[self.active])?;
                    continue;
                }
            };

            let active = self.active;
            let mut subs = vec![Substitution::new(&operations[active].alias, &value)];
            operations[active].cached = Some(value);
            for (index, op) in operations.iter_mut().enumerate() {
                if index == active {
                    continue;
                }
                op.cached = Some(op.literal.clone());
                subs.push(Substitution::new(&op.alias, &op.literal));
            }
            return Ok(Some(subs));
        }
    }
}

fn next_lockstep<D: OperationDriver>(
    operations: &mut [Operation],
    driver: &mut D,
) -> Result<Option<Vec<Substitution>>, EngineError> {
    let mut exhausted = false;
    for op in &mut *operations {
        match driver.advance(op)? {
            Advance::Value(value) => op.cached = Some(value),
            Advance::Exhausted => exhausted = true,
        }
    }
    if exhausted {
        return Ok(None);
    }
    Ok(Some(cached_substitutions(operations)))
}

/// Cache a first value for every digit except index 0.
///
/// Returns `false` when some digit has no values at all, which makes the
/// product empty.
fn prime_cross<D: OperationDriver>(
    operations: &mut [Operation],
    driver: &mut D,
) -> Result<bool, EngineError> {
    for op in operations.iter_mut().skip(1) {
        if op.cached.is_some() {
            continue;
        }
        match driver.advance(op)? {
            Advance::Value(value) => op.cached = Some(value),
            Advance::Exhausted => {
                debug!(transform = %op.transform, "cross-product digit has no values");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn next_cross<D: OperationDriver>(
    operations: &mut [Operation],
    driver: &mut D,
) -> Result<Option<Vec<Substitution>>, EngineError> {
    let mut index = 0;
    loop {
        let op = &mut operations[index];
        match driver.advance(op)? {
            Advance::Value(value) => {
                op.cached = Some(value);
                return Ok(Some(cached_substitutions(operations)));
            }
            Advance::Exhausted => {
                // Carry: wind this digit back to its first value, bump the next.
                driver.init(op)?;
                match driver.advance(op)? {
                    Advance::Value(value) => op.cached = Some(value),
                    Advance::Exhausted => return Ok(None),
                }
                index += 1;
                if index == operations.len() {
                    return Ok(None);
                }
                trace!(digit = index, "cross-product carry");
            }
        }
    }
}

fn cached_substitutions(operations: &[Operation]) -> Vec<Substitution> {
    operations
        .iter()
        .map(|op| Substitution::new(&op.alias, op.cached.as_deref().unwrap_or(&op.literal)))
        .collect()
}
