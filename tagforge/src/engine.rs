//! Public generation surface.
//!
//! An [`Engine`] owns one parsed template, its operations and every
//! transform's state. Payloads are pulled one at a time with
//! [`Engine::advance`]; the engine is single-owner and must not be advanced
//! from more than one place.

use rand::{RngCore, SeedableRng};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::core::alias::AliasGenerator;
use crate::core::markup::Mode;
use crate::core::orchestrator::{OperationDriver, Orchestrator};
use crate::core::parser::{TransformNames, parse_template};
use crate::core::pipeline::apply_persistent;
use crate::core::state::StateStore;
use crate::core::types::{
    Advance, Operation, PersistentOperation, Substitution, apply_substitutions,
};
use crate::error::EngineError;
use crate::io::observed::WordSource;
use crate::strategy::Activation;
use crate::transform::{IterativeTransform, TransformKind, TransformSet};

/// One generated payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    /// 0-based position in the sequence.
    pub index: usize,
    /// Label set by a step function during this step, if any.
    pub label: Option<String>,
    pub body: String,
}

pub struct EngineBuilder {
    template: String,
    transforms: TransformSet,
    words: Option<Box<dyn WordSource>>,
    randomize_lists: bool,
    seed: Option<u64>,
}

impl EngineBuilder {
    /// Supply the observed-word collaborator used by `Observed` strategies.
    pub fn words(mut self, words: impl WordSource + 'static) -> Self {
        self.words = Some(Box::new(words));
        self
    }

    /// Shuffle list-based element sequences once per activation.
    pub fn randomize_lists(mut self, randomize: bool) -> Self {
        self.randomize_lists = randomize;
        self
    }

    /// Make alias generation and shuffling reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<Engine, EngineError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let iterative = self.transforms.iterative_names();
        let persistent = self.transforms.persistent_names();
        let parsed = parse_template(
            &self.template,
            TransformNames {
                iterative: &iterative,
                persistent: &persistent,
            },
            &mut AliasGenerator::new(),
            &mut rng,
        )?;
        debug!(
            mode = ?parsed.mode,
            operations = parsed.operations.len(),
            persistent = parsed.persistent.len(),
            "engine constructed"
        );

        Ok(Engine {
            template: parsed.template,
            operations: parsed.operations,
            persistent: parsed.persistent,
            orchestrator: Orchestrator::new(parsed.mode),
            transforms: self.transforms,
            states: StateStore::default(),
            words: self.words,
            randomize_lists: self.randomize_lists,
            rng,
            emitted: 0,
            label: None,
        })
    }
}

pub struct Engine {
    template: String,
    operations: Vec<Operation>,
    persistent: Vec<PersistentOperation>,
    orchestrator: Orchestrator,
    transforms: TransformSet,
    states: StateStore,
    words: Option<Box<dyn WordSource>>,
    randomize_lists: bool,
    rng: StdRng,
    emitted: usize,
    label: Option<String>,
}

impl Engine {
    /// Parse `template` against `transforms` with default options.
    pub fn new(template: &str, transforms: TransformSet) -> Result<Self, EngineError> {
        Self::builder(template, transforms).build()
    }

    pub fn builder(template: &str, transforms: TransformSet) -> EngineBuilder {
        EngineBuilder {
            template: template.to_string(),
            transforms,
            words: None,
            randomize_lists: false,
            seed: None,
        }
    }

    /// Produce the next payload, or `None` at the end of the sequence.
    ///
    /// After an error or the end of the sequence every further call returns
    /// `Ok(None)`; a new engine is needed to start over.
    pub fn advance(&mut self) -> Result<Option<Payload>, EngineError> {
        self.label = None;
        let mut driver = EngineDriver {
            transforms: &self.transforms,
            states: &mut self.states,
            words: self.words.as_deref(),
            shuffle: self.randomize_lists.then_some(&mut self.rng),
        };
        let Some(subs) = self.orchestrator.step(&mut self.operations, &mut driver)? else {
            return Ok(None);
        };

        let body = match self.render(&subs) {
            Ok(body) => body,
            Err(err) => {
                self.orchestrator.finish();
                return Err(err);
            }
        };
        self.label = self.states.take_label();
        let payload = Payload {
            index: self.emitted,
            label: self.label.clone(),
            body,
        };
        self.emitted += 1;
        trace!(index = payload.index, "payload produced");
        Ok(Some(payload))
    }

    /// Render the template with every iterative region showing its literal
    /// text and the persistent pipeline applied. Does not touch iteration.
    pub fn evaluate_with_originals(&self) -> Result<String, EngineError> {
        let subs: Vec<Substitution> = self
            .operations
            .iter()
            .map(|op| Substitution::new(&op.alias, &op.literal))
            .collect();
        self.render(&subs)
    }

    fn render(&self, subs: &[Substitution]) -> Result<String, EngineError> {
        let payload = apply_substitutions(&self.template, subs);
        apply_persistent(&payload, &self.persistent, subs, |name, input| {
            let transform = self.transforms.persistent(name).ok_or_else(|| {
                EngineError::configuration(name, "persistent transform is not registered")
            })?;
            transform.apply(input)
        })
    }

    pub fn mode(&self) -> Mode {
        self.orchestrator.mode()
    }

    /// Template with every recognized region replaced by its alias.
    pub fn aliased_template(&self) -> &str {
        &self.template
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn persistent_operations(&self) -> &[PersistentOperation] {
        &self.persistent
    }

    /// Number of payloads produced so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn is_finished(&self) -> bool {
        self.orchestrator.is_finished()
    }

    /// Label attached to the most recent payload.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Literal inner text bound to `transform`.
    ///
    /// Fails when the transform has no instance or more than one.
    pub fn input(&self, transform: &str) -> Result<&str, EngineError> {
        let mut found: Vec<&str> = self
            .operations
            .iter()
            .filter(|op| op.transform == transform)
            .map(|op| op.literal.as_str())
            .collect();
        found.extend(
            self.persistent
                .iter()
                .filter(|op| op.chain.iter().any(|name| name == transform))
                .map(|op| op.literal.as_str()),
        );
        single_instance(transform, "bound", found)
    }

    /// Last value produced for a single-instance iterative transform.
    pub fn output(&self, transform: &str) -> Result<Option<&str>, EngineError> {
        if self.transforms.kind_of(transform) == Some(TransformKind::Persistent) {
            return Err(EngineError::PersistentOutput {
                transform: transform.to_string(),
            });
        }
        let found: Vec<&Operation> = self
            .operations
            .iter()
            .filter(|op| op.transform == transform)
            .collect();
        let op = single_instance(transform, "iterative", found)?;
        Ok(op.cached.as_deref())
    }
}

fn single_instance<T>(transform: &str, kind: &'static str, mut found: Vec<T>) -> Result<T, EngineError> {
    match found.len() {
        0 => Err(EngineError::NoInstance {
            kind,
            transform: transform.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(EngineError::MultipleInstances {
            transform: transform.to_string(),
            count,
        }),
    }
}

impl Iterator for Engine {
    type Item = Result<Payload, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

impl std::iter::FusedIterator for Engine {}

/// Bridges orchestrator requests to registered transforms and their state.
struct EngineDriver<'a> {
    transforms: &'a TransformSet,
    states: &'a mut StateStore,
    words: Option<&'a dyn WordSource>,
    shuffle: Option<&'a mut StdRng>,
}

fn lookup<'t>(transforms: &'t TransformSet, op: &Operation) -> Result<&'t IterativeTransform, EngineError> {
    transforms.iterative(&op.transform).ok_or_else(|| {
        EngineError::configuration(&op.transform, "iterative transform is not registered")
    })
}

impl OperationDriver for EngineDriver<'_> {
    fn init(&mut self, op: &Operation) -> Result<(), EngineError> {
        let transform = lookup(self.transforms, op)?;
        let mut activation = Activation {
            words: self.words,
            shuffle: self.shuffle.as_deref_mut().map(|rng| rng as &mut dyn RngCore),
        };
        let state = self.states.entry(&op.transform);
        transform.activate(&op.literal, state, &mut activation)
    }

    fn advance(&mut self, op: &Operation) -> Result<Advance, EngineError> {
        let transform = lookup(self.transforms, op)?;
        transform.advance(&op.literal, self.states.entry(&op.transform))
    }
}
