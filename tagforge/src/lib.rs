//! Tag-driven payload generator.
//!
//! A template is ordinary text in which tagged regions mark what varies
//! between generated payloads. Each region is bound to a named transform; the
//! engine drives those transforms according to the template's combination
//! mode and renders one payload per step.
//!
//! - **[`core`]**: Pure, deterministic logic (markup, parsing, mode state
//!   machines, the persistent chain). No I/O, fully testable in isolation.
//! - **[`io`]**: Wordlists, the corpus manifest, observed-word sources and the
//!   TOML generator configuration.
//!
//! [`engine`] ties both together behind [`Engine`]; [`transform`] and
//! [`strategy`] describe what callers register.

pub mod builtin;
pub mod core;
pub mod engine;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod strategy;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod transform;

pub use engine::{Engine, EngineBuilder, Payload};
pub use error::{EngineError, ValidationError};
pub use strategy::IterationStrategy;
pub use transform::{StepError, StepResult, TransformSet};
