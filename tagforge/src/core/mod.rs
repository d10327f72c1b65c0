//! Deterministic, pure logic for template generation.
//!
//! Core modules are free of I/O side effects. Step functions and file-backed
//! element lists reach them only through [`orchestrator::OperationDriver`] and
//! plain callbacks, which keeps every state machine testable in isolation.

pub mod alias;
pub mod markup;
pub mod orchestrator;
pub mod parser;
pub mod pipeline;
pub mod state;
pub mod types;
