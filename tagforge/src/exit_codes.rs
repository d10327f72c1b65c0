//! Stable exit codes for tagforge CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid template, configuration or transform failure.
pub const INVALID: i32 = 1;
/// `tagforge generate` produced no payloads.
pub const EMPTY: i32 = 2;
