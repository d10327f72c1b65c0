//! Collaborators that touch the filesystem.

pub mod config;
pub mod corpus;
pub mod observed;
pub mod wordlist;
