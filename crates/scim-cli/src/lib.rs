//! Library half of the `scim-sanity` command-line tool.
//!
//! Kept separate from `main.rs` so the subcommand implementations in
//! [`commands`] are reachable from integration tests without going through
//! `clap` argument parsing, mirroring `abp-cli`'s `commands`/`main` split.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Subcommand implementations, independent of `clap`.
pub mod commands;
