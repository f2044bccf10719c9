//! Command modules for the `lumina` CLI.
//!
//! This module contains implementations for all available subcommands.

pub mod check;
pub mod compile;
pub mod repl;
pub mod watch;
