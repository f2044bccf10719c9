//! `lumina repl` — interactive use, orthogonal to the core (spec §6).

use crate::error::{CliError, Result};

pub fn run() -> Result<()> {
    Err(CliError::NotImplemented("repl"))
}
