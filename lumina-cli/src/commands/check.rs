//! `lumina check` — parse + both analysis phases, no emission (spec §6).

use std::path::PathBuf;

use lumina_drv::{to_wire_json, Config, Session};

use crate::error::{CliError, Result};

pub struct CheckArgs {
    pub input: PathBuf,
    pub verbose: bool,
}

pub fn run(args: CheckArgs) -> Result<()> {
    let mut config = Config::new(args.input);
    config.verbose = args.verbose;

    let session = Session::new(config)?;
    let result = session.check()?;

    if !result.diagnostics.is_empty() {
        let json = to_wire_json(&result.diagnostics, &session.source_map)?;
        eprintln!("{json}");
    }

    if result.has_errors() {
        let count = result.diagnostics.iter().filter(|d| d.level.is_error()).count();
        return Err(CliError::DiagnosticsReported(count));
    }
    Ok(())
}
