//! `lumina compile` — runs the full pipeline, writing emitted output to
//! `--out` (or stdout) and exiting non-zero if any error diagnostic survives
//! HM + semantic analysis (spec §6/§7).

use std::path::PathBuf;

use lumina_drv::{to_wire_json, Config, EmitType, Session, Target};

use crate::error::{CliError, Result};

pub struct CompileArgs {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub target: Target,
    pub emit: EmitType,
    pub grammar: Option<PathBuf>,
    pub warnings_as_errors: bool,
    pub verbose: bool,
}

pub fn run(args: CompileArgs) -> Result<()> {
    let mut config = Config::new(args.input);
    config.output_file = args.output.clone();
    config.target = args.target;
    config.emit = args.emit;
    config.grammar = args.grammar;
    config.warnings_as_errors = args.warnings_as_errors;
    config.verbose = args.verbose;

    let session = Session::new(config)?;
    let result = session.compile()?;

    report_diagnostics(&result.diagnostics, &session.source_map)?;

    if let Some(code) = &result.code {
        match &args.output {
            Some(path) => std::fs::write(path, code).map_err(|e| lumina_drv::LuminaError::Io(path.clone(), e))?,
            None => println!("{code}"),
        }
    }

    if result.has_errors() {
        let count = result.diagnostics.iter().filter(|d| d.level.is_error()).count();
        return Err(CliError::DiagnosticsReported(count));
    }
    Ok(())
}

fn report_diagnostics(diagnostics: &[lumina_util::diagnostic::Diagnostic], source_map: &lumina_util::SourceMap) -> Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let json = to_wire_json(diagnostics, source_map)?;
    eprintln!("{json}");
    Ok(())
}
