//! Compiler configuration (spec §6: `compile <file> [--out <file>] [--target
//! esm|cjs|wasm] [--grammar <path>]`).

use std::path::PathBuf;

use crate::error::LuminaError;

/// Emission target (spec §6's `--target esm|cjs|wasm`). `Esm`/`Cjs` route to
/// `lumina-backend-script`; `Wasm` routes to `lumina-backend-stack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Esm,
    Cjs,
    Wasm,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self, LuminaError> {
        match s {
            "esm" => Ok(Target::Esm),
            "cjs" => Ok(Target::Cjs),
            "wasm" => Ok(Target::Wasm),
            other => Err(LuminaError::InvalidArguments(format!("unknown target '{other}', expected esm|cjs|wasm"))),
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Esm
    }
}

/// What to emit, trimmed to the stages this core actually has (no tokens -
/// lexing is an external collaborator; no object/executable - there is no
/// native codegen back end in this core).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitType {
    /// The input AST, pretty-printed.
    Ast,
    /// Inference/analysis results only - used by the `check` verb.
    Hir,
    /// The optimized IR, pretty-printed.
    Ir,
    /// The back end's text output (scripting-target text or stack-machine
    /// S-expression text, depending on `Config::target`).
    Output,
}

impl Default for EmitType {
    fn default() -> Self {
        EmitType::Output
    }
}

/// Compiler configuration for one `Session`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input source file.
    pub input_file: PathBuf,

    /// Output file path (`None` means write to stdout).
    pub output_file: Option<PathBuf>,

    /// Emission target.
    pub target: Target,

    /// What to emit.
    pub emit: EmitType,

    /// Passthrough path to the parser collaborator's grammar file (spec §6's
    /// `--grammar <path>`); the core does not read it itself, it only
    /// threads the option through for the collaborator to consume.
    pub grammar: Option<PathBuf>,

    /// Verbose output.
    pub verbose: bool,

    /// Treat warnings as errors.
    pub warnings_as_errors: bool,
}

impl Config {
    pub fn new(input_file: PathBuf) -> Self {
        Self {
            input_file,
            output_file: None,
            target: Target::default(),
            emit: EmitType::default(),
            grammar: None,
            verbose: false,
            warnings_as_errors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parse_accepts_the_three_named_targets() {
        assert_eq!(Target::parse("esm").unwrap(), Target::Esm);
        assert_eq!(Target::parse("cjs").unwrap(), Target::Cjs);
        assert_eq!(Target::parse("wasm").unwrap(), Target::Wasm);
    }

    #[test]
    fn target_parse_rejects_unknown_targets() {
        assert!(Target::parse("llvm").is_err());
    }

    #[test]
    fn config_new_defaults_to_esm_and_output_emit() {
        let config = Config::new(PathBuf::from("main.lum"));
        assert_eq!(config.target, Target::Esm);
        assert_eq!(config.emit, EmitType::Output);
    }
}
