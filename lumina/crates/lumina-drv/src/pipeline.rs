//! Orchestrates the phases between a parsed program and back-end output
//! (spec §5's phase list, trimmed of lexing/parsing - those are an external
//! collaborator, represented here by [`lumina_ast::ParsedProgram`]).
//!
//! `infer_program` and `analyze_program` are independent passes over the
//! same AST (see `lumina_sem`'s own module doc), so both run regardless of
//! whether the other already produced errors - this is what spec §7 means by
//! "`check` always runs all phases that do not structurally require earlier
//! output". Monomorphization and IR lowering, by contrast, consume the
//! inferencer's typed output directly, so `compile` gates them behind a
//! clean HM + semantic pass (spec §7 clause b).

use lumina_ast::{ParseError, ParsedProgram, Program as AstProgram};
use lumina_ir::{self, Program as IrProgram};
use lumina_mono::monomorphize_program;
use lumina_sem::{analyze_program, infer_program, InferOptions};
use lumina_util::diagnostic::{Diagnostic, DiagnosticCode, Handler, Level};
use lumina_util::{SourceMap, Span};

use crate::config::{Config, EmitType, Target};
use crate::error::LuminaError;

/// Everything one `check`/`compile` run produces.
pub struct PipelineOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub ir: Option<IrProgram>,
    pub code: Option<String>,
}

impl PipelineOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level.is_error())
    }

    fn parse_failure(errors: &[ParseError]) -> Self {
        let diagnostics = errors
            .iter()
            .map(|e| Diagnostic::error(e.message.clone(), e.span).with_code(DiagnosticCode::PARSE_ERROR))
            .collect();
        PipelineOutput { diagnostics, ir: None, code: None }
    }
}

fn extend(diagnostics: &mut Vec<Diagnostic>, handler: &Handler) {
    diagnostics.extend(handler.diagnostics());
}

/// `check <file>`: parse + both analysis phases, no emission (spec §6).
pub fn check_program(parsed: &ParsedProgram) -> PipelineOutput {
    let program = match parsed {
        ParsedProgram::Ok(program) => program,
        ParsedProgram::Err(errors) => return PipelineOutput::parse_failure(errors),
    };

    let mut diagnostics = Vec::new();
    let infer = infer_program(program, &InferOptions::default());
    let analyze = analyze_program(program);
    extend(&mut diagnostics, &infer.handler);
    extend(&mut diagnostics, &analyze.handler);

    PipelineOutput { diagnostics, ir: None, code: None }
}

/// `compile <file>`: the full pipeline, gated at the HM + semantic boundary.
pub fn compile_program(parsed: &ParsedProgram, program_source_map: &SourceMap, config: &Config) -> Result<PipelineOutput, LuminaError> {
    let program: &AstProgram = match parsed {
        ParsedProgram::Ok(program) => program,
        ParsedProgram::Err(errors) => return Ok(PipelineOutput::parse_failure(errors)),
    };

    let mut diagnostics = Vec::new();
    let infer = infer_program(program, &InferOptions::default());
    let analyze = analyze_program(program);
    extend(&mut diagnostics, &infer.handler);
    extend(&mut diagnostics, &analyze.handler);

    if gates(&diagnostics, config) {
        tracing::debug!(errors = diagnostics.len(), "HM + semantic gate tripped, stopping before monomorphization");
        return Ok(PipelineOutput { diagnostics, ir: None, code: None });
    }

    if matches!(config.emit, EmitType::Ast | EmitType::Hir) {
        return Ok(PipelineOutput { diagnostics, ir: None, code: None });
    }

    let mono = monomorphize_program(program, &infer);
    extend(&mut diagnostics, &mono.handler);

    if gates(&diagnostics, config) {
        return Ok(PipelineOutput { diagnostics, ir: None, code: None });
    }

    tracing::debug!("lowering monomorphized program to IR");
    let mut ir = lumina_ir::lower_program(&mono.program, &infer);
    tracing::debug!("running fixed-point optimizer");
    lumina_ir::optimize_program(&mut ir);

    if config.emit == EmitType::Ir {
        return Ok(PipelineOutput { diagnostics, ir: Some(ir), code: None });
    }

    let code = emit(&ir, program_source_map, config)?;
    Ok(PipelineOutput { diagnostics, ir: Some(ir), code: Some(code) })
}

fn gates(diagnostics: &[Diagnostic], config: &Config) -> bool {
    diagnostics.iter().any(|d| d.level.is_error() || (config.warnings_as_errors && d.level == Level::Warning))
}

fn emit(ir: &IrProgram, source_map: &SourceMap, config: &Config) -> Result<String, LuminaError> {
    let output_file = config.output_file.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "out".to_string());

    match config.target {
        Target::Esm | Target::Cjs => {
            let module_format = match config.target {
                Target::Esm => lumina_backend_script::ModuleFormat::Esm,
                Target::Cjs => lumina_backend_script::ModuleFormat::Cjs,
                Target::Wasm => unreachable!(),
            };
            let opts = lumina_backend_script::EmitOptions { module_format, output_file };
            let output = lumina_backend_script::emit_program(ir, source_map, &opts)
                .map_err(|e| LuminaError::InvalidArguments(e.to_string()))?;
            Ok(output.code)
        }
        Target::Wasm => {
            let opts = lumina_backend_stack::EmitOptions { export_main: true };
            lumina_backend_stack::emit_program(ir, &opts).map_err(|e| LuminaError::InvalidArguments(e.to_string()))
        }
    }
}
