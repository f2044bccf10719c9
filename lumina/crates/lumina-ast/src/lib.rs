//! lumina-ast - AST node definitions for the Lumina compiler core.
//!
//! This crate has no parsing logic of its own: the surface grammar and
//! tokenizer are external collaborators (see spec §1/§6). What lives here is
//! the tagged-tree shape a compliant parser must produce — [`Program`] and
//! its node types in [`ast`] — plus [`ParsedProgram`], the thin contract type
//! the rest of the pipeline (`lumina-sem` onward) consumes.

pub mod ast;

pub use ast::*;

use thiserror::Error;

/// A structured parse failure, as returned by the parser collaborator.
///
/// The core never attempts recovery itself; it converts this into a
/// `PARSE_ERROR` diagnostic and aborts the run before HM (spec §7).
#[derive(Debug, Clone, Error)]
#[error("parse error at {span:?}: {message}")]
pub struct ParseError {
    pub message: String,
    pub span: lumina_util::Span,
}

/// The input to the rest of the pipeline: either a successfully parsed
/// program, or the structured failure the parser collaborator reported.
///
/// This is the opaque "parse source -> AST" contract named in spec §1/§6;
/// lumina-ast does not implement the parse side of it.
#[derive(Debug, Clone)]
pub enum ParsedProgram {
    Ok(Program),
    Err(Vec<ParseError>),
}

impl ParsedProgram {
    pub fn is_ok(&self) -> bool {
        matches!(self, ParsedProgram::Ok(_))
    }

    pub fn program(&self) -> Option<&Program> {
        match self {
            ParsedProgram::Ok(program) => Some(program),
            ParsedProgram::Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_program_ok_exposes_the_program() {
        let parsed = ParsedProgram::Ok(Program { items: Vec::new() });
        assert!(parsed.is_ok());
        assert!(parsed.program().is_some());
    }

    #[test]
    fn parsed_program_err_has_no_program() {
        let parsed = ParsedProgram::Err(vec![ParseError {
            message: "unexpected token".into(),
            span: lumina_util::Span::DUMMY,
        }]);
        assert!(!parsed.is_ok());
        assert!(parsed.program().is_none());
    }
}
