//! Compilation session: per-run state for one `lumina compile`/`check`
//! invocation. Never a process singleton (spec §5's per-run-state
//! requirement; counters and substitutions are owned per session, never
//! `static`).

use lumina_ast::ParsedProgram;
use lumina_util::{FileId, SourceMap};

use crate::config::Config;
use crate::error::{LuminaError, Result};
use crate::pipeline::{self, PipelineOutput};

/// State for one compiler invocation: the configuration, the source map
/// (for wire-format location resolution), and - once supplied - the parsed
/// program to run the pipeline over.
pub struct Session {
    pub config: Config,
    pub source_map: SourceMap,
    pub file_id: FileId,
    parsed: Option<ParsedProgram>,
}

impl Session {
    /// Reads `config.input_file` into a fresh `SourceMap` entry. Does not
    /// attempt to lex or parse it: lexing/parsing is an external
    /// collaborator (spec §1 Non-goals) this workspace does not implement.
    /// Call [`Session::set_parsed`] to supply the program before
    /// [`Session::compile`]/[`Session::check`], or expect
    /// [`LuminaError::NoParserAvailable`].
    pub fn new(config: Config) -> Result<Self> {
        let content =
            std::fs::read_to_string(&config.input_file).map_err(|e| LuminaError::Io(config.input_file.clone(), e))?;
        let mut source_map = SourceMap::new();
        let file_id = source_map.add_file(config.input_file.display().to_string(), content);
        Ok(Self { config, source_map, file_id, parsed: None })
    }

    /// Injects an already-parsed program. This is how tests and any future
    /// real parser collaborator feed the pipeline; the core never produces
    /// a `ParsedProgram` itself.
    pub fn set_parsed(&mut self, parsed: ParsedProgram) {
        self.parsed = Some(parsed);
    }

    fn parsed(&self) -> Result<&ParsedProgram> {
        self.parsed.as_ref().ok_or_else(|| LuminaError::NoParserAvailable(self.config.input_file.clone()))
    }

    /// `check <file>`: parse + both analysis phases, no emission.
    pub fn check(&self) -> Result<PipelineOutput> {
        Ok(pipeline::check_program(self.parsed()?))
    }

    /// `compile <file>`: the full pipeline, exiting non-zero if any error
    /// diagnostic survives HM + semantic analysis.
    pub fn compile(&self) -> Result<PipelineOutput> {
        pipeline::compile_program(self.parsed()?, &self.source_map, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_ast::Program as AstProgram;
    use std::io::Write;

    fn temp_source(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn new_without_set_parsed_fails_compile_with_no_parser_available() {
        let file = temp_source("fn main() {}");
        let config = Config::new(file.path().to_path_buf());
        let session = Session::new(config).unwrap();
        let err = session.compile().unwrap_err();
        assert!(matches!(err, LuminaError::NoParserAvailable(_)));
    }

    #[test]
    fn set_parsed_then_check_runs_without_a_parser() {
        let file = temp_source("fn main() {}");
        let config = Config::new(file.path().to_path_buf());
        let mut session = Session::new(config).unwrap();
        session.set_parsed(ParsedProgram::Ok(AstProgram { items: Vec::new() }));
        let result = session.check().unwrap();
        assert!(!result.has_errors());
    }

    #[test]
    fn new_surfaces_io_errors_for_a_missing_file() {
        let config = Config::new(std::path::PathBuf::from("/nonexistent/does-not-exist.lum"));
        assert!(Session::new(config).is_err());
    }
}
