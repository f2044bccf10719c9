//! The top-level error type for the compiler core, returned by `Session`
//! and the CLI collaborator wired on top of it.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuminaError {
    #[error("IO error for {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Lexing/parsing is an external collaborator this workspace does not
    /// implement (spec §1 Non-goals); the core only accepts an already
    /// -parsed [`lumina_ast::ParsedProgram`].
    #[error("no parser collaborator available to parse {0}; supply a pre-parsed program")]
    NoParserAvailable(PathBuf),

    /// `watch`/`repl` are accepted CLI subcommands (spec §6 requires the
    /// core to honor these modes) but their bodies are out of scope.
    #[error("'{0}' is an external collaborator responsibility, not implemented by the core")]
    NotImplemented(&'static str),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T> = std::result::Result<T, LuminaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_implemented_names_the_subcommand() {
        let err = LuminaError::NotImplemented("watch");
        assert!(err.to_string().contains("watch"));
    }
}
