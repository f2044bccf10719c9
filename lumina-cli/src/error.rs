//! Error handling for the `lumina` CLI.

use thiserror::Error;

/// Top-level error type for the `lumina` binary.
#[derive(Error, Debug)]
pub enum CliError {
    /// A compiler-core error, passed through from `lumina-drv`.
    #[error(transparent)]
    Driver(#[from] lumina_drv::LuminaError),

    /// Serializing the wire-format diagnostic list failed.
    #[error("failed to serialize diagnostics: {0}")]
    Json(#[from] serde_json::Error),

    /// `compile`/`check` ran but at least one error diagnostic survived.
    #[error("compilation failed with {0} error diagnostic(s)")]
    DiagnosticsReported(usize),

    /// A subcommand not yet implemented by this core (`watch`, `repl`).
    #[error("`{0}` is not implemented by this compiler core")]
    NotImplemented(&'static str),
}

pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_reported_error_display() {
        let err = CliError::DiagnosticsReported(3);
        assert_eq!(err.to_string(), "compilation failed with 3 error diagnostic(s)");
    }

    #[test]
    fn not_implemented_error_display() {
        let err = CliError::NotImplemented("watch");
        assert_eq!(err.to_string(), "`watch` is not implemented by this compiler core");
    }

    #[test]
    fn driver_error_converts_via_from() {
        let driver_err = lumina_drv::LuminaError::NotImplemented("repl");
        let cli_err: CliError = driver_err.into();
        assert!(matches!(cli_err, CliError::Driver(_)));
    }
}
