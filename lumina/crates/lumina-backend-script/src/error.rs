//! Error type for the scripting-target back end.

use lumina_util::Symbol;
use thiserror::Error;

/// Emission is expected to be infallible for any program the optimizer
/// accepted: every variant here guards an invariant lowering/monomorphization
/// should already have established, not a condition user source can trigger.
#[derive(Debug, Error)]
pub enum ScriptBackendError {
    /// A `Closure` node named a function absent from the program's function
    /// list.
    #[error("closure references unknown function '{0}'")]
    UnknownFunction(Symbol),

    /// The driver asked for a module format this back end does not know how
    /// to emit a preamble for.
    #[error("unsupported module format '{0}'")]
    UnsupportedModuleFormat(String),

    /// An IR node appeared somewhere the tree shape (`Ir::children`/
    /// `Ir::blocks`) says it never should (e.g. a `Let` nested inside an
    /// expression). Indicates a bug upstream of this crate, not bad input.
    #[error("malformed IR: {0}")]
    MalformedIr(&'static str),
}

pub type Result<T> = std::result::Result<T, ScriptBackendError>;
