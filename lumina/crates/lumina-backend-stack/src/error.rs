//! Error type for the stack-machine text back end.

use lumina_util::Symbol;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackBackendError {
    /// A `Call` named a function absent from the program's function list.
    #[error("call to unknown function '{0}'")]
    UnknownFunction(Symbol),
}

pub type Result<T> = std::result::Result<T, StackBackendError>;
