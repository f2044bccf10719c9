//! `lumina watch` — repeatedly compile on file change. Spec §6 scopes file
//! watching to an external collaborator; this core has no filesystem-event
//! loop to offer.

use std::path::PathBuf;

use crate::error::{CliError, Result};

pub struct WatchArgs {
    #[allow(dead_code)]
    pub input: PathBuf,
}

pub fn run(_args: WatchArgs) -> Result<()> {
    Err(CliError::NotImplemented("watch"))
}
