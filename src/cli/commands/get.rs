//! `pass-git-helper get`: answer a credential request from pass.

use std::io::{self, Write};

use crate::cli::Cli;
use crate::credential::{Credential, CredentialRequest};
use crate::errors::Result;
use crate::mapping::MappingConfig;
use crate::pass::{EntrySource, PassCli};
use crate::resolver::Resolver;

/// Execute the `get` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let request = CredentialRequest::parse(io::stdin().lock())?;
    tracing::debug!(?request, "received request");

    let path = MappingConfig::locate(cli.mapping.as_deref())?;
    let mapping = MappingConfig::load(&path)?;

    let credential = fill(&request, &mapping, &PassCli)?;
    respond(&credential, &mut io::stdout().lock())
}

/// Resolve `request` against `mapping`, reading the entry from `source`.
///
/// An unmatched request yields an empty credential.
pub fn fill<S: EntrySource>(
    request: &CredentialRequest,
    mapping: &MappingConfig,
    source: &S,
) -> Result<Credential> {
    let Some(resolution) = Resolver::new(mapping).resolve(request, request.has_path())? else {
        tracing::info!(host = %request.host, "no mapping section matches the request");
        return Ok(Credential::default());
    };

    let entry = source.show(resolution.lookup_key(), resolution.store_dir())?;
    let outcome = resolution.extract(&entry)?;

    // Git already knows a username it sent us.
    let username = match request.username {
        Some(_) => None,
        None => outcome.username,
    };

    Ok(Credential {
        password: Some(outcome.password),
        username,
    })
}

fn respond<W: Write>(credential: &Credential, out: &mut W) -> Result<()> {
    credential.write_to(out)
}
