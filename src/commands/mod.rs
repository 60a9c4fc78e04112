// ABOUTME: CLI command bodies
// ABOUTME: Each submodule backs one subcommand; shared URL resolution lives here

pub mod compare;
pub mod endpoints;
pub mod migrate;
pub mod repair;
pub mod sync;

use anyhow::{bail, Result};

/// Pick the URL from the flag, falling back to the saved state file.
pub(crate) fn resolve_url(flag: Option<String>, saved: Option<String>, name: &str) -> Result<String> {
    match flag.or(saved) {
        Some(url) => Ok(url),
        None => bail!(
            "No {name} URL provided. Pass --{name} or save one with `dbreconcile endpoints set`."
        ),
    }
}
