//! `pass` CLI backend
//!
//! Runs `pass show <entry>` and hands back the decrypted bytes.
//! Requires pass to be installed and its GPG key usable.
//!
//! See: https://www.passwordstore.org/

use std::path::Path;
use std::process::{Command, Stdio};

use zeroize::Zeroizing;

use crate::errors::{HelperError, Result};

/// Name of the pass executable looked up on `PATH`.
pub const PASS_BIN: &str = "pass";

/// Environment variable pass reads its store location from.
pub const STORE_DIR_ENV: &str = "PASSWORD_STORE_DIR";

/// Where decrypted entries come from.
pub trait EntrySource {
    /// Return the decrypted content of `entry`, optionally from `store_dir`.
    fn show(&self, entry: &str, store_dir: Option<&Path>) -> Result<Zeroizing<Vec<u8>>>;
}

/// The real password store, reached through the `pass` CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassCli;

impl EntrySource for PassCli {
    fn show(&self, entry: &str, store_dir: Option<&Path>) -> Result<Zeroizing<Vec<u8>>> {
        tracing::debug!(entry, store_dir = ?store_dir, "requesting entry from pass");

        let mut cmd = Command::new(PASS_BIN);
        cmd.args(["show", entry])
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        if let Some(dir) = store_dir {
            cmd.env(STORE_DIR_ENV, dir);
        }

        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HelperError::EntryUnavailable(format!("'{PASS_BIN}' executable not found"))
            } else {
                HelperError::EntryUnavailable(format!("failed to execute '{PASS_BIN}': {e}"))
            }
        })?;

        let stdout = Zeroizing::new(output.stdout);

        match output.status.code() {
            Some(0) => Ok(stdout),
            Some(code) => Err(HelperError::EntryUnavailable(format!(
                "'{PASS_BIN} show {entry}' exited with code {code}"
            ))),
            None => Err(HelperError::EntryUnavailable(format!(
                "'{PASS_BIN} show {entry}' terminated by signal"
            ))),
        }
    }
}
