//! Git credential protocol: request parsing and response serialization.
//!
//! Git writes `key=value` lines to the helper's stdin, terminated by a
//! blank line or end of stream, and reads the answer back in the same
//! format from stdout.

use std::io::{BufRead, Write};

use zeroize::Zeroizing;

use crate::errors::Result;

/// Parse a single protocol line into a (key, value) pair.
///
/// Returns `None` for blank lines and lines without `=`.
/// Only the first `=` separates key from value.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key, value.trim()))
}

/// The fields of a `get` request the helper cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRequest {
    pub protocol: Option<String>,
    pub host: String,
    pub path: Option<String>,
    pub username: Option<String>,
}

impl CredentialRequest {
    /// Read a request until the first blank line or end of stream.
    ///
    /// Unknown keys are ignored.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut request = Self::default();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                break;
            }

            let Some((key, value)) = parse_line(&line) else {
                tracing::debug!("ignoring malformed request line");
                continue;
            };

            match key {
                "protocol" => request.protocol = Some(value.to_string()),
                "host" => request.host = value.to_string(),
                "path" => request.path = Some(value.to_string()),
                "username" => request.username = Some(value.to_string()),
                other => tracing::debug!(key = other, "ignoring request key"),
            }
        }

        Ok(request)
    }

    /// True when git sent a non-empty `path`, i.e. `credential.useHttpPath` is on.
    pub fn has_path(&self) -> bool {
        self.path.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// The helper's answer to a `get` request.
#[derive(Debug, Default)]
pub struct Credential {
    pub password: Option<Zeroizing<String>>,
    pub username: Option<String>,
}

impl Credential {
    /// Serialize the credential, skipping absent or empty values.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            writeln!(out, "password={password}")?;
        }
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            writeln!(out, "username={username}")?;
        }
        out.flush()?;
        Ok(())
    }
}
